//! # Configuration Abstractions
//!
//! 配置属性抽象层，定义容器读取属性值的统一接口。
//!
//! ## 核心接口
//!
//! - [`PropertySource`] - 属性源接口（键 -> 字符串值）

pub mod provider;

pub use provider::*;
