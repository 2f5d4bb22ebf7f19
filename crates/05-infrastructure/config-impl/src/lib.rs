//! # Configuration Implementation
//!
//! 属性源的具体实现。
//!
//! ## 主要组件
//!
//! - [`MapPropertySource`] - 内存属性源
//! - [`TomlPropertySource`] - TOML 属性源
//! - [`JsonPropertySource`] - JSON 属性源
//! - [`EnvironmentPropertySource`] - 环境变量属性源
//! - [`ConfigCratePropertySource`] - 基于 `config` crate 的属性源
//! - [`LayeredPropertySource`] - 按优先级组合多个属性源

pub mod layered;
pub mod providers;

pub use layered::*;
pub use providers::*;
