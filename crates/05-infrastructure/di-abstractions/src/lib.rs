//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件描述符和依赖查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentDefinition`] / [`ComponentDescriptor`] - 组件元数据及其校验
//! - [`InjectionPoint`] - 注入点
//! - [`ComponentLookup`] - 组件查找接口
//! - [`DescriptorSource`] - 描述符来源接口

pub mod descriptor;
pub mod injection;
pub mod registry;
pub mod scanner;

pub use descriptor::*;
pub use injection::*;
pub use registry::*;
pub use scanner::*;
