//! # Infrastructure Common
//!
//! 这个 crate 提供了 IoC 容器各层共享的基础类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 类型键（TypeId + 类型名称）
//! - [`ComponentRef`] - 类型擦除后的组件引用
//! - [`Phase`] - 组件生命周期阶段
//! - [`DependencyError`] - 容器错误
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 不依赖运行时反射，所有元数据都是预先计算好的

pub mod component;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
