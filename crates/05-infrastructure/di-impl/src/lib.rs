//! # 依赖注入具体实现
//!
//! 提供组件生命周期记录、注册表、不动点解析器和容器。
//!
//! 组件按 `PENDING -> INSTANTIATED -> WIRED -> READY` 推进：
//! 构造器依赖只接受已完成注入的组件，字段注入允许循环依赖。

pub mod container;
pub mod record;
pub mod registry;
pub mod resolver;

pub use container::Container;
pub use record::LifecycleRecord;
pub use registry::ComponentRegistryImpl;
pub use resolver::Resolver;
