//! # 基础设施组合层
//!
//! 把属性源、组件描述符和外部实例组合成一个完整的、可用的容器。
//!
//! ## 主要功能
//!
//! - **容器构建器**: 使用构建者模式组装描述符来源和属性源
//! - **属性源分层**: TOML / JSON / 环境变量 / `config` crate，按优先级查询
//! - **日志初始化**: 可选地安装 `tracing-subscriber`
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ContainerBuilder, LoggingConfig};
//! use di_abstractions::ComponentDefinition;
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let container = ContainerBuilder::new()
//!         .with_logging(LoggingConfig::development())
//!         .add_config_toml("config/app.toml")?
//!         .add_config_env_vars("APP")
//!         .add_descriptor(ComponentDefinition::<Greeter>::new().default_constructor().build()?)
//!         .build()?;
//!
//!     let _greeter = container.get::<Greeter>()?;
//!     Ok(())
//! }
//! ```

pub mod builder;

#[cfg(test)]
mod tests;

// 重新导出主要类型
pub use builder::{ContainerBuilder, LoggingConfig};
pub use di_impl::Container;

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
