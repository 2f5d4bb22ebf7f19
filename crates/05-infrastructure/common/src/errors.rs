//! 错误类型定义

use thiserror::Error;

/// 用户回调（构造器、注入 setter、钩子、工厂方法）返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {message}")]
    TypeConversionError { message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件描述符无效: {component}, 原因: {message}")]
    InvalidDescriptor { component: String, message: String },

    #[error("组件未注册: {type_name}")]
    ComponentNotRegistered { type_name: String },

    #[error("组件不唯一: {type_name}, 候选数量: {count}")]
    AmbiguousComponent { type_name: String, count: usize },

    #[error("组件类型不匹配: 名称 {name} 无法转换为 {expected}")]
    TypeMismatch { name: String, expected: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed { type_name: String, source: BoxError },

    #[error("依赖注入失败: {component}.{point}, 原因: {source}")]
    InjectionFailed {
        component: String,
        point: String,
        source: BoxError,
    },

    #[error("配置属性不存在: {component}.{point}, 键: {key}")]
    PropertyNotFound {
        component: String,
        point: String,
        key: String,
    },

    #[error("配置属性转换失败: {component}.{point}, 键: {key}, 值: {value}, 原因: {message}")]
    PropertyConversionFailed {
        component: String,
        point: String,
        key: String,
        value: String,
        message: String,
    },

    #[error("依赖无法满足 (缺失依赖或构造器循环依赖): 待实例化 {pending:?}, 待注入 {instantiated:?}")]
    UnsatisfiableDependency {
        pending: Vec<String>,
        instantiated: Vec<String>,
    },

    #[error("初始化钩子执行失败: {component}.{hook}, 原因: {source}")]
    HookInvocationFailed {
        component: String,
        hook: String,
        source: BoxError,
    },

    #[error("组件生命周期状态非法: {component}, {from} -> {to}")]
    LifecycleViolation {
        component: String,
        from: String,
        to: String,
    },
}

impl DependencyError {
    /// 创建描述符无效错误
    pub fn invalid_descriptor(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            component: component.into(),
            message: message.into(),
        }
    }

    /// 创建组件未注册错误
    pub fn not_registered(type_name: impl Into<String>) -> Self {
        Self::ComponentNotRegistered {
            type_name: type_name.into(),
        }
    }

    /// 是否为启动期致命错误
    ///
    /// 查找期错误（未注册、不唯一、类型不匹配）只影响调用方本身。
    pub fn is_startup_error(&self) -> bool {
        !matches!(
            self,
            Self::ComponentNotRegistered { .. }
                | Self::AmbiguousComponent { .. }
                | Self::TypeMismatch { .. }
        )
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
