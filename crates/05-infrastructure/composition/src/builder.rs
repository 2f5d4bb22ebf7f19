//! 容器构建器

use config_abstractions::PropertySource;
use config_impl::{
    ConfigCratePropertySource, EnvironmentPropertySource, JsonPropertySource,
    LayeredPropertySource, TomlPropertySource,
};
use di_abstractions::{ComponentDescriptor, DescriptorSource, PreRegistered};
use di_impl::Container;
use infrastructure_common::InfrastructureError;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 容器构建器
///
/// 使用建造者模式收集组件描述符、属性源和外部实例，最后一次性构建容器
pub struct ContainerBuilder {
    /// 直接添加的组件描述符
    descriptors: Vec<ComponentDescriptor>,
    /// 描述符来源列表
    descriptor_sources: Vec<Box<dyn DescriptorSource>>,
    /// 属性源（按优先级分层）
    properties: LayeredPropertySource,
    /// 外部实例
    pre_registered: Vec<PreRegistered>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ContainerBuilder {
    /// 创建新的容器构建器
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            descriptor_sources: Vec::new(),
            properties: LayeredPropertySource::new(),
            pre_registered: Vec::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加组件描述符
    pub fn add_descriptor(mut self, descriptor: ComponentDescriptor) -> Self {
        debug!("添加组件描述符: {}", descriptor.name());
        self.descriptors.push(descriptor);
        self
    }

    /// 添加描述符来源
    pub fn add_descriptor_source<S: DescriptorSource + 'static>(mut self, source: S) -> Self {
        info!("添加描述符来源: {}", source.name());
        self.descriptor_sources.push(Box::new(source));
        self
    }

    /// 添加 TOML 配置文件
    pub fn add_config_toml<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("配置文件不存在: {}", path.display()),
            });
        }

        info!("添加 TOML 配置文件: {}", path.display());
        let source = TomlPropertySource::new(path)?;
        self.properties.add_source(Box::new(source));
        Ok(self)
    }

    /// 添加 JSON 配置文件
    pub fn add_config_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("配置文件不存在: {}", path.display()),
            });
        }

        info!("添加 JSON 配置文件: {}", path.display());
        let source = JsonPropertySource::new(path)?;
        self.properties.add_source(Box::new(source));
        Ok(self)
    }

    /// 通过 `config` crate 添加配置文件（格式由扩展名决定）
    pub fn add_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        info!("添加配置文件: {}", path.display());
        let source = ConfigCratePropertySource::from_file(path)?;
        self.properties.add_source(Box::new(source));
        Ok(self)
    }

    /// 添加环境变量配置源
    pub fn add_config_env_vars<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.properties
            .add_source(Box::new(EnvironmentPropertySource::new(prefix)));
        self
    }

    /// 添加自定义属性源
    pub fn add_property_source<T: PropertySource + 'static>(mut self, source: T) -> Self {
        info!("添加自定义属性源: {}", source.name());
        self.properties.add_source(Box::new(source));
        self
    }

    /// 注册外部实例
    pub fn register_instance(mut self, instance: PreRegistered) -> Self {
        debug!("注册外部实例: {}", instance.descriptor().name());
        self.pre_registered.push(instance);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 构建容器
    pub fn build(self) -> Result<Container, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!(
            "开始构建容器, 属性源: {:?}",
            self.properties.source_names()
        );

        let mut descriptors = self.descriptors;
        for source in &self.descriptor_sources {
            let produced = source.descriptors()?;
            debug!("描述符来源 {} 提供 {} 个描述符", source.name(), produced.len());
            descriptors.extend(produced);
        }

        let container = Container::build(descriptors, &self.properties, self.pre_registered)?;
        info!("容器构建完成");
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 过滤指令（`EnvFilter` 语法），设置后优先于 `level`
    pub filter: Option<String>,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            filter: None,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            filter: None,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置过滤指令
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 构造过滤器
    pub fn env_filter(&self) -> Result<EnvFilter, InfrastructureError> {
        match &self.filter {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|e| InfrastructureError::BootstrapFailed {
                    message: format!("日志过滤指令无效: {}: {}", directives, e),
                })
            }
            None => Ok(EnvFilter::default().add_directive(LevelFilter::from_level(self.level).into())),
        }
    }

    /// 初始化全局日志订阅器
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
