//! # 示例应用程序
//!
//! 演示如何使用 Lorn IoC 容器：构造器注入、字段循环注入、属性注入、
//! 集合注入、工厂组件和外部实例。

use clap::Parser;
use config_impl::MapPropertySource;
use di_abstractions::{ComponentDefinition, PreRegistered};
use infrastructure_common::FactoryArgs;
use infrastructure_composition::{Container, ContainerBuilder, LoggingConfig};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn IoC 示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/app.toml")]
    config: String,

    /// 环境变量前缀
    #[arg(long, default_value = "APP")]
    env_prefix: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,
}

/// 消息通道
trait Channel: Send + Sync {
    fn send(&self, message: &str) -> String;
}

#[derive(Default)]
struct EmailChannel;

impl Channel for EmailChannel {
    fn send(&self, message: &str) -> String {
        format!("[email] {}", message)
    }
}

#[derive(Default)]
struct ConsoleChannel;

impl Channel for ConsoleChannel {
    fn send(&self, message: &str) -> String {
        format!("[console] {}", message)
    }
}

/// 服务器设置，通过属性注入
#[derive(Default)]
struct ServerSettings {
    host: OnceCell<String>,
    port: OnceCell<u16>,
}

/// 订单号生成器（工厂组件）
#[derive(Default)]
struct OrderIdFactory {
    next: AtomicU64,
}

struct OrderId(u64);

/// 审计日志，与 OrderService 互相依赖
#[derive(Default)]
struct AuditLog {
    orders: OnceCell<Arc<OrderService>>,
}

/// 订单服务
struct OrderService {
    settings: Arc<ServerSettings>,
    channels: OnceCell<Vec<Arc<dyn Channel>>>,
    audit: OnceCell<Arc<AuditLog>>,
}

impl OrderService {
    fn place(&self, container: &Container) -> anyhow::Result<Vec<String>> {
        let id = container.get::<OrderId>()?;
        let message = format!(
            "订单 {} 已创建 ({}:{})",
            id.0,
            self.settings.host.get().map(String::as_str).unwrap_or("?"),
            self.settings.port.get().copied().unwrap_or_default()
        );
        Ok(self
            .channels
            .get()
            .map(|channels| channels.iter().map(|c| c.send(&message)).collect())
            .unwrap_or_default())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        json_format: args.json_logs,
        ..LoggingConfig::default()
    }
    .with_filter(args.log_level.clone());

    let container = build_container(&args, logging)?;
    info!("组件: {:?}", container.component_names());

    demonstrate_resolution(&container)?;
    Ok(())
}

/// 构建容器
fn build_container(args: &Args, logging: LoggingConfig) -> anyhow::Result<Container> {
    let defaults = MapPropertySource::new("defaults")
        .with_property("server.host", "127.0.0.1")
        .with_property("server.port", "8080")
        .with_priority(-100);

    let mut builder = ContainerBuilder::new()
        .with_logging(logging)
        .add_property_source(defaults)
        .add_config_env_vars(args.env_prefix.clone());

    // 添加配置文件（如果存在）
    if Path::new(&args.config).exists() {
        builder = if args.config.ends_with(".json") {
            builder.add_config_json(&args.config)?
        } else if args.config.ends_with(".toml") {
            builder.add_config_toml(&args.config)?
        } else {
            builder.add_config_file(&args.config)?
        };
    }

    let container = builder
        .add_descriptor(
            ComponentDefinition::<ServerSettings>::new()
                .default_constructor()
                .inject_property("host", "server.host", |s: &ServerSettings, v: String| {
                    let _ = s.host.set(v);
                })
                .inject_property("port", "server.port", |s: &ServerSettings, v: u16| {
                    let _ = s.port.set(v);
                })
                .build()?,
        )
        .add_descriptor(
            ComponentDefinition::<OrderService>::new()
                .constructor1(|settings: Arc<ServerSettings>| OrderService {
                    settings,
                    channels: OnceCell::new(),
                    audit: OnceCell::new(),
                })
                .inject_all("channels", |s: &OrderService, v: Vec<Arc<dyn Channel>>| {
                    let _ = s.channels.set(v);
                })
                .inject("audit", |s: &OrderService, a: Arc<AuditLog>| {
                    let _ = s.audit.set(a);
                })
                .post_construct("announce", |s: &OrderService| {
                    info!(
                        "订单服务就绪, 通道数量: {}",
                        s.channels.get().map_or(0, Vec::len)
                    );
                })
                .build()?,
        )
        .add_descriptor(
            ComponentDefinition::<AuditLog>::new()
                .default_constructor()
                .inject("orders", |a: &AuditLog, o: Arc<OrderService>| {
                    let _ = a.orders.set(o);
                })
                .build()?,
        )
        .add_descriptor(
            ComponentDefinition::<EmailChannel>::new()
                .default_constructor()
                .implements::<dyn Channel>(|c| c as Arc<dyn Channel>)
                .build()?,
        )
        .add_descriptor(
            ComponentDefinition::<OrderIdFactory>::new()
                .factory()
                .default_constructor()
                .factory_method_with_args("next_id", |f: &OrderIdFactory, args: &FactoryArgs| {
                    let step = args.get::<u64>(0).copied().unwrap_or(1);
                    Ok::<_, anyhow::Error>(Arc::new(OrderId(
                        f.next.fetch_add(step, Ordering::SeqCst) + step,
                    )))
                })
                .produces::<OrderId>()
                .build()?,
        )
        .register_instance(
            PreRegistered::new(Arc::new(ConsoleChannel))
                .named("console")
                .expand::<ConsoleChannel, dyn Channel>(|c| c as Arc<dyn Channel>),
        )
        .build()?;

    Ok(container)
}

/// 演示组件解析
fn demonstrate_resolution(container: &Container) -> anyhow::Result<()> {
    let orders = container.get::<OrderService>()?;
    for line in orders.place(container)? {
        info!("{}", line);
    }

    let audit = container.get::<AuditLog>()?;
    let same = audit
        .orders
        .get()
        .is_some_and(|o| Arc::ptr_eq(o, &orders));
    info!("审计日志与订单服务互相注入: {}", same);
    info!("订单服务已持有审计日志: {}", orders.audit.get().is_some());

    let jumped = container.get_with_args::<OrderId>(&FactoryArgs::new().with(100_u64))?;
    info!("带参数的工厂调用: 订单号 {}", jumped.0);

    let channels = container.get_all::<dyn Channel>();
    info!("已注册的消息通道: {}", channels.len());
    Ok(())
}
