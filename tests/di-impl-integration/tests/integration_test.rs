//! Centralized integration tests for the lifecycle container

use config_abstractions::{EmptyPropertySource, PropertySource};
use config_impl::{EnvironmentPropertySource, LayeredPropertySource, MapPropertySource, TomlPropertySource};
use di_abstractions::{ComponentDefinition, ComponentDescriptor, PreRegistered};
use di_impl::Container;
use infrastructure_common::{DependencyError, FactoryArgs};
use once_cell::sync::OnceCell;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// A: ctor(), B: ctor(A), C: field{B}, D: field{C}
#[derive(Default)]
struct A;

struct B {
    a: Arc<A>,
}

#[derive(Default)]
struct C {
    b: OnceCell<Arc<B>>,
}

#[derive(Default)]
struct D {
    c: OnceCell<Arc<C>>,
}

fn chain() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDefinition::<A>::new()
            .default_constructor()
            .build()
            .unwrap(),
        ComponentDefinition::<B>::new()
            .constructor1(|a: Arc<A>| B { a })
            .build()
            .unwrap(),
        ComponentDefinition::<C>::new()
            .default_constructor()
            .inject("b", |c: &C, b: Arc<B>| {
                let _ = c.b.set(b);
            })
            .build()
            .unwrap(),
        ComponentDefinition::<D>::new()
            .default_constructor()
            .inject("c", |d: &D, c: Arc<C>| {
                let _ = d.c.set(c);
            })
            .build()
            .unwrap(),
    ]
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for rest in permutations(n - 1) {
        for position in 0..=rest.len() {
            let mut order = rest.clone();
            order.insert(position, n - 1);
            result.push(order);
        }
    }
    result
}

#[test]
fn test_resolution_is_order_independent() {
    let orders = permutations(4);
    assert_eq!(orders.len(), 24);

    for order in orders {
        let container = Container::build(shuffle(chain(), &order), &EmptyPropertySource, Vec::new())
            .unwrap_or_else(|e| panic!("order {:?} failed: {}", order, e));

        let a = container.get::<A>().unwrap();
        let b = container.get::<B>().unwrap();
        let c = container.get::<C>().unwrap();
        let d = container.get::<D>().unwrap();
        assert!(Arc::ptr_eq(&b.a, &a), "order {:?}", order);
        assert!(Arc::ptr_eq(c.b.get().unwrap(), &b), "order {:?}", order);
        assert!(Arc::ptr_eq(d.c.get().unwrap(), &c), "order {:?}", order);
    }
}

#[test]
fn test_mutual_field_injection_reaches_ready() {
    #[derive(Default)]
    struct Husband {
        wife: OnceCell<Arc<Wife>>,
        ready: AtomicUsize,
    }

    #[derive(Default)]
    struct Wife {
        husband: OnceCell<Arc<Husband>>,
    }

    let husband = ComponentDefinition::<Husband>::new()
        .default_constructor()
        .inject("wife", |h: &Husband, w: Arc<Wife>| {
            let _ = h.wife.set(w);
        })
        .post_construct("ready", |h: &Husband| {
            h.ready.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    let wife = ComponentDefinition::<Wife>::new()
        .default_constructor()
        .inject("husband", |w: &Wife, h: Arc<Husband>| {
            let _ = w.husband.set(h);
        })
        .build()
        .unwrap();

    let container = Container::build(vec![wife, husband], &EmptyPropertySource, Vec::new()).unwrap();
    let husband = container.get::<Husband>().unwrap();
    let wife = husband.wife.get().unwrap();
    assert!(Arc::ptr_eq(wife.husband.get().unwrap(), &husband));
    assert_eq!(husband.ready.load(Ordering::SeqCst), 1);
}

#[derive(Default)]
struct ServerConfig {
    host: OnceCell<String>,
    port: OnceCell<u16>,
    workers: OnceCell<usize>,
}

fn server_config() -> ComponentDescriptor {
    ComponentDefinition::<ServerConfig>::new()
        .default_constructor()
        .inject_property("host", "server.host", |s: &ServerConfig, v: String| {
            let _ = s.host.set(v);
        })
        .inject_property("port", "server.port", |s: &ServerConfig, v: u16| {
            let _ = s.port.set(v);
        })
        .inject_property("workers", "server.workers", |s: &ServerConfig, v: usize| {
            let _ = s.workers.set(v);
        })
        .build()
        .unwrap()
}

#[test]
fn test_property_injection_from_layered_sources() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "[server]\nhost = \"0.0.0.0\"\nport = 8080\nworkers = 4"
    )?;

    let env = EnvironmentPropertySource::from_vars(
        "IOC_IT",
        "_",
        vec![("IOC_IT_SERVER_PORT".to_string(), "9090".to_string())],
    );
    let properties = LayeredPropertySource::new()
        .with_source(TomlPropertySource::new(file.path())?)
        .with_source(env);
    assert_eq!(properties.get("server.port").as_deref(), Some("9090"));

    let container = Container::build(vec![server_config()], &properties, Vec::new())?;
    let config = container.get::<ServerConfig>()?;
    assert_eq!(config.host.get().map(String::as_str), Some("0.0.0.0"));
    assert_eq!(config.port.get(), Some(&9090));
    assert_eq!(config.workers.get(), Some(&4));
    Ok(())
}

#[test]
fn test_property_conversion_failure_fails_build() {
    let properties = MapPropertySource::new("test")
        .with_property("server.host", "localhost")
        .with_property("server.port", "http")
        .with_property("server.workers", "2");

    match Container::build(vec![server_config()], &properties, Vec::new()) {
        Err(DependencyError::PropertyConversionFailed {
            point, key, value, ..
        }) => {
            assert_eq!(point, "port");
            assert_eq!(key, "server.port");
            assert_eq!(value, "http");
        }
        other => panic!("expected PropertyConversionFailed, got {:?}", other),
    }

    let missing = MapPropertySource::new("test").with_property("server.host", "localhost");
    assert!(matches!(
        Container::build(vec![server_config()], &missing, Vec::new()),
        Err(DependencyError::PropertyNotFound { .. })
    ));
}

trait Notifier: Send + Sync {
    fn channel(&self) -> String;
}

struct Mail;

impl Notifier for Mail {
    fn channel(&self) -> String {
        "mail".to_string()
    }
}

#[derive(Default)]
struct Sms;

impl Notifier for Sms {
    fn channel(&self) -> String {
        "sms".to_string()
    }
}

#[derive(Default)]
struct Dispatcher {
    notifiers: OnceCell<Vec<Arc<dyn Notifier>>>,
}

#[test]
fn test_pre_registered_instances_join_collections_only_when_expanded() {
    let dispatcher = ComponentDefinition::<Dispatcher>::new()
        .default_constructor()
        .inject_all("notifiers", |d: &Dispatcher, all: Vec<Arc<dyn Notifier>>| {
            let _ = d.notifiers.set(all);
        })
        .build()
        .unwrap();
    let sms = ComponentDefinition::<Sms>::new()
        .default_constructor()
        .implements::<dyn Notifier>(|s| s as Arc<dyn Notifier>)
        .build()
        .unwrap();

    let container = Container::build(
        vec![dispatcher, sms],
        &EmptyPropertySource,
        vec![
            PreRegistered::new(Arc::new(Mail))
                .named("mail")
                .expand::<Mail, dyn Notifier>(|m| m as Arc<dyn Notifier>),
            PreRegistered::new(Arc::new(Sms)).named("backup-sms"),
        ],
    )
    .unwrap();

    let channels: Vec<_> = container
        .get_all::<dyn Notifier>()
        .iter()
        .map(|n| n.channel())
        .collect();
    assert_eq!(channels, vec!["mail", "sms"]);
    assert_eq!(container.get_all::<Sms>().len(), 2);
    assert!(container.get_by_name::<Sms>("backup-sms").is_ok());
    assert!(container.get_by_name::<Mail>("mail").is_ok());

    let dispatcher = container.get::<Dispatcher>().unwrap();
    let injected: Vec<_> = dispatcher
        .notifiers
        .get()
        .unwrap()
        .iter()
        .map(|n| n.channel())
        .collect();
    assert_eq!(injected, vec!["mail", "sms"]);
}

trait Plugin: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Default)]
struct Audit;

impl Plugin for Audit {
    fn id(&self) -> u32 {
        1
    }
}

#[derive(Default)]
struct Metrics;

impl Plugin for Metrics {
    fn id(&self) -> u32 {
        2
    }
}

// 依赖 Audit 字段，比其他插件晚一轮完成注入
#[derive(Default)]
struct Tracing {
    audit: OnceCell<Arc<Audit>>,
}

impl Plugin for Tracing {
    fn id(&self) -> u32 {
        3
    }
}

#[derive(Default)]
struct PluginHost {
    plugins: OnceCell<Vec<Arc<dyn Plugin>>>,
}

fn plugins() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDefinition::<Audit>::new()
            .default_constructor()
            .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
            .build()
            .unwrap(),
        ComponentDefinition::<Metrics>::new()
            .default_constructor()
            .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
            .build()
            .unwrap(),
        ComponentDefinition::<Tracing>::new()
            .default_constructor()
            .implements::<dyn Plugin>(|p| p as Arc<dyn Plugin>)
            .inject("audit", |t: &Tracing, a: Arc<Audit>| {
                let _ = t.audit.set(a);
            })
            .build()
            .unwrap(),
    ]
}

fn shuffle(descriptors: Vec<ComponentDescriptor>, order: &[usize]) -> Vec<ComponentDescriptor> {
    let mut slots: Vec<Option<ComponentDescriptor>> = descriptors.into_iter().map(Some).collect();
    order.iter().filter_map(|i| slots[*i].take()).collect()
}

#[test]
fn test_collection_injection_is_order_independent() {
    for order in permutations(4) {
        let mut descriptors = plugins();
        descriptors.push(
            ComponentDefinition::<PluginHost>::new()
                .default_constructor()
                .inject_all("plugins", |h: &PluginHost, all: Vec<Arc<dyn Plugin>>| {
                    let _ = h.plugins.set(all);
                })
                .build()
                .unwrap(),
        );

        let container = Container::build(shuffle(descriptors, &order), &EmptyPropertySource, Vec::new())
            .unwrap_or_else(|e| panic!("order {:?} failed: {}", order, e));
        let host = container.get::<PluginHost>().unwrap();
        let mut ids: Vec<_> = host.plugins.get().unwrap().iter().map(|p| p.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3], "order {:?}", order);
    }
}

#[test]
fn test_singular_dependency_on_shared_trait_is_ambiguous_in_every_order() {
    struct Loader {
        _plugin: Arc<dyn Plugin>,
    }

    for order in permutations(4) {
        let mut descriptors = plugins();
        descriptors.remove(1);
        descriptors.push(
            ComponentDefinition::<Loader>::new()
                .constructor1(|plugin: Arc<dyn Plugin>| Loader { _plugin: plugin })
                .build()
                .unwrap(),
        );
        descriptors.push(
            ComponentDefinition::<Metrics>::new()
                .default_constructor()
                .build()
                .unwrap(),
        );

        match Container::build(shuffle(descriptors, &order), &EmptyPropertySource, Vec::new()) {
            Err(DependencyError::AmbiguousComponent { count, .. }) => {
                assert_eq!(count, 2, "order {:?}", order)
            }
            other => panic!("order {:?}: expected AmbiguousComponent, got {:?}", order, other),
        }
    }
}

#[test]
fn test_pre_registered_factory_with_arguments() {
    struct Greeting(String);
    struct Greeter {
        prefix: &'static str,
    }

    let greeter = PreRegistered::new(Arc::new(Greeter { prefix: "hello" })).with_factory_method(
        "greet",
        |g: &Greeter, args: &FactoryArgs| {
            let name = args.get::<&'static str>(0).copied().unwrap_or("world");
            Ok(Arc::new(Greeting(format!("{}, {}", g.prefix, name))))
        },
    );

    let container = Container::build(Vec::new(), &EmptyPropertySource, vec![greeter]).unwrap();
    assert_eq!(container.get::<Greeting>().unwrap().0, "hello, world");
    assert_eq!(
        container
            .get_with_args::<Greeting>(&FactoryArgs::new().with("rust"))
            .unwrap()
            .0,
        "hello, rust"
    );
    assert!(container.contains::<Greeter>());
}

#[test]
fn test_constructor_failure_aborts_build() {
    struct Flaky;

    let flaky = ComponentDefinition::<Flaky>::new()
        .try_constructor(|| Err::<Flaky, _>(anyhow::anyhow!("disk full")))
        .build()
        .unwrap();

    let err = Container::build(vec![flaky], &EmptyPropertySource, Vec::new()).unwrap_err();
    assert!(matches!(err, DependencyError::ComponentCreationFailed { .. }));
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_after_build() {
    struct Counter(AtomicUsize);

    #[derive(Default)]
    struct CounterFactory;

    let factory = ComponentDefinition::<CounterFactory>::new()
        .factory()
        .default_constructor()
        .factory_method("counter", |_: &CounterFactory| {
            Arc::new(Counter(AtomicUsize::new(0)))
        })
        .produces::<Counter>()
        .build()
        .unwrap();

    let mut descriptors = chain();
    descriptors.push(factory);
    let container = Arc::new(Container::build(descriptors, &EmptyPropertySource, Vec::new()).unwrap());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let container = Arc::clone(&container);
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                let d = container.get::<D>().unwrap();
                assert!(d.c.get().is_some());
                let counter = container.get::<Counter>().unwrap();
                assert_eq!(counter.0.fetch_add(1, Ordering::SeqCst), 0);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let first = container.get::<A>().unwrap();
    assert!(Arc::ptr_eq(&first, &container.get::<A>().unwrap()));
}
