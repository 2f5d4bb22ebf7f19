//! 组件生命周期解析器
//!
//! 不动点迭代：反复执行实例化和注入两轮，直到所有记录都进入 WIRED，
//! 或者一整轮没有任何进展。最后按注册顺序执行初始化钩子。
//!
//! 集合注入点要等到所有提供该类型的记录都进入 WIRED 才解析，
//! 因此注入的集合与描述符的输入顺序无关。

use crate::record::LifecycleRecord;
use crate::registry::ComponentRegistryImpl;
use config_abstractions::PropertySource;
use di_abstractions::{ComponentDescriptor, ComponentLookup, InjectedValue, InjectionSource};
use infrastructure_common::{ComponentRef, DependencyError, DependencyResult, Phase, TypeInfo};
use std::sync::Arc;
use tracing::{debug, info};

/// 组件注入点的查找方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InjectionMode {
    /// 只注入已完成注入的组件，集合等待所有提供者完成注入
    Ready,
    /// 单值注入点允许注入已注册但尚未完成注入的组件（用于字段循环依赖）
    Relaxed,
    /// 在 Relaxed 的基础上，集合注入点直接取当前已注册的全部组件
    Settle,
}

/// 注入点解析结果
enum Resolution {
    Resolved(InjectedValue),
    Deferred,
}

/// 生命周期解析器
///
/// 每次构建容器都使用一个新的解析器，阶段集合只属于这一次构建。
pub struct Resolver<'a> {
    registry: ComponentRegistryImpl,
    properties: &'a dyn PropertySource,
    seeded: Vec<Arc<LifecycleRecord>>,
    pending: Vec<Arc<LifecycleRecord>>,
    instantiated: Vec<Arc<LifecycleRecord>>,
    wired: Vec<Arc<LifecycleRecord>>,
    passes: usize,
}

impl<'a> Resolver<'a> {
    /// 创建解析器，注册表中可以预先放入外部实例
    pub fn new(registry: ComponentRegistryImpl, properties: &'a dyn PropertySource) -> Self {
        Self {
            registry,
            properties,
            seeded: Vec::new(),
            pending: Vec::new(),
            instantiated: Vec::new(),
            wired: Vec::new(),
            passes: 0,
        }
    }

    /// 为描述符创建 PENDING 记录
    pub fn seed(&mut self, descriptor: Arc<ComponentDescriptor>) {
        let record = Arc::new(LifecycleRecord::new(descriptor));
        self.seeded.push(Arc::clone(&record));
        self.pending.push(record);
    }

    /// 执行完整的解析流程，返回填充完成的注册表
    pub fn resolve(mut self) -> DependencyResult<ComponentRegistryImpl> {
        info!("开始解析组件: {} 个待实例化", self.pending.len());

        while !self.pending.is_empty() || !self.instantiated.is_empty() {
            self.passes += 1;
            let before = self.progress();

            self.instantiation_pass()?;
            self.injection_pass(InjectionMode::Ready)?;

            if self.progress() == before {
                debug!("第 {} 轮没有进展，尝试注入未完成注入的组件", self.passes);
                self.injection_pass(InjectionMode::Relaxed)?;
            }
            if self.progress() == before {
                debug!("第 {} 轮仍没有进展，集合注入点按已注册组件解析", self.passes);
                self.injection_pass(InjectionMode::Settle)?;
            }
            if self.progress() == before {
                return Err(self.unsatisfiable());
            }

            debug!(
                "第 {} 轮完成: 待实例化 {}, 待注入 {}, 已注入 {}",
                self.passes,
                self.pending.len(),
                self.instantiated.len(),
                self.wired.len()
            );
        }

        self.hook_pass()?;
        info!(
            "组件解析完成: {} 个组件, {} 轮迭代",
            self.registry.len(),
            self.passes
        );
        Ok(self.registry)
    }

    /// 进展标记：待实例化数量、待注入数量、未解析注入点总数
    fn progress(&self) -> (usize, usize, usize) {
        let unresolved = self
            .instantiated
            .iter()
            .map(|r| r.unresolved_points().len())
            .sum();
        (self.pending.len(), self.instantiated.len(), unresolved)
    }

    /// 单值查找
    ///
    /// 尚未实例化但将提供该类型的记录也参与歧义计算，
    /// 这样多个候选时无论输入顺序如何都会报告歧义。
    fn lookup_single(
        &self,
        type_info: TypeInfo,
        mode: InjectionMode,
    ) -> DependencyResult<Option<ComponentRef>> {
        let unregistered = self
            .seeded
            .iter()
            .filter(|r| r.phase() == Phase::Pending && r.descriptor().provides(type_info))
            .count();
        let count = self.registry.count(type_info) + unregistered;
        if count > 1 {
            return Err(DependencyError::AmbiguousComponent {
                type_name: type_info.name.to_string(),
                count,
            });
        }
        match mode {
            InjectionMode::Ready => self.registry.lookup_unique_ready(type_info),
            InjectionMode::Relaxed | InjectionMode::Settle => self.registry.lookup_unique(type_info),
        }
    }

    /// 除 `record` 自身外，是否还有提供该类型的记录尚未完成注入
    fn has_unwired_provider(&self, record: &LifecycleRecord, type_info: TypeInfo) -> bool {
        self.seeded.iter().any(|r| {
            !std::ptr::eq(r.as_ref(), record)
                && !r.is_injectable()
                && r.descriptor().provides(type_info)
        })
    }

    fn instantiation_pass(&mut self) -> DependencyResult<()> {
        let pending = std::mem::take(&mut self.pending);
        for record in pending {
            if self.try_instantiate(&record)? {
                self.registry.register(Arc::clone(&record));
                self.instantiated.push(record);
            } else {
                self.pending.push(record);
            }
        }
        Ok(())
    }

    fn try_instantiate(&self, record: &LifecycleRecord) -> DependencyResult<bool> {
        let Some(constructor) = record.descriptor().constructor() else {
            return Err(DependencyError::invalid_descriptor(record.name(), "缺少构造器"));
        };

        let mut args = Vec::with_capacity(constructor.parameters().len());
        for parameter in constructor.parameters() {
            match self.lookup_single(*parameter, InjectionMode::Ready)? {
                Some(component) => args.push(component),
                None => {
                    debug!(
                        "组件 {} 的构造器参数 {} 尚不可用，稍后再实例化",
                        record.name(),
                        parameter.name
                    );
                    return Ok(false);
                }
            }
        }

        let instance = constructor
            .invoke(args)
            .map_err(|source| DependencyError::ComponentCreationFailed {
                type_name: record.name().to_string(),
                source,
            })?;
        record.instantiate(instance)?;
        Ok(true)
    }

    fn injection_pass(&mut self, mode: InjectionMode) -> DependencyResult<()> {
        let instantiated = std::mem::take(&mut self.instantiated);
        for record in instantiated {
            self.inject(&record, mode)?;
            if record.is_fully_wired() {
                record.advance(Phase::Wired)?;
                self.wired.push(record);
            } else {
                self.instantiated.push(record);
            }
        }
        Ok(())
    }

    fn inject(&self, record: &LifecycleRecord, mode: InjectionMode) -> DependencyResult<()> {
        let Some(instance) = record.instance() else {
            return Err(DependencyError::LifecycleViolation {
                component: record.name().to_string(),
                from: record.phase().to_string(),
                to: Phase::Wired.to_string(),
            });
        };
        let points = record.descriptor().injection_points();

        for index in record.unresolved_points() {
            let point = &points[index];
            let value = match self.resolve_point(record, point.name(), point.source(), mode)? {
                Resolution::Resolved(value) => value,
                Resolution::Deferred => {
                    debug!(
                        "组件 {} 的注入点 {} 尚无可用依赖",
                        record.name(),
                        point.name()
                    );
                    continue;
                }
            };
            point
                .apply(instance, value)
                .map_err(|source| DependencyError::InjectionFailed {
                    component: record.name().to_string(),
                    point: point.name().to_string(),
                    source,
                })?;
            record.mark_resolved(index);
        }
        Ok(())
    }

    fn resolve_point(
        &self,
        record: &LifecycleRecord,
        point: &str,
        source: &InjectionSource,
        mode: InjectionMode,
    ) -> DependencyResult<Resolution> {
        match source {
            InjectionSource::Property { key, coerce, .. } => {
                let raw = self.properties.get(key).ok_or_else(|| {
                    DependencyError::PropertyNotFound {
                        component: record.name().to_string(),
                        point: point.to_string(),
                        key: key.clone(),
                    }
                })?;
                let value =
                    coerce(raw.as_str()).map_err(|message| DependencyError::PropertyConversionFailed {
                        component: record.name().to_string(),
                        point: point.to_string(),
                        key: key.clone(),
                        value: raw.clone(),
                        message,
                    })?;
                Ok(Resolution::Resolved(InjectedValue::Property(value)))
            }
            InjectionSource::Component {
                type_info,
                collection: true,
            } => {
                let members = match mode {
                    InjectionMode::Settle => self.registry.lookup_all(*type_info),
                    _ if self.has_unwired_provider(record, *type_info) => {
                        return Ok(Resolution::Deferred)
                    }
                    _ => self.registry.lookup_all_ready(*type_info),
                };
                Ok(Resolution::Resolved(InjectedValue::Collection(members)))
            }
            InjectionSource::Component {
                type_info,
                collection: false,
            } => Ok(self
                .lookup_single(*type_info, mode)?
                .map_or(Resolution::Deferred, |component| {
                    Resolution::Resolved(InjectedValue::Single(component))
                })),
        }
    }

    fn hook_pass(&mut self) -> DependencyResult<()> {
        self.wired.clear();
        for record in self.registry.records() {
            // 外部实例已经是 READY
            if record.phase() != Phase::Wired {
                continue;
            }
            let Some(instance) = record.instance() else {
                continue;
            };
            for hook in record.descriptor().post_construct_hooks() {
                debug!("执行组件 {} 的初始化钩子 {}", record.name(), hook.name());
                hook.invoke(instance)
                    .map_err(|source| DependencyError::HookInvocationFailed {
                        component: record.name().to_string(),
                        hook: hook.name().to_string(),
                        source,
                    })?;
            }
            record.advance(Phase::Ready)?;
        }
        Ok(())
    }

    fn unsatisfiable(&self) -> DependencyError {
        let names = |records: &[Arc<LifecycleRecord>]| {
            records.iter().map(|r| r.name().to_string()).collect::<Vec<_>>()
        };
        DependencyError::UnsatisfiableDependency {
            pending: names(&self.pending),
            instantiated: names(&self.instantiated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_abstractions::EmptyPropertySource;
    use di_abstractions::{ComponentDefinition, TypedComponentLookup};
    use once_cell::sync::OnceCell;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Engine {
        started: AtomicUsize,
    }

    struct Car {
        engine: Arc<Engine>,
    }

    #[derive(Default)]
    struct Left {
        right: OnceCell<Arc<Right>>,
    }

    #[derive(Default)]
    struct Right {
        left: OnceCell<Arc<Left>>,
    }

    fn resolve(descriptors: Vec<ComponentDescriptor>) -> DependencyResult<ComponentRegistryImpl> {
        let mut resolver = Resolver::new(ComponentRegistryImpl::new(), &EmptyPropertySource);
        for descriptor in descriptors {
            resolver.seed(Arc::new(descriptor));
        }
        resolver.resolve()
    }

    fn engine() -> ComponentDescriptor {
        ComponentDefinition::<Engine>::new()
            .default_constructor()
            .post_construct("start", |e: &Engine| {
                e.started.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap()
    }

    fn car() -> ComponentDescriptor {
        ComponentDefinition::<Car>::new()
            .constructor1(|engine: Arc<Engine>| Car { engine })
            .build()
            .unwrap()
    }

    #[test]
    fn test_constructor_dependency_in_any_order() {
        let registry = resolve(vec![car(), engine()]).unwrap();
        let car = registry.find::<Car>().unwrap().unwrap();
        let engine = registry.find::<Engine>().unwrap().unwrap();
        assert!(Arc::ptr_eq(&car.engine, &engine));
        assert_eq!(engine.started.load(Ordering::SeqCst), 1);
        assert!(registry.records().iter().all(|r| r.phase() == Phase::Ready));
    }

    #[test]
    fn test_missing_constructor_dependency_is_unsatisfiable() {
        let err = resolve(vec![car()]).unwrap_err();
        match err {
            DependencyError::UnsatisfiableDependency {
                pending,
                instantiated,
            } => {
                assert_eq!(pending, vec![std::any::type_name::<Car>().to_string()]);
                assert!(instantiated.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_mutual_field_injection_converges() {
        let left = ComponentDefinition::<Left>::new()
            .default_constructor()
            .inject("right", |l: &Left, r: Arc<Right>| {
                let _ = l.right.set(r);
            })
            .build()
            .unwrap();
        let right = ComponentDefinition::<Right>::new()
            .default_constructor()
            .inject("left", |r: &Right, l: Arc<Left>| {
                let _ = r.left.set(l);
            })
            .build()
            .unwrap();

        let registry = resolve(vec![left, right]).unwrap();
        let left = registry.find::<Left>().unwrap().unwrap();
        let right = left.right.get().unwrap();
        assert!(Arc::ptr_eq(right.left.get().unwrap(), &left));
    }

    #[test]
    fn test_property_errors_abort_resolution() {
        #[derive(Default)]
        struct Server {
            port: OnceCell<u16>,
        }

        let server = || {
            ComponentDefinition::<Server>::new()
                .default_constructor()
                .inject_property("port", "server.port", |s: &Server, v: u16| {
                    let _ = s.port.set(v);
                })
                .build()
                .unwrap()
        };

        let err = resolve(vec![server()]).unwrap_err();
        assert!(matches!(err, DependencyError::PropertyNotFound { key, .. } if key == "server.port"));

        let properties =
            HashMap::from([("server.port".to_string(), "eighty".to_string())]);
        let mut resolver = Resolver::new(ComponentRegistryImpl::new(), &properties);
        resolver.seed(Arc::new(server()));
        assert!(matches!(
            resolver.resolve(),
            Err(DependencyError::PropertyConversionFailed { value, .. }) if value == "eighty"
        ));
    }

    trait Wheel: Send + Sync {
        fn position(&self) -> &'static str;
    }

    #[derive(Default)]
    struct FrontWheel;
    impl Wheel for FrontWheel {
        fn position(&self) -> &'static str {
            "front"
        }
    }

    #[derive(Default)]
    struct RearWheel {
        engine: OnceCell<Arc<Engine>>,
    }
    impl Wheel for RearWheel {
        fn position(&self) -> &'static str {
            "rear"
        }
    }

    #[derive(Default)]
    struct Axle {
        wheels: OnceCell<Vec<Arc<dyn Wheel>>>,
    }

    fn front_wheel() -> ComponentDescriptor {
        ComponentDefinition::<FrontWheel>::new()
            .default_constructor()
            .implements::<dyn Wheel>(|w| w as Arc<dyn Wheel>)
            .build()
            .unwrap()
    }

    // 后轮依赖引擎字段，比前轮晚一轮进入 WIRED
    fn rear_wheel() -> ComponentDescriptor {
        ComponentDefinition::<RearWheel>::new()
            .default_constructor()
            .implements::<dyn Wheel>(|w| w as Arc<dyn Wheel>)
            .inject("engine", |w: &RearWheel, e: Arc<Engine>| {
                let _ = w.engine.set(e);
            })
            .build()
            .unwrap()
    }

    fn axle() -> ComponentDescriptor {
        ComponentDefinition::<Axle>::new()
            .default_constructor()
            .inject_all("wheels", |a: &Axle, wheels: Vec<Arc<dyn Wheel>>| {
                let _ = a.wheels.set(wheels);
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_collection_waits_for_every_provider() {
        let orders: Vec<Vec<ComponentDescriptor>> = vec![
            vec![axle(), front_wheel(), rear_wheel(), engine()],
            vec![front_wheel(), rear_wheel(), engine(), axle()],
            vec![engine(), axle(), rear_wheel(), front_wheel()],
        ];

        for descriptors in orders {
            let registry = resolve(descriptors).unwrap();
            let axle = registry.find::<Axle>().unwrap().unwrap();
            let mut positions: Vec<_> =
                axle.wheels.get().unwrap().iter().map(|w| w.position()).collect();
            positions.sort_unstable();
            assert_eq!(positions, vec!["front", "rear"]);
        }
    }

    #[test]
    fn test_collection_of_absent_type_is_empty() {
        let registry = resolve(vec![axle()]).unwrap();
        let axle = registry.find::<Axle>().unwrap().unwrap();
        assert!(axle.wheels.get().unwrap().is_empty());
    }

    #[test]
    fn test_singular_dependency_with_two_providers_is_ambiguous() {
        struct Cart {
            wheel: Arc<dyn Wheel>,
        }

        let cart = || {
            ComponentDefinition::<Cart>::new()
                .constructor1(|wheel: Arc<dyn Wheel>| Cart { wheel })
                .build()
                .unwrap()
        };

        let orders: Vec<Vec<ComponentDescriptor>> = vec![
            vec![cart(), front_wheel(), rear_wheel(), engine()],
            vec![front_wheel(), cart(), rear_wheel(), engine()],
            vec![engine(), front_wheel(), rear_wheel(), cart()],
        ];
        for descriptors in orders {
            match resolve(descriptors) {
                Err(DependencyError::AmbiguousComponent { type_name, count }) => {
                    assert!(type_name.contains("Wheel"));
                    assert_eq!(count, 2);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }

        let registry = resolve(vec![front_wheel(), cart()]).unwrap();
        let cart = registry.find::<Cart>().unwrap().unwrap();
        assert_eq!(cart.wheel.position(), "front");
    }

    #[test]
    fn test_hook_failure_aborts_resolution() {
        let failing = ComponentDefinition::<Engine>::new()
            .default_constructor()
            .try_post_construct("ignite", |_: &Engine| Err(anyhow::anyhow!("no fuel")))
            .build()
            .unwrap();
        let err = resolve(vec![failing]).unwrap_err();
        assert!(
            matches!(err, DependencyError::HookInvocationFailed { ref hook, .. } if hook == "ignite")
        );
        assert!(err.to_string().contains("no fuel"));
    }
}
