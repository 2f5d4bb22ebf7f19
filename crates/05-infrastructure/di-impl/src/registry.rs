//! 组件注册表实现
//!
//! 多键索引：类型键（声明类型、别名、工厂产出类型）和名称键都映射到按注册顺序排列的记录。
//! 记录一旦注册就不会被移除。

use crate::record::LifecycleRecord;
use di_abstractions::{Alias, ComponentKey, ComponentLookup, FactoryMethod};
use infrastructure_common::{
    ComponentRef, DependencyError, DependencyResult, FactoryArgs, TypeInfo,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// 记录在某个键下的取值方式
#[derive(Clone)]
enum Vend {
    /// 把实例转换为键对应的类型
    Cast(Alias),
    /// 调用工厂方法
    Factory(FactoryMethod),
}

#[derive(Clone)]
struct Entry {
    record: Arc<LifecycleRecord>,
    vend: Vend,
}

impl Entry {
    fn produce(&self, args: &FactoryArgs) -> Option<ComponentRef> {
        let instance = self.record.instance()?;
        match &self.vend {
            Vend::Cast(alias) => alias.cast(instance),
            Vend::Factory(method) => match method.invoke(instance, args) {
                Ok(component) => Some(component),
                Err(e) => {
                    error!(
                        "工厂组件 {} 通过工厂方法 {} 创建 {} 失败: {}",
                        self.record.name(),
                        method.name(),
                        method.produces().name,
                        e
                    );
                    None
                }
            },
        }
    }
}

/// 组件注册表
#[derive(Default)]
pub struct ComponentRegistryImpl {
    index: HashMap<ComponentKey, Vec<Entry>>,
    records: Vec<Arc<LifecycleRecord>>,
}

impl fmt::Debug for ComponentRegistryImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistryImpl")
            .field("records", &self.records)
            .field("keys", &self.index.len())
            .finish()
    }
}

impl ComponentRegistryImpl {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册记录
    ///
    /// 记录必须已经持有实例。同一条记录重复注册时直接忽略。
    pub fn register(&mut self, record: Arc<LifecycleRecord>) {
        if self.records.iter().any(|r| Arc::ptr_eq(r, &record)) {
            warn!("组件 {} 已注册，忽略重复注册", record.name());
            return;
        }

        let descriptor = Arc::clone(record.descriptor());
        let declared = descriptor.declared_alias().clone();

        self.insert(
            ComponentKey::from(declared.type_info()),
            &record,
            Vend::Cast(declared.clone()),
        );
        if descriptor.is_expanded() {
            for alias in descriptor.aliases() {
                self.insert(
                    ComponentKey::from(alias.type_info()),
                    &record,
                    Vend::Cast(alias.clone()),
                );
            }
        }
        self.insert(
            ComponentKey::Name(descriptor.name().to_string()),
            &record,
            Vend::Cast(declared),
        );

        if let Some(factory) = descriptor.factory() {
            let produces = factory.produces();
            self.insert(
                ComponentKey::from(produces),
                &record,
                Vend::Factory(factory.method().clone()),
            );
            self.insert(
                ComponentKey::Name(produces.name.to_string()),
                &record,
                Vend::Factory(factory.method().clone()),
            );
        }

        debug!(
            "注册组件 {} ({}), 阶段 {}",
            record.name(),
            descriptor.declared_type().name,
            record.phase()
        );
        self.records.push(record);
    }

    fn insert(&mut self, key: ComponentKey, record: &Arc<LifecycleRecord>, vend: Vend) {
        let entries = self.index.entry(key).or_default();
        if entries.iter().any(|e| Arc::ptr_eq(&e.record, record)) {
            return;
        }
        entries.push(Entry {
            record: Arc::clone(record),
            vend,
        });
    }

    /// 已注册的记录（按注册顺序）
    pub fn records(&self) -> &[Arc<LifecycleRecord>] {
        &self.records
    }

    /// 已注册的记录数量
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 某个类型键下已注册的记录数量（不区分阶段）
    pub fn count(&self, type_info: TypeInfo) -> usize {
        self.index
            .get(&ComponentKey::from(type_info))
            .map_or(0, Vec::len)
    }

    fn candidates(&self, key: &ComponentKey, ready_only: bool) -> Vec<&Entry> {
        self.index
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| !ready_only || e.record.is_injectable())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn collect(&self, key: &ComponentKey, ready_only: bool) -> Vec<ComponentRef> {
        let args = FactoryArgs::new();
        self.candidates(key, ready_only)
            .into_iter()
            .filter_map(|e| e.produce(&args))
            .collect()
    }

    /// 唯一查找
    ///
    /// 歧义按键下的全部记录计算，阶段过滤只作用于唯一的那条记录。
    fn unique(
        &self,
        key: &ComponentKey,
        display_name: &str,
        ready_only: bool,
        args: &FactoryArgs,
    ) -> DependencyResult<Option<ComponentRef>> {
        let candidates = self.candidates(key, false);
        match candidates.as_slice() {
            [] => Ok(None),
            [entry] if ready_only && !entry.record.is_injectable() => Ok(None),
            [entry] => Ok(entry.produce(args)),
            _ => Err(DependencyError::AmbiguousComponent {
                type_name: display_name.to_string(),
                count: candidates.len(),
            }),
        }
    }
}

impl ComponentLookup for ComponentRegistryImpl {
    fn lookup_all(&self, type_info: TypeInfo) -> Vec<ComponentRef> {
        self.collect(&ComponentKey::from(type_info), false)
    }

    fn lookup_all_ready(&self, type_info: TypeInfo) -> Vec<ComponentRef> {
        self.collect(&ComponentKey::from(type_info), true)
    }

    fn lookup_unique(&self, type_info: TypeInfo) -> DependencyResult<Option<ComponentRef>> {
        self.unique(
            &ComponentKey::from(type_info),
            type_info.name,
            false,
            &FactoryArgs::new(),
        )
    }

    fn lookup_unique_ready(&self, type_info: TypeInfo) -> DependencyResult<Option<ComponentRef>> {
        self.unique(
            &ComponentKey::from(type_info),
            type_info.name,
            true,
            &FactoryArgs::new(),
        )
    }

    fn lookup_unique_with_args(
        &self,
        type_info: TypeInfo,
        args: &FactoryArgs,
    ) -> DependencyResult<Option<ComponentRef>> {
        self.unique(&ComponentKey::from(type_info), type_info.name, false, args)
    }

    fn lookup_by_name(&self, name: &str) -> DependencyResult<Option<ComponentRef>> {
        self.unique(
            &ComponentKey::Name(name.to_string()),
            name,
            false,
            &FactoryArgs::new(),
        )
    }

    fn contains(&self, type_info: TypeInfo) -> bool {
        !self.candidates(&ComponentKey::from(type_info), false).is_empty()
    }

    fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name().to_string()).collect()
    }
}
