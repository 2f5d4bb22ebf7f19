//! 依赖注入容器

use crate::record::LifecycleRecord;
use crate::registry::ComponentRegistryImpl;
use crate::resolver::Resolver;
use config_abstractions::PropertySource;
use di_abstractions::{
    downcast_component, ComponentDescriptor, ComponentLookup, PreRegistered, TypedComponentLookup,
};
use infrastructure_common::{DependencyError, DependencyResult, FactoryArgs, TypeInfo};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// 依赖注入容器
///
/// 构建完成后只读，可以在多个线程之间共享。
pub struct Container {
    registry: ComponentRegistryImpl,
}

impl Container {
    /// 解析所有组件并构建容器
    ///
    /// 外部实例先注册（视为 READY），然后解析描述符。任何启动期错误都会中止构建。
    pub fn build(
        descriptors: Vec<ComponentDescriptor>,
        properties: &dyn PropertySource,
        pre_registered: Vec<PreRegistered>,
    ) -> DependencyResult<Self> {
        info!(
            "构建容器: {} 个组件描述符, {} 个外部实例, 属性源 {}",
            descriptors.len(),
            pre_registered.len(),
            properties.name()
        );

        let mut registry = ComponentRegistryImpl::new();
        for registration in pre_registered {
            let (descriptor, instance) = registration.into_parts()?;
            registry.register(Arc::new(LifecycleRecord::ready(
                Arc::new(descriptor),
                instance,
            )));
        }

        let mut resolver = Resolver::new(registry, properties);
        for descriptor in descriptors {
            resolver.seed(Arc::new(descriptor));
        }
        let registry = resolver.resolve()?;

        info!("容器构建完成: {} 个组件", registry.len());
        Ok(Self { registry })
    }

    /// 获取唯一组件
    pub fn get<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry
            .find::<T>()?
            .ok_or_else(|| DependencyError::not_registered(std::any::type_name::<T>()))
    }

    /// 获取所有匹配的组件（按注册顺序），没有匹配时返回空集合
    pub fn get_all<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.find_all::<T>()
    }

    /// 按名称获取组件
    pub fn get_by_name<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry
            .find_by_name::<T>(name)?
            .ok_or_else(|| DependencyError::not_registered(name))
    }

    /// 获取唯一组件，工厂组件会收到调用参数
    pub fn get_with_args<T>(&self, args: &FactoryArgs) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let component = self
            .registry
            .lookup_unique_with_args(TypeInfo::of::<T>(), args)?
            .ok_or_else(|| DependencyError::not_registered(type_name))?;
        downcast_component::<T>(component, type_name)
    }

    /// 是否存在指定类型的组件
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(TypeInfo::of::<T>())
    }

    /// 所有组件名称（按注册顺序）
    pub fn component_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// 组件数量
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// 是否没有任何组件
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// 底层查找接口
    pub fn lookup(&self) -> &dyn ComponentLookup {
        &self.registry
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("components", &self.component_names())
            .finish()
    }
}
