//! 组件注册表抽象接口

use infrastructure_common::{
    ComponentRef, DependencyError, DependencyResult, FactoryArgs, TypeInfo,
};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// 注册表索引键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    /// 按类型（声明类型、别名类型或工厂产出类型）
    Type(TypeId),
    /// 按名称（组件名称或工厂产出类型名称）
    Name(String),
}

impl ComponentKey {
    /// 类型键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeId::of::<T>())
    }
}

impl From<TypeInfo> for ComponentKey {
    fn from(type_info: TypeInfo) -> Self {
        Self::Type(type_info.id)
    }
}

impl From<&str> for ComponentKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(id) => write!(f, "type {:?}", id),
            Self::Name(name) => write!(f, "name '{}'", name),
        }
    }
}

/// 组件查找 trait
///
/// 解析器在启动阶段通过它获取依赖，容器在启动完成后通过它响应查询。
/// 工厂组件在按产出类型查找时每次都会重新调用工厂方法。
pub trait ComponentLookup: Send + Sync {
    /// 查找所有匹配的组件（按注册顺序）
    fn lookup_all(&self, type_info: TypeInfo) -> Vec<ComponentRef>;

    /// 查找所有已完成注入的匹配组件（按注册顺序）
    fn lookup_all_ready(&self, type_info: TypeInfo) -> Vec<ComponentRef>;

    /// 查找唯一匹配的组件，多于一个时返回 `AmbiguousComponent`
    fn lookup_unique(&self, type_info: TypeInfo) -> DependencyResult<Option<ComponentRef>>;

    /// 查找唯一已完成注入的匹配组件
    ///
    /// 歧义按全部匹配记录计算；唯一的记录尚未完成注入时返回 `None`。
    fn lookup_unique_ready(&self, type_info: TypeInfo) -> DependencyResult<Option<ComponentRef>>;

    /// 查找唯一匹配的组件，并把参数传给工厂方法
    fn lookup_unique_with_args(
        &self,
        type_info: TypeInfo,
        args: &FactoryArgs,
    ) -> DependencyResult<Option<ComponentRef>>;

    /// 按名称查找唯一组件
    fn lookup_by_name(&self, name: &str) -> DependencyResult<Option<ComponentRef>>;

    /// 是否存在匹配的组件
    fn contains(&self, type_info: TypeInfo) -> bool;

    /// 所有组件名称（按注册顺序）
    fn names(&self) -> Vec<String>;
}

/// 强类型查找扩展
///
/// 对所有 [`ComponentLookup`] 自动实现。
pub trait TypedComponentLookup: ComponentLookup {
    /// 查找唯一组件
    fn find<T>(&self) -> DependencyResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup_unique(TypeInfo::of::<T>())?
            .map(|component| downcast_component::<T>(component, std::any::type_name::<T>()))
            .transpose()
    }

    /// 查找所有组件，转换失败的候选被跳过
    fn find_all<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup_all(TypeInfo::of::<T>())
            .into_iter()
            .filter_map(|component| component.downcast::<T>().ok())
            .collect()
    }

    /// 按名称查找组件
    fn find_by_name<T>(&self, name: &str) -> DependencyResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup_by_name(name)?
            .map(|component| downcast_component::<T>(component, name))
            .transpose()
    }
}

impl<L: ComponentLookup + ?Sized> TypedComponentLookup for L {}

/// 把组件引用还原为目标类型，失败时返回 `TypeMismatch`
pub fn downcast_component<T>(component: ComponentRef, name: &str) -> DependencyResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    component
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>().to_string(),
        })
}
