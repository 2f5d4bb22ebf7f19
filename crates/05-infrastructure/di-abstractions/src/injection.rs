//! 注入点定义
//!
//! 注入点描述组件上一个需要由容器填充的槽位，以及填充它的 setter。
//! 组件实例在注册后是共享的，因此被注入的字段需要内部可变性（例如 `OnceCell`）。

use infrastructure_common::{BoxError, ComponentRef, Instance, TypeInfo};
use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 属性值转换函数：字符串 -> 目标类型（装箱）
pub type Coercion =
    Arc<dyn Fn(&str) -> Result<Box<dyn Any + Send + Sync>, String> + Send + Sync>;

/// 注入 setter
pub type Setter = Arc<dyn Fn(&Instance, InjectedValue) -> Result<(), BoxError> + Send + Sync>;

/// 注入值来源
#[derive(Clone)]
pub enum InjectionSource {
    /// 从属性源按键读取
    Property {
        /// 属性键
        key: String,
        /// 目标类型
        target: TypeInfo,
        /// 字符串到目标类型的转换
        coerce: Coercion,
    },
    /// 从注册表解析组件
    Component {
        /// 依赖类型
        type_info: TypeInfo,
        /// 是否注入所有匹配的组件
        collection: bool,
    },
}

impl InjectionSource {
    /// 创建属性来源，转换使用目标类型的 `FromStr`
    pub fn property<V>(key: impl Into<String>) -> Self
    where
        V: FromStr + Send + Sync + 'static,
        V::Err: fmt::Display,
    {
        Self::Property {
            key: key.into(),
            target: TypeInfo::of::<V>(),
            coerce: Arc::new(|raw: &str| {
                raw.parse::<V>()
                    .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
                    .map_err(|e| e.to_string())
            }),
        }
    }
}

impl fmt::Debug for InjectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property { key, target, .. } => f
                .debug_struct("Property")
                .field("key", key)
                .field("target", &target.name)
                .finish(),
            Self::Component {
                type_info,
                collection,
            } => f
                .debug_struct("Component")
                .field("type", &type_info.name)
                .field("collection", collection)
                .finish(),
        }
    }
}

/// 已解析的注入值
#[derive(Debug)]
pub enum InjectedValue {
    /// 单个组件
    Single(ComponentRef),
    /// 组件集合（按注册顺序）
    Collection(Vec<ComponentRef>),
    /// 已转换的属性值
    Property(Box<dyn Any + Send + Sync>),
}

/// 注入点
#[derive(Clone)]
pub struct InjectionPoint {
    name: String,
    source: InjectionSource,
    setter: Setter,
}

impl InjectionPoint {
    /// 创建注入点
    pub fn new(name: impl Into<String>, source: InjectionSource, setter: Setter) -> Self {
        Self {
            name: name.into(),
            source,
            setter,
        }
    }

    /// 注入点名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注入值来源
    pub fn source(&self) -> &InjectionSource {
        &self.source
    }

    /// 把值写入组件实例
    pub fn apply(&self, instance: &Instance, value: InjectedValue) -> Result<(), BoxError> {
        (self.setter)(instance, value)
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

/// 参数或注入值类型不匹配
#[derive(Debug)]
pub struct TypeMismatchError {
    expected: &'static str,
    actual: String,
}

impl TypeMismatchError {
    /// 创建类型不匹配错误
    pub fn new(expected: &'static str, actual: impl Into<String>) -> Self {
        Self {
            expected,
            actual: actual.into(),
        }
    }
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "类型不匹配: 期望 {}, 实际 {}", self.expected, self.actual)
    }
}

impl std::error::Error for TypeMismatchError {}

/// 把实例还原为组件的具体类型
pub(crate) fn instance_as<C: Send + Sync + 'static>(instance: &Instance) -> Result<&C, BoxError> {
    instance
        .downcast_ref::<C>()
        .ok_or_else(|| TypeMismatchError::new(std::any::type_name::<C>(), "<instance>").into())
}

/// 把组件引用还原为依赖类型
pub(crate) fn component_as<D>(component: ComponentRef) -> Result<Arc<D>, BoxError>
where
    D: ?Sized + Send + Sync + 'static,
{
    component.downcast::<D>().map_err(|other| {
        TypeMismatchError::new(std::any::type_name::<D>(), other.type_info().name).into()
    })
}

/// 单值组件注入 setter
pub(crate) fn single_setter<C, D, F>(setter: F) -> Setter
where
    C: Send + Sync + 'static,
    D: ?Sized + Send + Sync + 'static,
    F: Fn(&C, Arc<D>) + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance, value: InjectedValue| {
        let target = instance_as::<C>(instance)?;
        match value {
            InjectedValue::Single(component) => {
                setter(target, component_as::<D>(component)?);
                Ok(())
            }
            other => Err(TypeMismatchError::new("Single", format!("{:?}", other)).into()),
        }
    })
}

/// 集合组件注入 setter
pub(crate) fn collection_setter<C, D, F>(setter: F) -> Setter
where
    C: Send + Sync + 'static,
    D: ?Sized + Send + Sync + 'static,
    F: Fn(&C, Vec<Arc<D>>) + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance, value: InjectedValue| {
        let target = instance_as::<C>(instance)?;
        match value {
            InjectedValue::Collection(components) => {
                let items = components
                    .into_iter()
                    .map(component_as::<D>)
                    .collect::<Result<Vec<_>, _>>()?;
                setter(target, items);
                Ok(())
            }
            other => Err(TypeMismatchError::new("Collection", format!("{:?}", other)).into()),
        }
    })
}

/// 属性注入 setter
pub(crate) fn property_setter<C, V, F>(setter: F) -> Setter
where
    C: Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: Fn(&C, V) + Send + Sync + 'static,
{
    Arc::new(move |instance: &Instance, value: InjectedValue| {
        let target = instance_as::<C>(instance)?;
        match value {
            InjectedValue::Property(boxed) => {
                let value = boxed.downcast::<V>().map_err(|_| {
                    TypeMismatchError::new(std::any::type_name::<V>(), "<property>")
                })?;
                setter(target, *value);
                Ok(())
            }
            other => Err(TypeMismatchError::new("Property", format!("{:?}", other)).into()),
        }
    })
}
