//! 组件实例的类型擦除表示
//!
//! 注册表内部只保存 `Arc<dyn Any + Send + Sync>`，对外提供的值统一包装为 [`ComponentRef`]。

use crate::metadata::TypeInfo;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 已构造的组件实例（具体类型被擦除）
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 类型擦除后的组件引用
///
/// 内部保存的是 `Arc<T>`，其中 `T` 可以是具体类型，也可以是 trait object。
pub struct ComponentRef {
    value: Box<dyn Any + Send + Sync>,
    type_info: TypeInfo,
}

impl ComponentRef {
    /// 包装一个组件引用
    pub fn new<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// 引用的目标类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 还原为强类型引用，类型不匹配时原样返回
    pub fn downcast<T>(self) -> Result<Arc<T>, Self>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_info = self.type_info;
        match self.value.downcast::<Arc<T>>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_info }),
        }
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("type", &self.type_info.name)
            .finish()
    }
}

/// 工厂方法的调用参数
///
/// 普通查找使用空参数；`get_with_args` 会把调用方提供的参数传给工厂方法。
#[derive(Default)]
pub struct FactoryArgs {
    args: Vec<Box<dyn Any + Send + Sync>>,
}

impl FactoryArgs {
    /// 创建空参数列表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个参数
    pub fn with<T: Any + Send + Sync>(mut self, arg: T) -> Self {
        self.args.push(Box::new(arg));
        self
    }

    /// 按位置获取参数
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.args.get(index)?.downcast_ref::<T>()
    }

    /// 参数数量
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Debug for FactoryArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryArgs")
            .field("len", &self.args.len())
            .finish()
    }
}
