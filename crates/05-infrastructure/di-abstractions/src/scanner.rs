//! 组件描述符来源抽象接口
//!
//! 组件发现和元数据提取不属于容器本身，容器只消费它们产出的描述符。

use crate::descriptor::ComponentDescriptor;
use infrastructure_common::DependencyResult;

/// 描述符来源 trait
pub trait DescriptorSource: Send + Sync {
    /// 产出组件描述符
    fn descriptors(&self) -> DependencyResult<Vec<ComponentDescriptor>>;

    /// 来源名称
    fn name(&self) -> &str {
        "DescriptorSource"
    }
}

impl DescriptorSource for Vec<ComponentDescriptor> {
    fn descriptors(&self) -> DependencyResult<Vec<ComponentDescriptor>> {
        Ok(self.clone())
    }

    fn name(&self) -> &str {
        "Vec<ComponentDescriptor>"
    }
}

/// 基于函数的描述符来源
///
/// 适合把一组 `ComponentDefinition::build` 调用包装为来源。
pub struct FnDescriptorSource<F> {
    name: String,
    produce: F,
}

impl<F> FnDescriptorSource<F>
where
    F: Fn() -> DependencyResult<Vec<ComponentDescriptor>> + Send + Sync,
{
    /// 创建函数来源
    pub fn new(name: impl Into<String>, produce: F) -> Self {
        Self {
            name: name.into(),
            produce,
        }
    }
}

impl<F> DescriptorSource for FnDescriptorSource<F>
where
    F: Fn() -> DependencyResult<Vec<ComponentDescriptor>> + Send + Sync,
{
    fn descriptors(&self) -> DependencyResult<Vec<ComponentDescriptor>> {
        (self.produce)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
