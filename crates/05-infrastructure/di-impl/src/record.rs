//! 组件生命周期记录

use di_abstractions::ComponentDescriptor;
use infrastructure_common::{DependencyError, DependencyResult, Instance, Phase};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 组件生命周期记录
///
/// 每个描述符对应一条记录。启动期间只由解析器推进，进入 READY 后只读。
pub struct LifecycleRecord {
    descriptor: Arc<ComponentDescriptor>,
    phase: RwLock<Phase>,
    instance: OnceCell<Instance>,
    unresolved: Mutex<Vec<usize>>,
}

impl LifecycleRecord {
    /// 为描述符创建 PENDING 记录
    pub fn new(descriptor: Arc<ComponentDescriptor>) -> Self {
        let unresolved = (0..descriptor.injection_points().len()).collect();
        Self {
            descriptor,
            phase: RwLock::new(Phase::Pending),
            instance: OnceCell::new(),
            unresolved: Mutex::new(unresolved),
        }
    }

    /// 为外部实例创建 READY 记录
    pub fn ready(descriptor: Arc<ComponentDescriptor>, instance: Instance) -> Self {
        Self {
            descriptor,
            phase: RwLock::new(Phase::Ready),
            instance: OnceCell::with_value(instance),
            unresolved: Mutex::new(Vec::new()),
        }
    }

    /// 组件名称
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// 组件描述符
    pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
        &self.descriptor
    }

    /// 当前阶段
    pub fn phase(&self) -> Phase {
        *self.phase.read()
    }

    /// 组件实例，INSTANTIATED 之前为空
    pub fn instance(&self) -> Option<&Instance> {
        self.instance.get()
    }

    /// 是否可以作为依赖注入（WIRED 或 READY）
    pub fn is_injectable(&self) -> bool {
        self.phase().is_injectable()
    }

    /// 尚未解析的注入点下标（按声明顺序）
    pub fn unresolved_points(&self) -> Vec<usize> {
        self.unresolved.lock().clone()
    }

    /// 标记注入点已解析
    pub fn mark_resolved(&self, point: usize) {
        self.unresolved.lock().retain(|p| *p != point);
    }

    /// 是否所有注入点都已解析
    pub fn is_fully_wired(&self) -> bool {
        self.unresolved.lock().is_empty()
    }

    /// 设置实例并进入 INSTANTIATED
    pub fn instantiate(&self, instance: Instance) -> DependencyResult<()> {
        self.advance(Phase::Instantiated)?;
        if self.instance.set(instance).is_err() {
            return Err(self.violation(Phase::Instantiated, Phase::Instantiated));
        }
        Ok(())
    }

    /// 推进到下一阶段，不允许回退或跳过
    pub fn advance(&self, target: Phase) -> DependencyResult<()> {
        let mut phase = self.phase.write();
        if !phase.can_advance_to(target) {
            return Err(self.violation(*phase, target));
        }
        if target == Phase::Wired && !self.is_fully_wired() {
            return Err(self.violation(*phase, target));
        }
        debug!("组件 {} 生命周期: {} -> {}", self.name(), *phase, target);
        *phase = target;
        Ok(())
    }

    fn violation(&self, from: Phase, to: Phase) -> DependencyError {
        DependencyError::LifecycleViolation {
            component: self.name().to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl fmt::Debug for LifecycleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleRecord")
            .field("name", &self.name())
            .field("phase", &self.phase())
            .field("unresolved", &self.unresolved_points())
            .finish()
    }
}
