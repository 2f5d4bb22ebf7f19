//! 组件生命周期阶段

use std::fmt;

/// 组件生命周期阶段
///
/// 状态只能按 `Pending -> Instantiated -> Wired -> Ready` 单调前进，不允许回退或跳跃。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// 等待实例化（构造器参数尚未全部可用）
    #[default]
    Pending,
    /// 已实例化并注册，但仍有未注入的注入点
    Instantiated,
    /// 所有注入点已注入，初始化钩子尚未执行
    Wired,
    /// 初始化钩子执行完成（终态）
    Ready,
}

impl Phase {
    /// 下一个阶段
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Instantiated),
            Self::Instantiated => Some(Self::Wired),
            Self::Wired => Some(Self::Ready),
            Self::Ready => None,
        }
    }

    /// 是否允许从当前阶段转换到目标阶段
    pub fn can_advance_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }

    /// 是否可以作为依赖注入给其他组件
    ///
    /// 注入点全部填充后（`Wired`）即可被注入，不必等待初始化钩子执行。
    pub fn is_injectable(self) -> bool {
        matches!(self, Self::Wired | Self::Ready)
    }

    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Instantiated => "INSTANTIATED",
            Self::Wired => "WIRED",
            Self::Ready => "READY",
        };
        f.write_str(label)
    }
}
