//! 分层属性源

use config_abstractions::PropertySource;
use tracing::{debug, info};

/// 分层属性源
///
/// 按优先级组合多个属性源（优先级高的在前，相同优先级保持添加顺序），
/// 查询时返回第一个命中的值。
#[derive(Default)]
pub struct LayeredPropertySource {
    sources: Vec<Box<dyn PropertySource>>,
}

impl LayeredPropertySource {
    /// 创建空的分层属性源
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加属性源
    pub fn add_source(&mut self, source: Box<dyn PropertySource>) {
        info!("注册属性源: {} (优先级 {})", source.name(), source.priority());
        self.sources.push(source);
        // 稳定排序，相同优先级保持添加顺序
        self.sources.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// 链式添加属性源
    pub fn with_source<P: PropertySource + 'static>(mut self, source: P) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// 属性源数量
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 按查询顺序列出属性源名称
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl std::fmt::Debug for LayeredPropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredPropertySource")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl PropertySource for LayeredPropertySource {
    fn get(&self, key: &str) -> Option<String> {
        for source in &self.sources {
            if let Some(value) = source.get(key) {
                debug!("属性 {} 由 {} 提供", key, source.name());
                return Some(value);
            }
        }
        None
    }

    fn name(&self) -> &str {
        "LayeredPropertySource"
    }

    fn priority(&self) -> i32 {
        self.sources.first().map_or(0, |s| s.priority())
    }
}
