//! 属性源抽象接口

use infrastructure_common::{ConfigError, ConfigResult};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

/// 属性源 trait
///
/// 容器只依赖这个最小接口：按键读取字符串值。属性的加载方式（文件、环境变量等）
/// 由具体实现决定。
pub trait PropertySource: Send + Sync {
    /// 获取属性值
    fn get(&self, key: &str) -> Option<String>;

    /// 获取属性源名称
    fn name(&self) -> &str;

    /// 获取属性源优先级，数值越高越优先
    fn priority(&self) -> i32 {
        0
    }

    /// 检查属性键是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// 获取必需的属性值
    fn get_required(&self, key: &str) -> ConfigResult<String> {
        self.get(key).ok_or_else(|| ConfigError::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// 获取属性值并转换为指定类型
    fn get_parsed<T>(&self, key: &str) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
        Self: Sized,
    {
        let raw = self.get_required(key)?;
        raw.parse::<T>()
            .map_err(|e| ConfigError::TypeConversionError {
                message: format!("{} = {:?}: {}", key, raw, e),
            })
    }
}

/// 空属性源
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPropertySource;

impl PropertySource for EmptyPropertySource {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn name(&self) -> &str {
        "EmptyPropertySource"
    }
}

impl PropertySource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn name(&self) -> &str {
        "HashMap"
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }

    fn name(&self) -> &str {
        "BTreeMap"
    }
}

impl<P: PropertySource + ?Sized> PropertySource for Arc<P> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn priority(&self) -> i32 {
        (**self).priority()
    }
}

impl<P: PropertySource + ?Sized> PropertySource for Box<P> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn priority(&self) -> i32 {
        (**self).priority()
    }
}
