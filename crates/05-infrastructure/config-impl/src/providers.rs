//! 属性源实现

use config_abstractions::PropertySource;
use infrastructure_common::{ConfigError, ConfigResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 内存属性源
#[derive(Debug, Clone, Default)]
pub struct MapPropertySource {
    name: String,
    properties: BTreeMap<String, String>,
    priority: i32,
}

impl MapPropertySource {
    /// 创建新的内存属性源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            priority: 0,
        }
    }

    /// 添加属性
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 插入属性
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// 属性数量
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapPropertySource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new("MapPropertySource");
        for (key, value) in iter {
            source.insert(key, value);
        }
        source
    }
}

impl PropertySource for MapPropertySource {
    fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// TOML 属性源
///
/// 嵌套表被展开为以点分隔的键，例如 `[server] port = 8080` 对应 `server.port`。
#[derive(Debug)]
pub struct TomlPropertySource {
    file_path: Option<PathBuf>,
    properties: BTreeMap<String, String>,
    priority: i32,
}

impl TomlPropertySource {
    /// 从文件加载
    pub fn new<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file_path = path.as_ref().to_path_buf();
        debug!("加载 TOML 配置文件: {}", file_path.display());
        let content = read_file(&file_path)?;
        let mut source = Self::from_str(&content)?;
        source.file_path = Some(file_path);
        Ok(source)
    }

    /// 从字符串解析
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let table: toml::Table = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            source: Box::new(e),
        })?;

        let mut properties = BTreeMap::new();
        flatten_toml(&table, "", &mut properties);
        debug!("TOML 配置加载完成，共 {} 个属性", properties.len());

        Ok(Self {
            file_path: None,
            properties,
            priority: 100,
        })
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 配置文件路径
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// 所有属性键
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

impl PropertySource for TomlPropertySource {
    fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn name(&self) -> &str {
        "TomlPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// JSON 属性源
#[derive(Debug)]
pub struct JsonPropertySource {
    file_path: Option<PathBuf>,
    properties: BTreeMap<String, String>,
    priority: i32,
}

impl JsonPropertySource {
    /// 从文件加载
    pub fn new<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file_path = path.as_ref().to_path_buf();
        debug!("加载 JSON 配置文件: {}", file_path.display());
        let content = read_file(&file_path)?;
        let mut source = Self::from_str(&content)?;
        source.file_path = Some(file_path);
        Ok(source)
    }

    /// 从字符串解析
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(root) = value else {
            return Err(ConfigError::TypeConversionError {
                message: "JSON 配置的根节点必须是对象".to_string(),
            });
        };

        let mut properties = BTreeMap::new();
        flatten_json(&root, "", &mut properties);
        debug!("JSON 配置加载完成，共 {} 个属性", properties.len());

        Ok(Self {
            file_path: None,
            properties,
            priority: 90,
        })
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 配置文件路径
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}

impl PropertySource for JsonPropertySource {
    fn get(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn name(&self) -> &str {
        "JsonPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 环境变量属性源
///
/// `APP_SERVER_PORT`（前缀 `APP`，分隔符 `_`）对应属性键 `server.port`。
#[derive(Debug)]
pub struct EnvironmentPropertySource {
    prefix: String,
    separator: String,
    priority: i32,
    env_vars: BTreeMap<String, String>,
}

impl EnvironmentPropertySource {
    /// 从当前进程环境变量创建
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_vars(prefix, "_", std::env::vars())
    }

    /// 使用自定义分隔符从当前进程环境变量创建
    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::from_vars(prefix, separator, std::env::vars())
    }

    /// 从给定的变量集合创建
    pub fn from_vars<I, K, V>(prefix: impl Into<String>, separator: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut source = Self {
            prefix: prefix.into(),
            separator: separator.into(),
            priority: 200,
            env_vars: BTreeMap::new(),
        };

        debug!("加载环境变量，前缀: {}", source.prefix);
        for (key, value) in vars {
            if let Some(config_key) = source.env_key_to_config_key(key.as_ref()) {
                source.env_vars.insert(config_key, value.into());
            }
        }
        debug!("加载了 {} 个环境变量", source.env_vars.len());

        source
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 环境变量前缀
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 将环境变量键转换为属性键
    fn env_key_to_config_key(&self, env_key: &str) -> Option<String> {
        let rest = env_key.strip_prefix(&self.prefix)?;
        let rest = rest.strip_prefix(self.separator.as_str())?;
        if rest.is_empty() {
            return None;
        }
        Some(rest.replace(&self.separator, ".").to_lowercase())
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn get(&self, key: &str) -> Option<String> {
        self.env_vars.get(key).cloned()
    }

    fn name(&self) -> &str {
        "EnvironmentPropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 基于 `config` crate 的属性源
pub struct ConfigCratePropertySource {
    config: config::Config,
    priority: i32,
}

impl ConfigCratePropertySource {
    /// 包装已经构建好的配置
    pub fn new(config: config::Config) -> Self {
        Self {
            config,
            priority: 50,
        }
    }

    /// 从配置文件构建，格式由扩展名决定
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;
        Ok(Self::new(config))
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl std::fmt::Debug for ConfigCratePropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCratePropertySource")
            .field("priority", &self.priority)
            .finish()
    }
}

impl PropertySource for ConfigCratePropertySource {
    fn get(&self, key: &str) -> Option<String> {
        self.config.get_string(key).ok()
    }

    fn name(&self) -> &str {
        "ConfigCratePropertySource"
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

fn read_file(path: &Path) -> ConfigResult<String> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// 递归展开 TOML 表
fn flatten_toml(table: &toml::Table, prefix: &str, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = join_key(prefix, key);
        match value {
            toml::Value::Table(nested) => flatten_toml(nested, &full_key, out),
            other => {
                out.insert(full_key, render_toml(other));
            }
        }
    }
}

fn render_toml(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => items.iter().map(render_toml).collect::<Vec<_>>().join(","),
        toml::Value::Table(table) => toml::to_string(table).unwrap_or_default(),
    }
}

/// 递归展开 JSON 对象，`null` 值被忽略
fn flatten_json(
    object: &serde_json::Map<String, Value>,
    prefix: &str,
    out: &mut BTreeMap<String, String>,
) {
    for (key, value) in object {
        let full_key = join_key(prefix, key);
        match value {
            Value::Object(nested) => flatten_json(nested, &full_key, out),
            Value::Null => {}
            other => {
                out.insert(full_key, render_json(other));
            }
        }
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_json).collect::<Vec<_>>().join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toml_nested_tables_are_flattened() {
        let source = TomlPropertySource::from_str(
            r#"
            name = "demo"

            [server]
            port = 8080
            debug = true
            hosts = ["a", "b"]

            [server.tls]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(source.get("name").as_deref(), Some("demo"));
        assert_eq!(source.get("server.port").as_deref(), Some("8080"));
        assert_eq!(source.get("server.debug").as_deref(), Some("true"));
        assert_eq!(source.get("server.hosts").as_deref(), Some("a,b"));
        assert_eq!(source.get("server.tls.enabled").as_deref(), Some("false"));
        assert!(source.get("server").is_none());
        assert_eq!(source.priority(), 100);
    }

    #[test]
    fn test_toml_parse_error() {
        let err = TomlPropertySource::from_str("server = [").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_toml_file_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pool]\nsize = 16").unwrap();

        let source = TomlPropertySource::new(file.path()).unwrap();
        assert_eq!(source.get("pool.size").as_deref(), Some("16"));
        assert_eq!(source.file_path(), Some(file.path()));
        assert_eq!(source.keys().collect::<Vec<_>>(), vec!["pool.size"]);
    }

    #[test]
    fn test_missing_file() {
        let err = TomlPropertySource::new("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_json_source() {
        let source = JsonPropertySource::from_str(
            r#"{"database": {"host": "localhost", "port": 5432, "replica": null}, "tags": [1, 2]}"#,
        )
        .unwrap();

        assert_eq!(source.get("database.host").as_deref(), Some("localhost"));
        assert_eq!(source.get("database.port").as_deref(), Some("5432"));
        assert!(source.get("database.replica").is_none());
        assert_eq!(source.get("tags").as_deref(), Some("1,2"));

        let err = JsonPropertySource::from_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::TypeConversionError { .. }));
    }

    #[test]
    fn test_environment_source_key_mapping() {
        let source = EnvironmentPropertySource::from_vars(
            "APP",
            "_",
            vec![
                ("APP_SERVER_PORT", "9090"),
                ("APP_NAME", "demo"),
                ("APPLICATION_NAME", "ignored"),
                ("OTHER_SERVER_PORT", "1"),
            ],
        );

        assert_eq!(source.get("server.port").as_deref(), Some("9090"));
        assert_eq!(source.get("name").as_deref(), Some("demo"));
        assert!(source.get("lication.name").is_none());
        assert_eq!(source.prefix(), "APP");
        assert_eq!(source.priority(), 200);
    }

    #[test]
    fn test_config_crate_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cache]\nttl = 30\nname = \"hot\"").unwrap();

        let source = ConfigCratePropertySource::from_file(file.path()).unwrap();
        assert_eq!(source.get("cache.ttl").as_deref(), Some("30"));
        assert_eq!(source.get("cache.name").as_deref(), Some("hot"));
        assert!(source.get("cache.missing").is_none());
    }

    #[test]
    fn test_map_source_from_iter() {
        let source: MapPropertySource = vec![("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(source.len(), 2);
        assert_eq!(source.get("b").as_deref(), Some("2"));
        assert_eq!(source.name(), "MapPropertySource");
    }
}
