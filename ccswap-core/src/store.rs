//! 供应商配置存储模块
//!
//! 从 JSON 文件加载供应商配置，并为缺失的供应商和字段补全默认值。

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::write_json_file;
use crate::error::AppError;
use crate::provider::{default_providers, Provider, ProviderMap};

/// 供应商配置存储
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    providers: ProviderMap,
}

impl ConfigStore {
    /// 加载配置文件
    ///
    /// 文件不存在时使用默认配置；文件存在时按字段补全默认值。
    /// JSON 格式错误时返回错误，不会覆盖原文件。
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if !path.exists() {
            log::debug!("配置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self {
                path,
                providers: default_providers(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| AppError::io(&path, e))?;
        let providers = parse_providers(&content).map_err(|e| match e {
            ParseError::Json(source) => AppError::json(&path, source),
            ParseError::Shape(msg) => AppError::Config(format!("{}: {msg}", path.display())),
        })?;

        Ok(Self { path, providers })
    }

    /// 使用默认配置创建（不读取文件）
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            providers: default_providers(),
        }
    }

    /// 配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存配置文件
    pub fn save(&self) -> Result<(), AppError> {
        write_json_file(&self.path, &self.providers)?;
        log::info!("已保存供应商配置: {}", self.path.display());
        Ok(())
    }

    /// 重置为默认配置并保存
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.providers = default_providers();
        self.save()
    }

    /// 从另一个 JSON 文件导入全部配置并保存
    pub fn import(&mut self, source: &Path) -> Result<usize, AppError> {
        let content = fs::read_to_string(source).map_err(|e| AppError::io(source, e))?;
        let providers = parse_providers(&content).map_err(|e| match e {
            ParseError::Json(err) => AppError::json(source, err),
            ParseError::Shape(msg) => AppError::Config(format!("{}: {msg}", source.display())),
        })?;

        self.providers = providers;
        self.save()?;
        Ok(self.providers.len())
    }

    /// 所有供应商（保持配置文件中的顺序）
    pub fn list(&self) -> &ProviderMap {
        &self.providers
    }

    /// 获取指定供应商
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    /// 获取指定供应商，不存在时报错
    pub fn require(&self, id: &str) -> Result<&Provider, AppError> {
        self.get(id)
            .ok_or_else(|| AppError::ProviderNotFound(id.to_string()))
    }

    /// 添加或替换供应商
    pub fn upsert(&mut self, id: impl Into<String>, provider: Provider) {
        self.providers.insert(id.into(), provider);
    }

    /// 更新供应商的部分字段，ID 不存在时新建
    pub fn set_fields(
        &mut self,
        id: &str,
        name: Option<String>,
        base_url: Option<String>,
        api_key: Option<String>,
        key_var: Option<String>,
    ) -> Result<&Provider, AppError> {
        if let Some(var) = &key_var {
            crate::provider::validate_env_key(var)?;
        }

        let provider = self
            .providers
            .entry(id.to_string())
            .or_insert_with(|| Provider::new(id, ""));

        if let Some(v) = name {
            provider.name = v;
        }
        if let Some(v) = base_url {
            provider.base_url = v.trim().to_string();
        }
        if let Some(v) = api_key {
            provider.api_key = v.trim().to_string();
        }
        if let Some(v) = key_var {
            provider.key_var = v;
        }

        Ok(&*provider)
    }

    /// 设置附加环境变量
    pub fn set_env(&mut self, id: &str, key: &str, value: &str) -> Result<(), AppError> {
        crate::provider::validate_env_key(key)?;
        let provider = self
            .providers
            .get_mut(id)
            .ok_or_else(|| AppError::ProviderNotFound(id.to_string()))?;
        provider.env_vars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// 删除附加环境变量，返回是否存在
    pub fn unset_env(&mut self, id: &str, key: &str) -> Result<bool, AppError> {
        let provider = self
            .providers
            .get_mut(id)
            .ok_or_else(|| AppError::ProviderNotFound(id.to_string()))?;
        Ok(provider.env_vars.shift_remove(key).is_some())
    }

    /// 是否为内置供应商（加载时总会补回）
    pub fn is_builtin(id: &str) -> bool {
        default_providers().contains_key(id)
    }

    /// 删除供应商
    ///
    /// 内置供应商不能删除，加载时会按默认值补回。
    pub fn remove(&mut self, id: &str) -> Result<Provider, AppError> {
        if Self::is_builtin(id) {
            return Err(AppError::InvalidInput(format!(
                "内置供应商 {id} 不能删除，可以用 ccswap set 修改它的配置"
            )));
        }
        self.providers
            .shift_remove(id)
            .ok_or_else(|| AppError::ProviderNotFound(id.to_string()))
    }
}

enum ParseError {
    Json(serde_json::Error),
    Shape(String),
}

/// 解析配置内容并补全默认值
fn parse_providers(content: &str) -> Result<ProviderMap, ParseError> {
    let mut loaded: Value = serde_json::from_str(content).map_err(ParseError::Json)?;
    let obj = loaded
        .as_object_mut()
        .ok_or_else(|| ParseError::Shape("配置文件顶层应为 JSON 对象".to_string()))?;

    merge_defaults(obj).map_err(ParseError::Json)?;

    serde_json::from_value(loaded).map_err(ParseError::Json)
}

/// 按供应商、按字段补全默认值
fn merge_defaults(loaded: &mut Map<String, Value>) -> Result<(), serde_json::Error> {
    for (id, provider) in default_providers() {
        let default_value = serde_json::to_value(&provider)?;
        match loaded.get_mut(&id) {
            None => {
                loaded.insert(id, default_value);
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(defaults) = default_value {
                    for (key, value) in defaults {
                        existing.entry(key).or_insert(value);
                    }
                }
            }
            Some(_) => {
                log::warn!("供应商 {id} 的配置不是对象，已替换为默认值");
                loaded.insert(id, default_value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{DEEPSEEK_ID, THIRD_PARTY_ID};
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_uses_defaults() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("config.json")).unwrap();
        assert_eq!(store.list().len(), 2);
        assert!(store.get(THIRD_PARTY_ID).is_some());
        assert!(store.get(DEEPSEEK_ID).is_some());
        // 仅加载不写文件
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_load_merges_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
  "deepseek": { "api_key": "sk-deep" },
  "custom": { "name": "Mine", "base_url": "https://mine.example.com", "api_key": "k" }
}"#,
        )
        .unwrap();

        let store = ConfigStore::load(&path).unwrap();
        let ds = store.get(DEEPSEEK_ID).unwrap();
        assert_eq!(ds.api_key, "sk-deep");
        assert_eq!(ds.base_url, "https://api.deepseek.com/anthropic");
        assert_eq!(ds.key_var, "DEEPSEEK_API_KEY");
        assert_eq!(ds.env_vars["ANTHROPIC_MODEL"], "deepseek-chat");

        // 缺失的默认供应商被补上，自定义供应商保留
        assert!(store.get(THIRD_PARTY_ID).is_some());
        assert_eq!(store.get("custom").unwrap().name, "Mine");
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn test_load_does_not_override_user_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"third_party": {"base_url": "https://relay.example.com", "api_key": "abc"}}"#,
        )
        .unwrap();

        let store = ConfigStore::load(&path).unwrap();
        let tp = store.get(THIRD_PARTY_ID).unwrap();
        assert_eq!(tp.base_url, "https://relay.example.com");
        assert_eq!(tp.api_key, "abc");
        assert_eq!(tp.name, "第三方 Claude 中转站");
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ConfigStore::load(&path), Err(AppError::Json { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");

        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(ConfigStore::load(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");

        let mut store = ConfigStore::load(&path).unwrap();
        store
            .set_fields(DEEPSEEK_ID, None, None, Some(" sk-1 ".to_string()), None)
            .unwrap();
        store.set_env(DEEPSEEK_ID, "EXTRA_FLAG", "on").unwrap();
        store.save().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("第三方 Claude 中转站"));
        assert!(raw.contains("  \"deepseek\""));

        let reloaded = ConfigStore::load(&path).unwrap();
        let ds = reloaded.get(DEEPSEEK_ID).unwrap();
        assert_eq!(ds.api_key, "sk-1");
        assert_eq!(ds.env_vars.last().unwrap(), (&"EXTRA_FLAG".to_string(), &"on".to_string()));
    }

    #[test]
    fn test_set_fields_creates_provider() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::with_defaults(dir.path().join("c.json"));
        let p = store
            .set_fields(
                "relay",
                None,
                Some("https://relay.example.com".to_string()),
                Some("k".to_string()),
                None,
            )
            .unwrap()
            .clone();
        assert_eq!(p.name, "relay");
        assert_eq!(store.list().get_index_of("relay"), Some(2));

        assert!(store
            .set_fields("relay", None, None, None, Some("bad var".to_string()))
            .is_err());
    }

    #[test]
    fn test_env_and_remove() {
        let dir = tempdir().unwrap();
        let mut store = ConfigStore::with_defaults(dir.path().join("c.json"));

        assert!(store.unset_env(DEEPSEEK_ID, "API_TIMEOUT_MS").unwrap());
        assert!(!store.unset_env(DEEPSEEK_ID, "API_TIMEOUT_MS").unwrap());
        assert!(matches!(
            store.set_env("ghost", "A", "b"),
            Err(AppError::ProviderNotFound(_))
        ));

        store.upsert("work", Provider::new("Work", "https://w.example.com"));
        store.remove("work").unwrap();
        assert!(matches!(store.remove("work"), Err(AppError::ProviderNotFound(_))));
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_builtin_provider_cannot_be_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut store = ConfigStore::with_defaults(&path);

        assert!(matches!(store.remove(DEEPSEEK_ID), Err(AppError::InvalidInput(_))));
        store.save().unwrap();
        assert!(ConfigStore::load(&path).unwrap().get(DEEPSEEK_ID).is_some());

        store.upsert("work", Provider::new("Work", "https://w.example.com"));
        store.remove("work").unwrap();
        store.save().unwrap();
        assert!(ConfigStore::load(&path).unwrap().get("work").is_none());
    }

    #[test]
    fn test_reset_and_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut store = ConfigStore::with_defaults(&path);
        store
            .set_fields(DEEPSEEK_ID, None, None, Some("sk-old".to_string()), None)
            .unwrap();
        store.reset().unwrap();
        assert_eq!(store.get(DEEPSEEK_ID).unwrap().api_key, "");
        assert_eq!(store.list().len(), 2);
        assert!(path.exists());

        let src = dir.path().join("import.json");
        fs::write(&src, r#"{"work": {"name": "Work", "base_url": "https://w.example.com"}}"#)
            .unwrap();
        let count = store.import(&src).unwrap();
        assert_eq!(count, 3);
        assert!(ConfigStore::load(&path).unwrap().get("work").is_some());
    }
}
