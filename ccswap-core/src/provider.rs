//! 供应商数据结构模块
//!
//! 定义供应商连接参数、内置默认供应商，以及写入 Shell 配置文件的环境变量生成规则。

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Base URL 对应的环境变量
pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";

/// 默认的 API Key 环境变量
pub const DEFAULT_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// 第三方中转站供应商 ID
pub const THIRD_PARTY_ID: &str = "third_party";

/// DeepSeek 供应商 ID
pub const DEEPSEEK_ID: &str = "deepseek";

static ENV_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env key pattern is valid")
});

fn default_key_var() -> String {
    DEFAULT_KEY_VAR.to_string()
}

/// 供应商 ID -> 供应商（保持插入顺序）
pub type ProviderMap = IndexMap<String, Provider>;

/// 供应商结构体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// 显示名称
    #[serde(default)]
    pub name: String,
    /// 写入 `ANTHROPIC_BASE_URL` 的地址，为空时不写入
    #[serde(default)]
    pub base_url: String,
    /// API Key，写入 `key_var` 指定的变量
    #[serde(default)]
    pub api_key: String,
    /// 接收 API Key 的环境变量名
    #[serde(default = "default_key_var")]
    pub key_var: String,
    /// 附加环境变量（按顺序原样导出）
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env_vars: IndexMap<String, String>,
    /// 未识别的字段，保存时原样写回
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Provider {
    /// 创建新供应商
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: String::new(),
            key_var: default_key_var(),
            env_vars: IndexMap::new(),
            extra: Map::new(),
        }
    }

    /// 设置接收 API Key 的环境变量
    pub fn with_key_var(mut self, key_var: impl Into<String>) -> Self {
        self.key_var = key_var.into();
        self
    }

    /// 追加一个附加环境变量
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// 显示名称，未设置时回退到 ID
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        if self.name.trim().is_empty() {
            id
        } else {
            &self.name
        }
    }

    /// 实际写入的 API Key，附加变量中同名的设置优先
    pub fn effective_api_key(&self) -> &str {
        self.env_vars
            .get(&self.key_var)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.api_key.trim())
    }

    /// 是否已配置 API Key（直接填写或由附加变量提供）
    pub fn has_api_key(&self) -> bool {
        !self.effective_api_key().is_empty()
    }

    /// 实际写入 `ANTHROPIC_BASE_URL` 的地址
    ///
    /// 附加变量中同名的设置优先于 `base_url`。
    pub fn effective_base_url(&self) -> Option<String> {
        self.env_vars
            .get(BASE_URL_VAR)
            .map(|v| v.trim())
            .or_else(|| Some(self.base_url.trim()))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Base URL 的主机名，用于识别当前供应商
    ///
    /// 无法解析出主机名时返回去除空白后的原始字符串。
    pub fn base_url_host(&self) -> Option<String> {
        let raw = self.effective_base_url()?;
        let host = url::Url::parse(&raw)
            .ok()
            .and_then(|parsed| parsed.host_str().map(|h| h.to_string()));
        Some(host.unwrap_or(raw))
    }

    /// 生成写入 Shell 配置文件的环境变量（有序）
    ///
    /// 顺序：`ANTHROPIC_BASE_URL`、API Key、附加变量。
    /// 附加变量与前面同名时原位覆盖。
    pub fn exports(&self) -> IndexMap<String, String> {
        let mut vars = IndexMap::new();
        if !self.base_url.trim().is_empty() {
            vars.insert(BASE_URL_VAR.to_string(), self.base_url.trim().to_string());
        }
        if !self.api_key.trim().is_empty() {
            vars.insert(self.key_var.clone(), self.api_key.trim().to_string());
        }
        for (key, value) in &self.env_vars {
            vars.insert(key.clone(), value.clone());
        }
        vars
    }

    /// 校验供应商能否写入 Shell 配置文件
    pub fn validate(&self, id: &str) -> Result<(), AppError> {
        validate_env_key(&self.key_var)?;

        if !self.has_api_key() {
            return Err(AppError::MissingApiKey(self.display_name(id).to_string()));
        }

        for (key, value) in self.exports() {
            validate_env_key(&key)?;
            if value.contains('\n') || value.contains('\r') {
                return Err(AppError::InvalidInput(format!(
                    "环境变量 {key} 的值不能包含换行"
                )));
            }
        }

        Ok(())
    }
}

/// 校验环境变量名
pub fn validate_env_key(key: &str) -> Result<(), AppError> {
    if ENV_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!("无效的环境变量名: {key:?}")))
    }
}

/// 解析 `KEY=VALUE` 形式的参数
pub fn parse_env_assignment(raw: &str) -> Result<(String, String), AppError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AppError::InvalidInput(format!("应为 KEY=VALUE 格式: {raw}")))?;
    let key = key.trim();
    validate_env_key(key)?;
    Ok((key.to_string(), value.to_string()))
}

/// 内置默认供应商
pub fn default_providers() -> ProviderMap {
    let mut providers = ProviderMap::new();
    providers.insert(
        THIRD_PARTY_ID.to_string(),
        Provider::new(
            "第三方 Claude 中转站",
            "https://api.aicodemirror.com/api/claudecode",
        ),
    );
    providers.insert(
        DEEPSEEK_ID.to_string(),
        Provider::new("DeepSeek", "https://api.deepseek.com/anthropic")
            .with_key_var("DEEPSEEK_API_KEY")
            .with_env("ANTHROPIC_AUTH_TOKEN", "${DEEPSEEK_API_KEY}")
            .with_env("API_TIMEOUT_MS", "600000")
            .with_env("ANTHROPIC_MODEL", "deepseek-chat")
            .with_env("ANTHROPIC_SMALL_FAST_MODEL", "deepseek-chat")
            .with_env("CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC", "1"),
    );
    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deepseek_exports_order() {
        let mut provider = default_providers()[DEEPSEEK_ID].clone();
        provider.api_key = "sk-deep".to_string();

        let keys: Vec<_> = provider.exports().into_keys().collect();
        assert_eq!(
            keys,
            vec![
                "ANTHROPIC_BASE_URL",
                "DEEPSEEK_API_KEY",
                "ANTHROPIC_AUTH_TOKEN",
                "API_TIMEOUT_MS",
                "ANTHROPIC_MODEL",
                "ANTHROPIC_SMALL_FAST_MODEL",
                "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC",
            ]
        );
        assert_eq!(provider.exports()["ANTHROPIC_AUTH_TOKEN"], "${DEEPSEEK_API_KEY}");
    }

    #[test]
    fn test_env_override_keeps_position() {
        let mut provider = Provider::new("Relay", "https://relay.example.com")
            .with_env("ANTHROPIC_BASE_URL", "https://other.example.com");
        provider.api_key = "k".to_string();

        let exports = provider.exports();
        assert_eq!(exports.get_index(0).unwrap().1, "https://other.example.com");
        assert_eq!(exports.len(), 2);
    }

    #[test]
    fn test_validate_requires_key() {
        let provider = default_providers()[THIRD_PARTY_ID].clone();
        assert!(matches!(
            provider.validate(THIRD_PARTY_ID),
            Err(AppError::MissingApiKey(_))
        ));

        let provider = Provider::new("Env", "").with_env(DEFAULT_KEY_VAR, "sk-from-env");
        assert!(provider.validate("env").is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut provider = Provider::new("Bad", "https://x.example.com");
        provider.api_key = "k".to_string();
        provider.env_vars.insert("MODEL".to_string(), "a\nb".to_string());
        assert!(matches!(provider.validate("bad"), Err(AppError::InvalidInput(_))));

        let mut provider = Provider::new("Bad", "https://x.example.com");
        provider.api_key = "k".to_string();
        provider.env_vars.insert("1BAD".to_string(), "v".to_string());
        assert!(matches!(provider.validate("bad"), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_base_url_host() {
        let provider = Provider::new("DS", "https://api.deepseek.com/anthropic");
        assert_eq!(provider.base_url_host().as_deref(), Some("api.deepseek.com"));

        let provider = Provider::new("Raw", "relay.local:8080");
        assert_eq!(provider.base_url_host().as_deref(), Some("relay.local:8080"));

        assert!(Provider::new("Empty", "").base_url_host().is_none());

        // 附加变量中的 Base URL 优先
        let provider =
            Provider::new("Relay", "").with_env(BASE_URL_VAR, "https://relay.example.com/v1");
        assert_eq!(
            provider.effective_base_url().as_deref(),
            Some("https://relay.example.com/v1")
        );
        assert_eq!(provider.base_url_host().as_deref(), Some("relay.example.com"));
    }

    #[test]
    fn test_parse_env_assignment() {
        assert_eq!(
            parse_env_assignment("API_TIMEOUT_MS=600000").unwrap(),
            ("API_TIMEOUT_MS".to_string(), "600000".to_string())
        );
        assert_eq!(parse_env_assignment("A=b=c").unwrap().1, "b=c");
        assert!(parse_env_assignment("novalue").is_err());
        assert!(parse_env_assignment("bad-key=1").is_err());
    }

    #[test]
    fn test_unknown_fields_roundtrip() {
        let value = json!({"name": "X", "note": "keep me"});
        let provider: Provider = serde_json::from_value(value).unwrap();
        assert_eq!(provider.key_var, DEFAULT_KEY_VAR);
        assert_eq!(provider.extra["note"], "keep me");

        let back = serde_json::to_value(&provider).unwrap();
        assert_eq!(back["note"], "keep me");
    }
}
