//! 供应商切换服务模块
//!
//! 组合配置存储、Shell 配置文件和备份管理，完成供应商切换和当前供应商识别。

use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

use crate::backup::BackupManager;
use crate::error::AppError;
use crate::provider::BASE_URL_VAR;
use crate::rcfile::{self, RcFile};
use crate::store::ConfigStore;

/// 当前供应商识别结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum CurrentProvider {
    /// 匹配到已配置的供应商
    Provider(String),
    /// 设置了 Base URL，但不属于任何已配置的供应商
    Unknown,
    /// 未配置
    NotConfigured,
}

impl CurrentProvider {
    /// 匹配到的供应商 ID
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Provider(id) => Some(id),
            _ => None,
        }
    }
}

/// 切换结果
#[derive(Debug, Clone, Serialize)]
pub struct SwitchOutcome {
    pub provider_id: String,
    pub provider_name: String,
    pub rc_file: PathBuf,
    /// 修改前的备份，文件原本不存在或内容未变化时为 `None`
    pub backup: Option<PathBuf>,
    /// 文件内容是否发生变化
    pub changed: bool,
    pub exports: IndexMap<String, String>,
}

/// 预览结果（不写入文件）
#[derive(Debug, Clone, Serialize)]
pub struct SwitchPreview {
    pub provider_id: String,
    pub rc_file: PathBuf,
    pub block: String,
    pub content: String,
    pub changed: bool,
}

/// 供应商切换服务
pub struct SwitchService;

impl SwitchService {
    /// 切换到指定供应商
    ///
    /// 先在内存中生成新内容，确认可以写入后再备份原文件并写回。
    pub fn switch(
        store: &ConfigStore,
        rc: &RcFile,
        backups: &BackupManager,
        id: &str,
    ) -> Result<SwitchOutcome, AppError> {
        let provider = store.require(id)?;
        provider.validate(id)?;

        let exports = provider.exports();
        let original = rc.read()?;
        let updated = rcfile::apply(&original, &exports)?;
        let changed = updated != original;

        let backup = if changed {
            let backup = backups.backup(rc.path())?;
            rc.write(&updated)?;
            log::info!("已将 {} 切换到供应商 {id}", rc.path().display());
            backup
        } else {
            log::info!("{} 已是供应商 {id} 的配置，无需修改", rc.path().display());
            None
        };

        Ok(SwitchOutcome {
            provider_id: id.to_string(),
            provider_name: provider.display_name(id).to_string(),
            rc_file: rc.path().to_path_buf(),
            backup,
            changed,
            exports,
        })
    }

    /// 预览切换后的文件内容
    pub fn preview(store: &ConfigStore, rc: &RcFile, id: &str) -> Result<SwitchPreview, AppError> {
        let provider = store.require(id)?;
        provider.validate(id)?;

        let exports = provider.exports();
        let original = rc.read()?;
        let content = rcfile::apply(&original, &exports)?;

        Ok(SwitchPreview {
            provider_id: id.to_string(),
            rc_file: rc.path().to_path_buf(),
            block: rcfile::render_block(&exports),
            changed: content != original,
            content,
        })
    }

    /// 读取 Shell 配置文件并识别当前供应商
    pub fn current(store: &ConfigStore, rc: &RcFile) -> Result<CurrentProvider, AppError> {
        let content = rc.read()?;
        Ok(Self::detect_current(store, &content))
    }

    /// 根据文件内容识别当前供应商
    ///
    /// 有标记块时只看块内的变量，否则看整个文件。
    /// 先按 Base URL 完全匹配，再按主机名包含匹配，按配置顺序取第一个。
    pub fn detect_current(store: &ConfigStore, content: &str) -> CurrentProvider {
        if content.trim().is_empty() {
            return CurrentProvider::NotConfigured;
        }

        let block = rcfile::extract_exports(content);
        let scope = match &block {
            Some(exports) => exports
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("\n"),
            None => content.to_string(),
        };

        if let Some(url) = block.as_ref().and_then(|b| b.get(BASE_URL_VAR)) {
            let url = unquote(url);
            let exact = store
                .list()
                .iter()
                .find(|(_, p)| p.effective_base_url().as_deref() == Some(url));
            if let Some((id, _)) = exact {
                return CurrentProvider::Provider(id.clone());
            }
        }

        for (id, provider) in store.list() {
            if let Some(host) = provider.base_url_host() {
                if scope.contains(&host) {
                    return CurrentProvider::Provider(id.clone());
                }
            }
        }

        if scope.contains(BASE_URL_VAR) {
            CurrentProvider::Unknown
        } else {
            CurrentProvider::NotConfigured
        }
    }
}

fn unquote(value: &str) -> &str {
    let v = value.trim();
    v.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| v.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(v)
}
