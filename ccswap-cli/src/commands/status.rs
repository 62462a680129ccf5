//! status 命令实现

use anyhow::Result;
use ccswap_core::{AppPaths, BackupManager, ConfigStore, CurrentProvider, RcFile, SwitchService};
use colored::Colorize;
use serde::Serialize;

use crate::output::{print_rows, print_value, KeyValueRow, OutputContext};

/// 状态报告（JSON / YAML 输出）
#[derive(Serialize)]
struct StatusReport {
    current: CurrentProvider,
    provider_name: Option<String>,
    rc_file: String,
    config_file: String,
    backup_dir: String,
    latest_backup: Option<String>,
}

/// 执行 status 命令
pub fn show_status(ctx: &OutputContext, paths: &AppPaths) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let rc = RcFile::new(&paths.rc_file);
    let current = SwitchService::current(&store, &rc)?;
    let latest = BackupManager::new(&paths.backup_dir).latest()?;

    let provider_name = current
        .id()
        .and_then(|id| store.get(id).map(|p| p.display_name(id).to_string()));

    if !ctx.is_table() {
        let report = StatusReport {
            current,
            provider_name,
            rc_file: paths.rc_file.display().to_string(),
            config_file: paths.config_file.display().to_string(),
            backup_dir: paths.backup_dir.display().to_string(),
            latest_backup: latest.map(|b| b.path.display().to_string()),
        };
        return print_value(ctx, &report);
    }

    let current_label = match (&current, &provider_name) {
        (CurrentProvider::Provider(id), Some(name)) => {
            format!("{} ({})", name, id).green().bold().to_string()
        }
        (CurrentProvider::Provider(id), None) => id.green().bold().to_string(),
        (CurrentProvider::Unknown, _) => "未知".yellow().bold().to_string(),
        (CurrentProvider::NotConfigured, _) => "未配置".dimmed().to_string(),
    };

    let rc_label = if rc.exists() {
        paths.rc_file.display().to_string()
    } else {
        format!("{} (不存在)", paths.rc_file.display())
    };

    let rows = vec![
        KeyValueRow::new("当前供应商", current_label),
        KeyValueRow::new("Shell 配置文件", rc_label),
        KeyValueRow::new("供应商配置", paths.config_file.display().to_string()),
        KeyValueRow::new(
            "最近备份",
            latest
                .map(|b| b.file_name)
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];

    print_rows(ctx, rows, "")
}
