//! backup 命令实现

use anyhow::Result;
use ccswap_core::{AppPaths, BackupManager};

use crate::output::{print_info, print_rows, print_success, BackupRow, OutputContext};

/// 列出备份
pub fn list(ctx: &OutputContext, paths: &AppPaths) -> Result<()> {
    let manager = BackupManager::new(&paths.backup_dir);
    let rows: Vec<BackupRow> = manager
        .list()?
        .into_iter()
        .map(|entry| BackupRow {
            file: entry.path.display().to_string(),
            time: entry
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            size: format!("{} B", entry.size),
        })
        .collect();

    print_rows(ctx, rows, "没有备份")
}

/// 立即备份
pub fn create(_ctx: &OutputContext, paths: &AppPaths) -> Result<()> {
    let manager = BackupManager::new(&paths.backup_dir);
    match manager.backup(&paths.rc_file)? {
        Some(path) => print_success(&format!("已备份到: {}", path.display())),
        None => print_info(&format!(
            "{} 不存在，无需备份",
            paths.rc_file.display()
        )),
    }
    Ok(())
}
