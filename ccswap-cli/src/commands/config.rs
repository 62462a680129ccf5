//! config 命令实现

use anyhow::Result;
use ccswap_core::{AppPaths, ConfigStore, ProviderMap};
use std::path::Path;

use crate::cli::ConfigAction;
use crate::output::{
    confirm, mask_provider, print_info, print_rows, print_success, print_value, OutputContext,
    PathRow,
};

/// 执行 config 子命令
pub fn execute(ctx: &OutputContext, paths: &AppPaths, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => show_paths(ctx, paths),
        ConfigAction::Show { show_key } => show_config(ctx, paths, show_key),
        ConfigAction::Reset { yes } => reset(paths, yes),
        ConfigAction::Import { file } => import(paths, &file),
    }
}

/// 显示相关文件路径
pub fn show_paths(ctx: &OutputContext, paths: &AppPaths) -> Result<()> {
    let row = |item: &str, path: &Path| PathRow {
        item: item.to_string(),
        path: path.display().to_string(),
        exists: if path.exists() { "✓" } else { "✗" }.to_string(),
    };

    let rows = vec![
        row("Shell 配置文件", paths.rc_file.as_path()),
        row("供应商配置", paths.config_file.as_path()),
        row("备份目录", paths.backup_dir.as_path()),
    ];

    print_rows(ctx, rows, "")
}

/// 显示供应商配置（JSON，默认脱敏）
fn show_config(ctx: &OutputContext, paths: &AppPaths, show_key: bool) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let providers: ProviderMap = if show_key {
        store.list().clone()
    } else {
        store
            .list()
            .iter()
            .map(|(id, provider)| (id.clone(), mask_provider(provider)))
            .collect()
    };
    print_value(ctx, &providers)
}

/// 重置为默认配置
fn reset(paths: &AppPaths, yes: bool) -> Result<()> {
    if !yes && !confirm("确定要重置为默认配置吗? 已填写的 API Key 将被清除")? {
        print_info("已取消");
        return Ok(());
    }

    let mut store = ConfigStore::with_defaults(&paths.config_file);
    store.reset()?;
    print_success("配置已重置为默认值");
    Ok(())
}

/// 从 JSON 文件导入配置
fn import(paths: &AppPaths, file: &Path) -> Result<()> {
    let mut store = ConfigStore::load(&paths.config_file)?;
    let count = store.import(file)?;
    print_success(&format!(
        "已导入 {} 个供应商到 {}",
        count,
        paths.config_file.display()
    ));
    Ok(())
}
