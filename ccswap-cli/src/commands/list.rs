//! list 命令实现

use anyhow::Result;
use ccswap_core::{AppPaths, ConfigStore, RcFile, SwitchService};

use crate::output::{
    format_status, mask_api_key, print_rows, truncate, OutputContext, ProviderRow,
};

/// 执行 list 命令
pub fn list_providers(ctx: &OutputContext, paths: &AppPaths, show_key: bool) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let current = SwitchService::current(&store, &RcFile::new(&paths.rc_file))?;

    let rows: Vec<ProviderRow> = store
        .list()
        .iter()
        .map(|(id, provider)| {
            let is_current = current.id() == Some(id.as_str());
            let base_url = provider
                .effective_base_url()
                .unwrap_or_else(|| "-".to_string());

            // JSON / YAML 输出不带颜色
            let status = if ctx.is_table() {
                format_status(is_current)
            } else if is_current {
                "current".to_string()
            } else {
                String::new()
            };

            let api_key = if show_key {
                mask_api_key(provider.effective_api_key())
            } else if provider.has_api_key() {
                "已配置".to_string()
            } else {
                "未配置".to_string()
            };

            ProviderRow {
                id: id.clone(),
                name: provider.display_name(id).to_string(),
                status,
                base_url: truncate(&base_url, 48),
                api_key,
            }
        })
        .collect();

    print_rows(ctx, rows, "没有配置供应商")
}
