//! 供应商操作命令实现

use anyhow::{bail, Result};
use ccswap_core::provider::parse_env_assignment;
use ccswap_core::rcfile::render_block;
use ccswap_core::{
    AppError, AppPaths, BackupManager, ConfigStore, Provider, RcFile, SwitchService,
};
use indexmap::IndexMap;
use serde::Serialize;

use crate::output::{
    confirm, mask_api_key, mask_provider, print_error, print_info, print_rows, print_success,
    print_value, print_warning, KeyValueRow, OutputContext,
};

/// `set` 命令参数
pub struct SetArgs {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub key_var: Option<String>,
    pub env: Vec<String>,
    pub unset_env: Vec<String>,
}

/// 切换结果（JSON / YAML 输出，API Key 已脱敏）
#[derive(Serialize)]
struct SwitchReport {
    provider_id: String,
    provider_name: String,
    rc_file: String,
    backup: Option<String>,
    changed: bool,
    exports: IndexMap<String, String>,
}

/// 未找到供应商时列出可用供应商
fn report_not_found(store: &ConfigStore, id: &str) {
    print_error(&format!("未找到供应商: {}", id));
    if !store.list().is_empty() {
        print_info("可用的供应商:");
        for (pid, p) in store.list() {
            println!("  - {} ({})", pid, p.display_name(pid));
        }
    }
}

/// 切换供应商
pub fn switch(ctx: &OutputContext, paths: &AppPaths, id: &str) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let rc = RcFile::new(&paths.rc_file);
    let backups = BackupManager::new(&paths.backup_dir);

    let outcome = match SwitchService::switch(&store, &rc, &backups, id) {
        Ok(outcome) => outcome,
        Err(AppError::ProviderNotFound(_)) => {
            report_not_found(&store, id);
            bail!("供应商不存在");
        }
        Err(AppError::MissingApiKey(name)) => {
            print_info(&format!("运行 ccswap set {} --api-key <KEY> 填写后再切换", id));
            bail!("请先配置 {} 的 API Key", name);
        }
        Err(e) => return Err(e.into()),
    };

    let provider = store.require(id)?;
    let exports = masked_exports(provider);

    if !ctx.is_table() {
        let report = SwitchReport {
            provider_id: outcome.provider_id,
            provider_name: outcome.provider_name,
            rc_file: outcome.rc_file.display().to_string(),
            backup: outcome.backup.map(|p| p.display().to_string()),
            changed: outcome.changed,
            exports,
        };
        return print_value(ctx, &report);
    }

    if let Some(backup) = &outcome.backup {
        print_info(&format!("已备份到: {}", backup.display()));
    }

    if outcome.changed {
        print_success(&format!("已切换到 {}", outcome.provider_name));
    } else {
        print_success(&format!("{} 已是当前配置，文件未修改", outcome.provider_name));
    }
    print_info(&format!(
        "请重启终端或运行: source {}",
        outcome.rc_file.display()
    ));

    Ok(())
}

/// 预览切换结果（不写入）
pub fn preview(ctx: &OutputContext, paths: &AppPaths, id: &str) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let rc = RcFile::new(&paths.rc_file);

    let preview = match SwitchService::preview(&store, &rc, id) {
        Ok(p) => p,
        Err(AppError::ProviderNotFound(_)) => {
            report_not_found(&store, id);
            bail!("供应商不存在");
        }
        Err(e) => return Err(e.into()),
    };

    let provider = store.require(id)?;
    let block = render_block(&masked_exports(provider));

    if !ctx.is_table() {
        #[derive(Serialize)]
        struct PreviewReport<'a> {
            provider_id: &'a str,
            rc_file: String,
            changed: bool,
            block: &'a str,
        }
        return print_value(
            ctx,
            &PreviewReport {
                provider_id: &preview.provider_id,
                rc_file: preview.rc_file.display().to_string(),
                changed: preview.changed,
                block: &block,
            },
        );
    }

    print_info(&format!(
        "将写入 {} 的内容 (dry-run，未修改文件):",
        preview.rc_file.display()
    ));
    print!("{}", block);
    if !preview.changed {
        print_info("文件内容不会发生变化");
    }

    Ok(())
}

/// 查看供应商详情
pub fn show(ctx: &OutputContext, paths: &AppPaths, id: &str, show_key: bool) -> Result<()> {
    let store = ConfigStore::load(&paths.config_file)?;
    let Some(provider) = store.get(id) else {
        report_not_found(&store, id);
        bail!("供应商不存在");
    };

    let shown = if show_key {
        provider.clone()
    } else {
        mask_provider(provider)
    };

    if !ctx.is_table() {
        return print_value(ctx, &shown);
    }

    let mut rows = vec![
        KeyValueRow::new("ID", id),
        KeyValueRow::new("名称", provider.display_name(id)),
        KeyValueRow::new(
            "Base URL",
            provider
                .effective_base_url()
                .unwrap_or_else(|| "-".to_string()),
        ),
        KeyValueRow::new("Key 变量", provider.key_var.as_str()),
        KeyValueRow::new("API Key", shown.api_key.as_str()),
    ];
    for (key, value) in &shown.env_vars {
        rows.push(KeyValueRow::new(format!("env {}", key), value.as_str()));
    }
    print_rows(ctx, rows, "")?;

    match provider.validate(id) {
        Ok(()) => {
            let exports = if show_key {
                provider.exports()
            } else {
                masked_exports(provider)
            };
            println!("\n切换后写入的内容:");
            print!("{}", render_block(&exports));
        }
        Err(e) => print_warning(&format!("暂不能切换: {}", e)),
    }

    Ok(())
}

/// 修改或新建供应商
pub fn set(ctx: &OutputContext, paths: &AppPaths, id: &str, args: SetArgs) -> Result<()> {
    let mut store = ConfigStore::load(&paths.config_file)?;
    let is_new = store.get(id).is_none();

    let assignments = args
        .env
        .iter()
        .map(|raw| parse_env_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    store.set_fields(id, args.name, args.base_url, args.api_key, args.key_var)?;
    for (key, value) in &assignments {
        store.set_env(id, key, value)?;
    }
    for key in &args.unset_env {
        if !store.unset_env(id, key)? {
            print_warning(&format!("{} 未设置附加变量 {}", id, key));
        }
    }
    store.save()?;

    if !ctx.is_table() {
        return print_value(ctx, &mask_provider(store.require(id)?));
    }

    if is_new {
        print_success(&format!("已新建供应商: {}", id));
    } else {
        print_success(&format!("已保存供应商: {}", id));
    }

    // 修改当前供应商后需要重新写入 Shell 配置文件
    let current = SwitchService::current(&store, &RcFile::new(&paths.rc_file))?;
    if current.id() == Some(id) {
        print_info(&format!("运行 ccswap use {} 使修改写入 Shell 配置文件", id));
    }

    Ok(())
}

/// 删除供应商
pub fn remove(_ctx: &OutputContext, paths: &AppPaths, id: &str, yes: bool) -> Result<()> {
    let mut store = ConfigStore::load(&paths.config_file)?;
    if store.get(id).is_none() {
        report_not_found(&store, id);
        bail!("供应商不存在");
    }

    if ConfigStore::is_builtin(id) {
        print_info(&format!("可以用 ccswap set {} 修改它的配置", id));
        bail!("内置供应商 {} 不能删除", id);
    }

    let current = SwitchService::current(&store, &RcFile::new(&paths.rc_file))?;
    if current.id() == Some(id) {
        print_error("无法删除当前正在使用的供应商，请先切换到其它供应商");
        bail!("供应商正在使用");
    }

    if !yes && !confirm(&format!("确定删除供应商 {} 吗?", id))? {
        print_info("已取消");
        return Ok(());
    }

    store.remove(id)?;
    store.save()?;
    print_success(&format!("已删除供应商: {}", id));
    Ok(())
}

/// 供应商导出的环境变量，API Key 已脱敏
fn masked_exports(provider: &Provider) -> IndexMap<String, String> {
    provider
        .exports()
        .into_iter()
        .map(|(key, value)| {
            if key == provider.key_var {
                let masked = mask_api_key(&value);
                (key, masked)
            } else {
                (key, value)
            }
        })
        .collect()
}
