//! 环境变量检测命令模块
//!
//! 实现环境变量冲突检测的 CLI 命令。

use anyhow::Result;
use ccswap_core::services::env_checker::EnvSource;
use ccswap_core::{AppPaths, EnvCheckerService};

use crate::output::{print_info, print_success, print_value, print_warning, OutputContext};

/// 检查环境变量冲突
pub fn check(ctx: &OutputContext, paths: &AppPaths) -> Result<()> {
    let result = EnvCheckerService::check(&paths.rc_file)?;

    if !ctx.is_table() {
        return print_value(ctx, &result);
    }

    println!("\n🔍 环境变量冲突检测\n");

    if result.conflicts.is_empty() {
        print_success("未发现环境变量冲突");
        return Ok(());
    }

    print_warning(&format!("发现 {} 个潜在冲突", result.conflicts.len()));

    for conflict in &result.conflicts {
        let source = match &conflict.source {
            EnvSource::Process => "进程环境".to_string(),
            EnvSource::ShellConfig { file, line } => format!("{}:{}", file, line),
        };

        println!("  - {}", conflict.name);
        println!("    来源: {}", source);
        if let Some(value) = &conflict.value {
            println!("    值: {}", value);
        }
        println!("    说明: {}", conflict.description);
    }

    println!();
    print_info("这些设置可能覆盖切换后写入的环境变量");

    Ok(())
}
