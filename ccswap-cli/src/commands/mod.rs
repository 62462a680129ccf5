//! 命令执行模块
//!
//! 实现各个 CLI 子命令的具体逻辑。

pub mod backup;
pub mod config;
pub mod env;
pub mod list;
pub mod provider;
pub mod status;

use anyhow::Result;

use crate::cli::{BackupAction, Cli, Commands, EnvAction};
use crate::output::OutputContext;

/// 执行 CLI 命令，未指定子命令时显示状态
pub fn execute(cli: Cli) -> Result<()> {
    let ctx = OutputContext::new(cli.format, cli.no_color);
    let paths = cli.paths();
    log::debug!("使用路径: {:?}", paths);

    let Some(command) = cli.command else {
        return status::show_status(&ctx, &paths);
    };

    match command {
        Commands::List { show_key } => list::list_providers(&ctx, &paths, show_key),
        Commands::Status => status::show_status(&ctx, &paths),
        Commands::Use { id, dry_run } => {
            if dry_run {
                provider::preview(&ctx, &paths, &id)
            } else {
                provider::switch(&ctx, &paths, &id)
            }
        }
        Commands::Show { id, show_key } => provider::show(&ctx, &paths, &id, show_key),
        Commands::Set {
            id,
            name,
            base_url,
            api_key,
            key_var,
            env,
            unset_env,
        } => provider::set(
            &ctx,
            &paths,
            &id,
            provider::SetArgs {
                name,
                base_url,
                api_key,
                key_var,
                env,
                unset_env,
            },
        ),
        Commands::Remove { id, yes } => provider::remove(&ctx, &paths, &id, yes),
        Commands::Config { action } => config::execute(&ctx, &paths, action),
        Commands::Backup { action } => match action {
            BackupAction::List => backup::list(&ctx, &paths),
            BackupAction::Create => backup::create(&ctx, &paths),
        },
        Commands::Env { action } => match action {
            EnvAction::Check => env::check(&ctx, &paths),
        },
        Commands::Version => {
            println!("ccswap {}", ccswap_core::VERSION);
            Ok(())
        }
    }
}
