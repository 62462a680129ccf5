//! ccswap CLI
//!
//! 在 Shell 配置文件中切换 Claude Code 使用的 API 供应商。
//!
//! # 使用示例
//!
//! ```bash
//! # 显示当前状态
//! ccswap
//!
//! # 列出所有供应商
//! ccswap list
//!
//! # 填写 API Key 并切换
//! ccswap set deepseek --api-key sk-xxx
//! ccswap use deepseek
//! ```

mod cli;
mod commands;
mod output;

use clap::Parser;

use cli::Cli;
use commands::execute;
use output::print_error;

fn main() {
    let cli = Cli::parse();

    // 初始化日志
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if let Err(err) = execute(cli) {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
