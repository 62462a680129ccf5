//! CLI 参数定义模块
//!
//! 使用 clap 定义命令行接口结构。

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ccswap_core::config::{ENV_BACKUP_DIR, ENV_CONFIG, ENV_RC_FILE};
use ccswap_core::AppPaths;

/// ccswap - Claude Code 供应商切换工具
///
/// 通过改写 Shell 配置文件中的环境变量，在多个 API 供应商之间切换。
#[derive(Parser, Debug)]
#[command(
    name = "ccswap",
    version,
    author,
    about = "🔄 Claude Code 供应商切换工具 - 改写 ~/.zshrc 中的 API 环境变量",
    long_about = r#"
管理 Claude Code 使用的 API 供应商。
切换时会先备份 Shell 配置文件，再替换其中的环境变量标记块:

  # Claude Code Environment Variables
  export ANTHROPIC_BASE_URL=...
  # End Claude Code Environment Variables

🚀 快速开始:
   ccswap list                          查看所有供应商
   ccswap set deepseek --api-key sk-xx  填写 API Key
   ccswap use deepseek                  切换供应商
   ccswap status                        查看当前状态
"#,
    after_help = r#"💡 提示: 切换后请重启终端或运行 source ~/.zshrc 使配置生效"#
)]
pub struct Cli {
    /// 输出格式
    #[arg(
        short = 'o',
        long,
        value_enum,
        default_value = "table",
        global = true,
        help = "输出格式 (table, json, yaml)"
    )]
    pub format: OutputFormat,

    /// 禁用彩色输出
    #[arg(long, global = true, help = "禁用彩色输出")]
    pub no_color: bool,

    /// 显示详细信息
    #[arg(short, long, global = true, help = "显示详细日志")]
    pub verbose: bool,

    /// Shell 配置文件
    #[arg(long, global = true, value_name = "FILE", env = ENV_RC_FILE, help = "要修改的 Shell 配置文件 (默认 ~/.zshrc)")]
    pub rc_file: Option<PathBuf>,

    /// 供应商配置文件
    #[arg(long, global = true, value_name = "FILE", env = ENV_CONFIG, help = "供应商配置文件 (默认 ~/.claude_provider_config.json)")]
    pub config: Option<PathBuf>,

    /// 备份目录
    #[arg(long, global = true, value_name = "DIR", env = ENV_BACKUP_DIR, help = "备份目录 (默认 ~/.claude_provider_backups)")]
    pub backup_dir: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// 解析最终使用的路径（命令行 > 环境变量 > 默认值）
    pub fn paths(&self) -> AppPaths {
        AppPaths::resolve().with_overrides(
            self.rc_file.clone(),
            self.config.clone(),
            self.backup_dir.clone(),
        )
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 表格格式（默认）
    Table,
    /// JSON 格式
    Json,
    /// YAML 格式
    Yaml,
}

/// 子命令定义
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 📋 列出所有供应商
    #[command(visible_alias = "ls")]
    List {
        /// 显示脱敏后的 API Key
        #[arg(long)]
        show_key: bool,
    },

    /// 📊 显示当前使用的供应商
    Status,

    /// 🔄 切换到指定供应商
    #[command(
        visible_alias = "switch",
        long_about = "切换到指定的供应商。\n\n示例:\n  ccswap use deepseek            切换到 DeepSeek\n  ccswap use third_party --dry-run  只预览将写入的内容"
    )]
    Use {
        /// 供应商 ID (可通过 ccswap list 查看)
        id: String,

        /// 只预览，不修改文件
        #[arg(long)]
        dry_run: bool,
    },

    /// 🔍 查看供应商详情
    Show {
        /// 供应商 ID
        id: String,

        /// 显示完整 API Key
        #[arg(long)]
        show_key: bool,
    },

    /// ✏️ 修改或新建供应商
    #[command(
        long_about = r#"修改供应商配置，ID 不存在时新建。

示例:
  ccswap set deepseek --api-key sk-xxx
  ccswap set third_party --base-url https://relay.example.com --api-key sk-xxx
  ccswap set work --name "公司中转" --base-url https://w.example.com --api-key k \
      --env ANTHROPIC_MODEL=claude-sonnet-4-20250514"#
    )]
    Set {
        /// 供应商 ID
        id: String,

        /// 显示名称
        #[arg(long)]
        name: Option<String>,

        /// Base URL（写入 ANTHROPIC_BASE_URL）
        #[arg(long)]
        base_url: Option<String>,

        /// API Key
        #[arg(long)]
        api_key: Option<String>,

        /// 接收 API Key 的环境变量名
        #[arg(long, value_name = "VAR")]
        key_var: Option<String>,

        /// 附加环境变量，可重复
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,

        /// 删除附加环境变量，可重复
        #[arg(long = "unset-env", value_name = "KEY")]
        unset_env: Vec<String>,
    },

    /// ❌ 删除供应商
    #[command(visible_alias = "rm")]
    Remove {
        /// 供应商 ID
        id: String,

        /// 跳过确认直接删除
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// ⚙️ 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// 💾 备份管理
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// 🔍 环境变量检测
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// ℹ️ 显示版本信息
    Version,
}

/// 配置操作子命令
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// 📁 显示相关文件路径
    Path,

    /// 📄 显示供应商配置
    Show {
        /// 显示完整 API Key
        #[arg(long)]
        show_key: bool,
    },

    /// ♻️ 重置为默认配置
    Reset {
        /// 跳过确认
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 📥 从 JSON 文件导入配置（覆盖当前配置）
    Import {
        /// JSON 文件路径
        file: PathBuf,
    },
}

/// 备份操作子命令
#[derive(Subcommand, Debug)]
pub enum BackupAction {
    /// 📋 列出备份
    #[command(visible_alias = "ls")]
    List,

    /// 💾 立即备份 Shell 配置文件
    Create,
}

/// 环境变量检测子命令
#[derive(Subcommand, Debug)]
pub enum EnvAction {
    /// 检查可能覆盖切换结果的环境变量
    Check,
}
