//! ccswap Core Library
//!
//! 核心业务逻辑库：在 Shell 配置文件（默认 `~/.zshrc`）中切换 Claude Code 使用的 API 供应商。
//! 此库不依赖任何界面框架，可在 CLI 或其它前端中使用。
//!
//! # 架构设计
//!
//! ```text
//! ccswap-core/
//! ├── lib.rs           - 公共 API 导出
//! ├── config.rs        - 路径解析和原子读写
//! ├── error.rs         - 统一错误类型
//! ├── provider.rs      - 供应商数据结构和默认值
//! ├── store.rs         - 供应商配置存储（JSON）
//! ├── rcfile.rs        - Shell 配置文件标记块替换
//! ├── backup.rs        - 带时间戳的备份
//! └── services/        - 业务逻辑服务层
//!     ├── mod.rs
//!     ├── switch.rs
//!     └── env_checker.rs
//! ```
//!
//! # 使用示例
//!
//! ```rust,no_run
//! use ccswap_core::{AppPaths, BackupManager, ConfigStore, RcFile, SwitchService};
//!
//! fn main() -> Result<(), ccswap_core::AppError> {
//!     let paths = AppPaths::resolve();
//!     let store = ConfigStore::load(&paths.config_file)?;
//!     let rc = RcFile::new(&paths.rc_file);
//!     let backups = BackupManager::new(&paths.backup_dir);
//!
//!     // 当前供应商
//!     println!("{:?}", SwitchService::current(&store, &rc)?);
//!
//!     // 切换供应商
//!     let outcome = SwitchService::switch(&store, &rc, &backups, "deepseek")?;
//!     println!("已切换到 {}", outcome.provider_name);
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod provider;
pub mod rcfile;
pub mod services;
pub mod store;

// 公共类型导出
pub use backup::{BackupEntry, BackupManager};
pub use config::{
    atomic_write, get_app_config_path, get_backup_dir, get_home_dir, get_rc_file_path,
    write_json_file, write_text_file, AppPaths,
};
pub use error::AppError;
pub use provider::{default_providers, Provider, ProviderMap};
pub use rcfile::RcFile;
pub use services::{
    CurrentProvider, EnvCheckerService, SwitchOutcome, SwitchPreview, SwitchService,
};
pub use store::ConfigStore;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
