//! 服务层模块
//!
//! 提供业务逻辑服务，包括供应商切换、环境变量冲突检测等。

pub mod env_checker;
pub mod switch;

pub use env_checker::EnvCheckerService;
pub use switch::{CurrentProvider, SwitchOutcome, SwitchPreview, SwitchService};
