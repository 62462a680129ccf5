//! 配置文件路径和读写模块
//!
//! 处理 Shell 配置文件、供应商配置文件和备份目录的路径解析，以及原子读写操作。

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// 覆盖用户主目录
pub const ENV_HOME: &str = "CCSWAP_HOME";
/// 覆盖 Shell 配置文件路径
pub const ENV_RC_FILE: &str = "CCSWAP_RC_FILE";
/// 覆盖供应商配置文件路径
pub const ENV_CONFIG: &str = "CCSWAP_CONFIG";
/// 覆盖备份目录
pub const ENV_BACKUP_DIR: &str = "CCSWAP_BACKUP_DIR";

/// 读取非空环境变量
fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// 获取用户主目录
///
/// 支持 `CCSWAP_HOME` 环境变量覆盖（用于测试隔离）
pub fn get_home_dir() -> PathBuf {
    if let Some(home) = env_path(ENV_HOME) {
        return home;
    }

    dirs::home_dir().unwrap_or_else(|| {
        log::warn!("无法获取用户主目录，回退到当前目录");
        PathBuf::from(".")
    })
}

/// 获取 Shell 配置文件路径
///
/// 默认: `~/.zshrc`
pub fn get_rc_file_path() -> PathBuf {
    env_path(ENV_RC_FILE).unwrap_or_else(|| get_home_dir().join(".zshrc"))
}

/// 获取供应商配置文件路径
///
/// 默认: `~/.claude_provider_config.json`
pub fn get_app_config_path() -> PathBuf {
    env_path(ENV_CONFIG).unwrap_or_else(|| get_home_dir().join(".claude_provider_config.json"))
}

/// 获取备份目录
///
/// 默认: `~/.claude_provider_backups`
pub fn get_backup_dir() -> PathBuf {
    env_path(ENV_BACKUP_DIR).unwrap_or_else(|| get_home_dir().join(".claude_provider_backups"))
}

/// 运行时使用的全部路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPaths {
    /// 被修改的 Shell 配置文件
    pub rc_file: PathBuf,
    /// 供应商配置文件
    pub config_file: PathBuf,
    /// 备份目录
    pub backup_dir: PathBuf,
}

impl AppPaths {
    /// 从环境变量和默认值解析路径
    pub fn resolve() -> Self {
        Self {
            rc_file: get_rc_file_path(),
            config_file: get_app_config_path(),
            backup_dir: get_backup_dir(),
        }
    }

    /// 使用显式指定的路径覆盖解析结果
    pub fn with_overrides(
        mut self,
        rc_file: Option<PathBuf>,
        config_file: Option<PathBuf>,
        backup_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(p) = rc_file {
            self.rc_file = p;
        }
        if let Some(p) = config_file {
            self.config_file = p;
        }
        if let Some(p) = backup_dir {
            self.backup_dir = p;
        }
        self
    }
}

/// 写入 JSON 配置文件（原子写入）
pub fn write_json_file<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    let mut json =
        serde_json::to_string_pretty(data).map_err(|e| AppError::JsonSerialize { source: e })?;
    json.push('\n');

    atomic_write(path, json.as_bytes())
}

/// 写入文本文件（原子写入）
pub fn write_text_file(path: &Path, data: &str) -> Result<(), AppError> {
    atomic_write(path, data.as_bytes())
}

/// 符号链接解析到实际文件，其它路径原样返回
fn resolve_write_target(path: &Path) -> Result<PathBuf, AppError> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(real) => Ok(real),
            // 链接目标尚不存在时写到链接指向的位置
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let target = fs::read_link(path).map_err(|e| AppError::io(path, e))?;
                Ok(match path.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target,
                })
            }
            Err(e) => Err(AppError::io(path, e)),
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// 原子写入：写入临时文件后 rename 替换，避免半写状态
///
/// 目标是符号链接时写入链接指向的文件，链接本身保留。
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let target = resolve_write_target(path)?;
    if target != path {
        log::debug!("{} 是符号链接，写入 {}", path.display(), target.display());
    }
    let path = target.as_path();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        Some(_) => PathBuf::from("."),
        None => return Err(AppError::Config("无效的路径".to_string())),
    };
    fs::create_dir_all(&parent).map_err(|e| AppError::io(&parent, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::Config("无效的文件名".to_string()))?
        .to_string_lossy()
        .to_string();

    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    let mut tmp = parent.clone();
    tmp.push(format!("{file_name}.tmp.{ts}"));

    {
        let mut f = fs::File::create(&tmp).map_err(|e| AppError::io(&tmp, e))?;
        f.write_all(data).map_err(|e| AppError::io(&tmp, e))?;
        f.flush().map_err(|e| AppError::io(&tmp, e))?;
    }

    // Unix: 保留原文件权限
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(meta) = fs::metadata(path) {
            let perm = meta.permissions().mode();
            let _ = fs::set_permissions(&tmp, fs::Permissions::from_mode(perm));
        }
    }

    log::debug!("原子写入 {} ({} 字节)", path.display(), data.len());

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(AppError::IoContext {
            context: format!("原子替换失败: {} -> {}", tmp.display(), path.display()),
            source: e,
        });
    }

    Ok(())
}
