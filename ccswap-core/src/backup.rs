//! 备份管理模块
//!
//! 修改 Shell 配置文件前，将原文件复制为带时间戳的备份。

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const BACKUP_INFIX: &str = "_backup_";

/// 单个备份文件
#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    /// 从文件名解析出的时间
    pub created_at: Option<NaiveDateTime>,
}

/// 备份管理器
#[derive(Debug, Clone)]
pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 备份目录
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 备份文件，源文件不存在时返回 `None`
    pub fn backup(&self, source: &Path) -> Result<Option<PathBuf>, AppError> {
        self.backup_at(source, Local::now().naive_local())
    }

    /// 以指定时间备份文件
    pub fn backup_at(&self, source: &Path, now: NaiveDateTime) -> Result<Option<PathBuf>, AppError> {
        if !source.exists() {
            log::debug!("{} 不存在，跳过备份", source.display());
            return Ok(None);
        }

        fs::create_dir_all(&self.dir).map_err(|e| AppError::io(&self.dir, e))?;

        let base = format!(
            "{}{}{}",
            backup_stem(source),
            BACKUP_INFIX,
            now.format(TIMESTAMP_FORMAT)
        );
        let mut target = self.dir.join(&base);
        let mut seq = 1;
        while target.exists() {
            target = self.dir.join(format!("{base}_{seq}"));
            seq += 1;
        }

        fs::copy(source, &target).map_err(|e| AppError::IoContext {
            context: format!("备份失败: {} -> {}", source.display(), target.display()),
            source: e,
        })?;

        log::info!("已备份 {} 到 {}", source.display(), target.display());
        Ok(Some(target))
    }

    /// 列出所有备份（最新的在前）
    pub fn list(&self) -> Result<Vec<BackupEntry>, AppError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| AppError::io(&self.dir, e))? {
            let entry = entry.map_err(|e| AppError::io(&self.dir, e))?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(created_at) = parse_backup_time(&file_name) else {
                continue;
            };
            let meta = entry.metadata().map_err(|e| AppError::io(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            entries.push(BackupEntry {
                path: entry.path(),
                file_name,
                size: meta.len(),
                created_at: Some(created_at),
            });
        }

        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.file_name.len().cmp(&a.file_name.len()))
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(entries)
    }

    /// 最新的备份
    pub fn latest(&self) -> Result<Option<BackupEntry>, AppError> {
        Ok(self.list()?.into_iter().next())
    }
}

/// 备份文件名前缀：去掉开头的点，`.zshrc` -> `zshrc`
fn backup_stem(source: &Path) -> String {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.trim_start_matches('.');
    if stem.is_empty() {
        "rc".to_string()
    } else {
        stem.to_string()
    }
}

/// 解析 `<stem>_backup_YYYYmmdd_HHMMSS[_N]`
fn parse_backup_time(file_name: &str) -> Option<NaiveDateTime> {
    let (_, rest) = file_name.rsplit_once(BACKUP_INFIX)?;
    let stamp = rest.get(..15)?;
    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_backup_missing_source() {
        let dir = tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));
        let result = manager.backup(&dir.path().join(".zshrc")).unwrap();
        assert!(result.is_none());
        assert!(!manager.dir().exists());
    }

    #[test]
    fn test_backup_copies_content() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".zshrc");
        fs::write(&rc, "export A=1\n").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        let path = manager.backup_at(&rc, at(8, 30, 5)).unwrap().unwrap();

        assert_eq!(path.file_name().unwrap(), "zshrc_backup_20250309_083005");
        assert_eq!(fs::read_to_string(&path).unwrap(), "export A=1\n");
    }

    #[test]
    fn test_backup_same_second_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".zshrc");
        let manager = BackupManager::new(dir.path().join("backups"));

        fs::write(&rc, "v1").unwrap();
        let first = manager.backup_at(&rc, at(9, 0, 0)).unwrap().unwrap();
        fs::write(&rc, "v2").unwrap();
        let second = manager.backup_at(&rc, at(9, 0, 0)).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("_1"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "v1");
        assert_eq!(fs::read_to_string(&second).unwrap(), "v2");
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".bashrc");
        fs::write(&rc, "x").unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));

        manager.backup_at(&rc, at(7, 0, 0)).unwrap();
        manager.backup_at(&rc, at(10, 0, 0)).unwrap();
        manager.backup_at(&rc, at(10, 0, 0)).unwrap();
        fs::write(manager.dir().join("notes.txt"), "ignored").unwrap();

        let list = manager.list().unwrap();
        let names: Vec<_> = list.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "bashrc_backup_20250309_100000_1",
                "bashrc_backup_20250309_100000",
                "bashrc_backup_20250309_070000",
            ]
        );
        assert_eq!(list[0].size, 1);
        assert_eq!(
            manager.latest().unwrap().unwrap().file_name,
            "bashrc_backup_20250309_100000_1"
        );
    }

    #[test]
    fn test_backup_stem() {
        assert_eq!(backup_stem(Path::new("/home/u/.zshrc")), "zshrc");
        assert_eq!(backup_stem(Path::new("config.fish")), "config.fish");
        assert_eq!(backup_stem(Path::new("/home/u/...")), "rc");
    }
}
