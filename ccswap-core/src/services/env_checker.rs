//! 环境变量冲突检测服务模块
//!
//! 检测可能覆盖标记块中配置的环境变量：进程环境变量，
//! 以及目标文件标记块之外和其它 Shell 配置文件中的同名设置。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::get_home_dir;
use crate::error::AppError;
use crate::rcfile::unmanaged_lines;

/// Claude Code 读取的关键环境变量
pub const CLAUDE_ENV_KEYS: &[(&str, &str)] = &[
    ("ANTHROPIC_API_KEY", "Anthropic API Key"),
    ("ANTHROPIC_AUTH_TOKEN", "Anthropic Auth Token"),
    ("ANTHROPIC_BASE_URL", "Anthropic Base URL"),
    ("ANTHROPIC_MODEL", "Anthropic Model"),
    ("ANTHROPIC_SMALL_FAST_MODEL", "Anthropic Small Fast Model"),
];

/// `export KEY=` / `KEY=` / fish 的 `set -gx KEY`
static ASSIGN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:export\s+|set\s+-[A-Za-z]+\s+)?([A-Za-z_][A-Za-z0-9_]*)(?:\s*=|\s+\S)")
        .expect("assignment pattern is valid")
});

/// 环境检测服务
pub struct EnvCheckerService;

/// 环境变量检测结果
#[derive(Debug, Clone, Serialize)]
pub struct EnvCheckResult {
    pub rc_file: PathBuf,
    pub conflicts: Vec<EnvConflict>,
}

/// 环境变量冲突
#[derive(Debug, Clone, Serialize)]
pub struct EnvConflict {
    pub name: String,
    pub value: Option<String>,
    pub source: EnvSource,
    pub description: String,
}

/// 环境变量来源
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EnvSource {
    /// 进程环境变量
    Process,
    /// Shell 配置文件（文件路径、行号）
    ShellConfig { file: String, line: usize },
}

/// 常见 Shell 配置文件列表
fn get_shell_config_files() -> Vec<PathBuf> {
    let home = get_home_dir();
    vec![
        home.join(".bashrc"),
        home.join(".bash_profile"),
        home.join(".profile"),
        home.join(".zshrc"),
        home.join(".zprofile"),
        home.join(".config/fish/config.fish"),
    ]
}

impl EnvCheckerService {
    /// 检查目标 Shell 配置文件相关的环境变量冲突
    pub fn check(rc_file: &Path) -> Result<EnvCheckResult, AppError> {
        let mut conflicts = Self::check_process();
        conflicts.extend(Self::check_files(rc_file, &get_shell_config_files())?);
        Ok(EnvCheckResult {
            rc_file: rc_file.to_path_buf(),
            conflicts,
        })
    }

    /// 检查进程环境变量
    pub fn check_process() -> Vec<EnvConflict> {
        CLAUDE_ENV_KEYS
            .iter()
            .filter_map(|(key, desc)| {
                let value = std::env::var(key).ok()?;
                Some(EnvConflict {
                    name: key.to_string(),
                    value: Some(Self::mask_value(&value)),
                    source: EnvSource::Process,
                    description: format!("{desc} 已在当前进程环境中设置，新终端之外的会话仍会使用旧值"),
                })
            })
            .collect()
    }

    /// 检查目标文件（标记块之外）和其它 Shell 配置文件
    pub fn check_files(rc_file: &Path, others: &[PathBuf]) -> Result<Vec<EnvConflict>, AppError> {
        let mut files = vec![rc_file.to_path_buf()];
        files.extend(others.iter().filter(|p| p.as_path() != rc_file).cloned());

        let mut conflicts = Vec::new();
        for file in files {
            let content = match fs::read_to_string(&file) {
                Ok(c) => c,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    log::warn!("无法读取 {}: {e}", file.display());
                    continue;
                }
            };

            // 标记块损坏时按整个文件检查
            let outside = unmanaged_lines(&content).unwrap_or_else(|_| {
                content
                    .split('\n')
                    .enumerate()
                    .map(|(idx, line)| (idx + 1, line))
                    .collect()
            });
            let is_target = file.as_path() == rc_file;

            for (line_no, key) in Self::find_assignments(outside) {
                let Some((_, desc)) = CLAUDE_ENV_KEYS.iter().find(|(k, _)| *k == key) else {
                    continue;
                };
                let description = if is_target {
                    format!("{desc} 在标记块之外被设置，可能与切换结果冲突")
                } else {
                    format!("{desc} 在其它 Shell 配置文件中设置")
                };
                conflicts.push(EnvConflict {
                    name: key,
                    value: None,
                    source: EnvSource::ShellConfig {
                        file: file.display().to_string(),
                        line: line_no,
                    },
                    description,
                });
            }
        }

        Ok(conflicts)
    }

    /// 找出被赋值的变量（保留原行号，忽略注释行）
    fn find_assignments<'a>(
        lines: impl IntoIterator<Item = (usize, &'a str)>,
    ) -> Vec<(usize, String)> {
        lines
            .into_iter()
            .filter(|(_, line)| !line.trim_start().starts_with('#'))
            .filter_map(|(line_no, line)| {
                ASSIGN_RE
                    .captures(line)
                    .map(|caps| (line_no, caps[1].to_string()))
            })
            .collect()
    }

    /// 掩码敏感值
    pub fn mask_value(value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}
