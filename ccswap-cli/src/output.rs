//! 输出格式化模块
//!
//! 处理表格、JSON、YAML 等输出格式。

use anyhow::Result;
use ccswap_core::Provider;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use tabled::{settings::Style, Table, Tabled};

use crate::cli::OutputFormat;

/// 输出上下文
pub struct OutputContext {
    pub format: OutputFormat,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format }
    }

    /// 是否为表格（人类可读）输出
    pub fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }
}

/// 供应商列表行
#[derive(Tabled, Serialize)]
pub struct ProviderRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "名称")]
    pub name: String,
    #[tabled(rename = "状态")]
    pub status: String,
    #[tabled(rename = "Base URL")]
    pub base_url: String,
    #[tabled(rename = "API Key")]
    pub api_key: String,
}

/// 键值行
#[derive(Tabled, Serialize)]
pub struct KeyValueRow {
    #[tabled(rename = "项目")]
    pub key: String,
    #[tabled(rename = "值")]
    pub value: String,
}

impl KeyValueRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 路径行
#[derive(Tabled, Serialize)]
pub struct PathRow {
    #[tabled(rename = "用途")]
    pub item: String,
    #[tabled(rename = "路径")]
    pub path: String,
    #[tabled(rename = "存在")]
    pub exists: String,
}

/// 备份行
#[derive(Tabled, Serialize)]
pub struct BackupRow {
    #[tabled(rename = "文件")]
    pub file: String,
    #[tabled(rename = "时间")]
    pub time: String,
    #[tabled(rename = "大小")]
    pub size: String,
}

/// 打印行数据（支持所有格式）
pub fn print_rows<T: Tabled + Serialize>(ctx: &OutputContext, rows: Vec<T>, empty_msg: &str) -> Result<()> {
    match ctx.format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", empty_msg.dimmed());
                return Ok(());
            }
            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        _ => print_value(ctx, &rows)?,
    }
    Ok(())
}

/// 以 JSON / YAML 打印结构化数据（表格模式下使用 JSON）
pub fn print_value<T: Serialize + ?Sized>(ctx: &OutputContext, value: &T) -> Result<()> {
    match ctx.format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// 打印成功消息
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// 打印错误消息
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// 打印警告消息
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// 打印信息消息
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// 格式化状态标签
pub fn format_status(is_current: bool) -> String {
    if is_current {
        "● 当前".green().bold().to_string()
    } else {
        "○".dimmed().to_string()
    }
}

/// 截断字符串（按字符计数）
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// 脱敏 API Key（显示前缀和后缀）
///
/// 显示的字符不超过总长度的三分之二，短 Key 只保留前两位。
pub fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return "-".to_string();
    }

    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();
    if len <= 12 {
        let head: String = chars[..2.min(len)].iter().collect();
        return format!("{}***", head);
    }

    let prefix_len = if len < 24 { 4 } else { 8 };
    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[len - 4..].iter().collect();

    format!("{}...{}", prefix, suffix)
}

/// 脱敏供应商中的 API Key（包括由附加变量提供的 Key）
pub fn mask_provider(provider: &Provider) -> Provider {
    let mut masked = provider.clone();
    masked.api_key = mask_api_key(&masked.api_key);
    if let Some(value) = masked.env_vars.get_mut(&provider.key_var) {
        *value = mask_api_key(value);
    }
    masked
}

/// 询问确认（默认否）
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} {} ", prompt, "[y/N]".dimmed());
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
