//! Shell 配置文件修改模块
//!
//! 在任意 Shell 配置文件中定位并替换由标记注释包围的环境变量块，
//! 标记块之外的内容逐字节保留。
//!
//! ```text
//! ...用户原有内容...
//!
//! # Claude Code Environment Variables
//! export ANTHROPIC_BASE_URL=https://api.deepseek.com/anthropic
//! export DEEPSEEK_API_KEY=sk-xxx
//! # End Claude Code Environment Variables
//! ```

use indexmap::IndexMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::write_text_file;
use crate::error::AppError;

/// 标记块起始行
pub const BEGIN_MARKER: &str = "# Claude Code Environment Variables";

/// 标记块结束行
pub const END_MARKER: &str = "# End Claude Code Environment Variables";

fn is_begin(line: &str) -> bool {
    line.contains(BEGIN_MARKER)
}

fn is_end(line: &str) -> bool {
    line.contains(END_MARKER)
}

/// 标记块之外的行（行号从 1 开始）
///
/// 按 `\n` 分行，跳过起始标记到结束标记（含）之间的行和多余的结束标记。
/// 起始标记之后找不到结束标记时返回 [`AppError::UnterminatedBlock`]。
pub fn unmanaged_lines(content: &str) -> Result<Vec<(usize, &str)>, AppError> {
    let mut kept = Vec::new();
    let mut open_at: Option<usize> = None;

    for (idx, line) in content.split('\n').enumerate() {
        if open_at.is_some() {
            if is_end(line) {
                open_at = None;
            }
            continue;
        }
        if is_begin(line) {
            open_at = Some(idx + 1);
            continue;
        }
        if is_end(line) {
            log::warn!("第 {} 行存在多余的结束标记，已移除", idx + 1);
            continue;
        }
        kept.push((idx + 1, line));
    }

    match open_at {
        Some(line) => Err(AppError::UnterminatedBlock { line }),
        None => Ok(kept),
    }
}

/// 移除所有标记块
///
/// 标记块之外的行原样保留，最后去掉末尾的空白行。
pub fn strip_managed_block(content: &str) -> Result<String, AppError> {
    let mut kept: Vec<&str> = unmanaged_lines(content)?
        .into_iter()
        .map(|(_, line)| line)
        .collect();

    while kept.last().map_or(false, |l| l.trim().is_empty()) {
        kept.pop();
    }

    Ok(kept.join("\n"))
}

/// 生成标记块文本（首尾各带一个换行）
pub fn render_block(exports: &IndexMap<String, String>) -> String {
    let mut block = String::from("\n");
    block.push_str(BEGIN_MARKER);
    block.push('\n');
    for (key, value) in exports {
        block.push_str("export ");
        block.push_str(key);
        block.push('=');
        block.push_str(value);
        block.push('\n');
    }
    block.push_str(END_MARKER);
    block.push('\n');
    block
}

/// 用新的环境变量替换标记块，新块追加到文件末尾
pub fn apply(content: &str, exports: &IndexMap<String, String>) -> Result<String, AppError> {
    let mut result = strip_managed_block(content)?;
    result.push_str(&render_block(exports));
    Ok(result)
}

/// 是否包含起始标记
pub fn has_managed_block(content: &str) -> bool {
    content.split('\n').any(is_begin)
}

/// 读取第一个标记块中的 `export KEY=VALUE`
///
/// 没有标记块时返回 `None`。
pub fn extract_exports(content: &str) -> Option<IndexMap<String, String>> {
    let mut lines = content.split('\n').skip_while(|l| !is_begin(l));
    lines.next()?;

    let mut exports = IndexMap::new();
    for line in lines.take_while(|l| !is_end(l)) {
        let Some(rest) = line.trim().strip_prefix("export ") else {
            continue;
        };
        if let Some((key, value)) = rest.split_once('=') {
            exports.insert(key.trim().to_string(), value.trim_end().to_string());
        }
    }
    Some(exports)
}

/// 被修改的 Shell 配置文件
#[derive(Debug, Clone)]
pub struct RcFile {
    path: PathBuf,
}

impl RcFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// 读取文件内容，文件不存在时返回空字符串
    pub fn read(&self) -> Result<String, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("{} 不存在，按空文件处理", self.path.display());
                Ok(String::new())
            }
            Err(e) => Err(AppError::io(&self.path, e)),
        }
    }

    /// 写回文件（原子写入，保留权限）
    pub fn write(&self, content: &str) -> Result<(), AppError> {
        write_text_file(&self.path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exports(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_apply_to_plain_file() {
        let content = "export PATH=\"$HOME/bin:$PATH\"\nalias ll='ls -l'\n";
        let vars = exports(&[("ANTHROPIC_BASE_URL", "https://a.example.com"), ("ANTHROPIC_API_KEY", "k")]);

        let result = apply(content, &vars).unwrap();
        assert_eq!(
            result,
            "export PATH=\"$HOME/bin:$PATH\"\nalias ll='ls -l'\n\
             # Claude Code Environment Variables\n\
             export ANTHROPIC_BASE_URL=https://a.example.com\n\
             export ANTHROPIC_API_KEY=k\n\
             # End Claude Code Environment Variables\n"
        );
    }

    #[test]
    fn test_apply_is_idempotent() {
        let content = "# my zshrc\nsource ~/.aliases\n\n\n";
        let vars = exports(&[("ANTHROPIC_BASE_URL", "https://a.example.com")]);

        let once = apply(content, &vars).unwrap();
        let twice = apply(&once, &vars).unwrap();
        assert_eq!(once, twice);
        assert_eq!(strip_managed_block(&once).unwrap(), "# my zshrc\nsource ~/.aliases");
    }

    #[test]
    fn test_replace_existing_block() {
        let old = apply("setopt autocd\n", &exports(&[("ANTHROPIC_API_KEY", "old")])).unwrap();
        let new = apply(&old, &exports(&[("DEEPSEEK_API_KEY", "new")])).unwrap();

        assert!(!new.contains("old"));
        assert!(new.contains("export DEEPSEEK_API_KEY=new\n"));
        assert_eq!(new.matches(BEGIN_MARKER).count(), 1);
        assert!(new.starts_with("setopt autocd\n# Claude Code"));
    }

    #[test]
    fn test_strip_preserves_surrounding_bytes() {
        let content = "a=1 \r\n\tb=2\r\n# Claude Code Environment Variables\r\nexport X=1\r\n# End Claude Code Environment Variables\r\n  c=3  \nd=4";
        let stripped = strip_managed_block(content).unwrap();
        assert_eq!(stripped, "a=1 \r\n\tb=2\r\n  c=3  \nd=4");
    }

    #[test]
    fn test_strip_block_in_middle_and_multiple_blocks() {
        let content = "top\n# Claude Code Environment Variables\nexport A=1\n# End Claude Code Environment Variables\nmiddle\n# Claude Code Environment Variables\nexport B=2\n# End Claude Code Environment Variables\nbottom\n";
        assert_eq!(strip_managed_block(content).unwrap(), "top\nmiddle\nbottom");
    }

    #[test]
    fn test_stray_end_marker_removed() {
        let content = "a\n# End Claude Code Environment Variables\nb\n";
        assert_eq!(strip_managed_block(content).unwrap(), "a\nb");
    }

    #[test]
    fn test_unterminated_block_is_error() {
        let content = "keep me\n# Claude Code Environment Variables\nexport A=1\nimportant stuff\n";
        match strip_managed_block(content) {
            Err(AppError::UnterminatedBlock { line }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(apply(content, &exports(&[])).is_err());
    }

    #[test]
    fn test_apply_to_empty_content() {
        let result = apply("", &exports(&[("A", "1")])).unwrap();
        assert_eq!(
            result,
            "\n# Claude Code Environment Variables\nexport A=1\n# End Claude Code Environment Variables\n"
        );
    }

    #[test]
    fn test_extract_exports() {
        assert!(extract_exports("export ANTHROPIC_BASE_URL=x\n").is_none());

        let content = apply(
            "export OUTSIDE=1\n",
            &exports(&[("ANTHROPIC_BASE_URL", "https://api.deepseek.com/anthropic"), ("T", "${K}")]),
        )
        .unwrap();
        let found = extract_exports(&content).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found["T"], "${K}");
        assert!(!found.contains_key("OUTSIDE"));
        assert!(has_managed_block(&content));
    }

    #[test]
    fn test_rc_file_read_write() {
        let dir = tempdir().unwrap();
        let rc = RcFile::new(dir.path().join(".zshrc"));
        assert!(!rc.exists());
        assert_eq!(rc.read().unwrap(), "");

        rc.write("export A=1\n").unwrap();
        assert_eq!(rc.read().unwrap(), "export A=1\n");
    }

    #[test]
    fn test_rc_file_rejects_non_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".zshrc");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(RcFile::new(&path).read(), Err(AppError::Io { .. })));
    }
}
