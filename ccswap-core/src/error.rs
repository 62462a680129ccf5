//! 统一错误类型模块
//!
//! 定义应用中使用的所有错误类型，支持详细的错误上下文和链式错误追踪。

use std::path::Path;
use thiserror::Error;

/// 应用统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 无效输入
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// IO 错误（带路径上下文）
    #[error("IO 错误: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// IO 错误（带自定义上下文）
    #[error("{context}: {source}")]
    IoContext {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析错误
    #[error("JSON 解析错误: {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON 序列化错误
    #[error("JSON 序列化失败: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    /// 供应商不存在
    #[error("供应商不存在: {0}")]
    ProviderNotFound(String),

    /// 供应商未配置 API Key
    #[error("请先配置 {0} 的 API Key")]
    MissingApiKey(String),

    /// Shell 配置文件中的标记块缺少结束标记
    #[error("第 {line} 行的环境变量块缺少结束标记，已拒绝修改文件")]
    UnterminatedBlock { line: usize },
}

impl AppError {
    /// 创建 IO 错误
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// 创建 JSON 解析错误
    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::IoContext {
            context: "IO 操作失败".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonSerialize { source: err }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AppError::UnterminatedBlock { line: 12 };
        assert!(err.to_string().contains("12"));

        let err = AppError::MissingApiKey("deepseek".to_string());
        assert!(err.to_string().contains("deepseek"));

        let err = AppError::io(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/x"));
    }
}
