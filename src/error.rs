//! # 统一错误处理模块
//!
//! 定义 gpawflow 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// gpawflow 统一错误类型
#[derive(Error, Debug)]
pub enum GpawFlowError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Refusing to overwrite existing file: {path} (use --overwrite)")]
    AlreadyExists { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Band data shape mismatch: {0}")]
    ShapeMismatch(String),

    // ─────────────────────────────────────────────────────────────
    // 输入卡片错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid deck {path}: {reason}")]
    ConfigError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, GpawFlowError>;

impl GpawFlowError {
    /// 读取文件失败的快捷构造
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        GpawFlowError::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// 写入文件失败的快捷构造
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        GpawFlowError::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}
