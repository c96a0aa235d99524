//! # 统一错误处理模块
//!
//! 定义 clms-upload 的所有错误类型，使用 `thiserror` 派生。
//! 每个错误变体对应一个固定的进程退出码。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// clms-upload 统一错误类型
#[derive(Error, Debug)]
pub enum UploadError {
    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("No destination prefix provided (use -p/--prefix)")]
    MissingPrefix,

    #[error("No input selected: use one of -l (file), -d (glob) or -r (directory)")]
    NoModeSelected,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 枚举错误
    // ─────────────────────────────────────────────────────────────
    #[error("File does not exist: {path}")]
    LocalFileNotFound { path: String },

    #[error("No files matched the pattern: {pattern}")]
    NoGlobMatches { pattern: String },

    #[error("Directory not found: {path}")]
    RootNotFound { path: String },

    #[error("No files matching '{filter}' found under {root}")]
    NoRecursiveMatches { root: String, filter: String },

    // ─────────────────────────────────────────────────────────────
    // 传输错误
    // ─────────────────────────────────────────────────────────────
    #[error("Transfer tool '{command}' not found. Please see: https://rclone.org/install/")]
    TransferToolNotFound { command: String },

    #[error("Failed to start '{command}'")]
    TransferSpawnError {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{failed} of {total} uploads failed")]
    UploadsFailed { failed: usize, total: usize },

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

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("{0}")]
    Other(String),
}

impl UploadError {
    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            UploadError::MissingPrefix => 2,
            UploadError::LocalFileNotFound { .. } => 3,
            UploadError::NoGlobMatches { .. } => 4,
            UploadError::RootNotFound { .. } => 5,
            UploadError::NoRecursiveMatches { .. } => 6,
            UploadError::UploadsFailed { .. } => 7,
            UploadError::NoModeSelected
            | UploadError::InvalidArgument(_)
            | UploadError::InvalidPattern { .. } => USAGE_EXIT_CODE,
            UploadError::TransferToolNotFound { .. } => 9,
            _ => 1,
        }
    }
}

/// 命令行参数解析失败时的退出码
pub const USAGE_EXIT_CODE: i32 = 8;

/// Result 类型别名
pub type Result<T> = std::result::Result<T, UploadError>;
