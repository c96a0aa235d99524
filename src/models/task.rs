//! # 上传任务数据模型
//!
//! 描述一次上传的 (本地文件, 目标键) 二元组及其执行结果。
//!
//! ## 依赖关系
//! - 被 `batch/collector.rs` 创建
//! - 被 `batch/runner.rs`, `transfer/`, `commands/upload.rs` 使用

use serde::Serialize;
use std::path::{Path, PathBuf};

/// 上传任务（构造后不可变）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    source_path: PathBuf,
    destination_key: String,
}

impl UploadTask {
    pub fn new(source_path: impl Into<PathBuf>, destination_key: impl Into<String>) -> Self {
        UploadTask {
            source_path: source_path.into(),
            destination_key: destination_key.into(),
        }
    }

    /// 本地文件路径
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// 对象存储中的目标键
    pub fn destination_key(&self) -> &str {
        &self.destination_key
    }
}

/// 将前缀与相对键拼接为目标键
///
/// 去掉前缀末尾和后缀开头的 `/`，并折叠重复的 `//`。
pub fn join_key(prefix: &str, suffix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');

    let joined = if prefix.is_empty() {
        suffix.to_string()
    } else if suffix.is_empty() {
        prefix.to_string()
    } else {
        format!("{}/{}", prefix, suffix)
    };

    collapse_slashes(&joined)
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// 单个任务的执行状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// 上传成功
    Success,
    /// 上传失败（传输工具退出码, 原因）
    Failed { exit_code: i32, reason: String },
}

impl UploadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadStatus::Success)
    }
}

/// 单个任务的执行结果
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub task: UploadTask,
    pub status: UploadStatus,
}

impl UploadResult {
    pub fn success(task: UploadTask) -> Self {
        UploadResult {
            task,
            status: UploadStatus::Success,
        }
    }

    pub fn failed(task: UploadTask, exit_code: i32, reason: impl Into<String>) -> Self {
        UploadResult {
            task,
            status: UploadStatus::Failed {
                exit_code,
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 转换为报告行
    pub fn to_record(&self) -> UploadRecord {
        let (status, exit_code, reason) = match &self.status {
            UploadStatus::Success => ("success", 0, String::new()),
            UploadStatus::Failed { exit_code, reason } => ("failed", *exit_code, reason.clone()),
        };

        UploadRecord {
            source: self.task.source_path.display().to_string(),
            destination: self.task.destination_key.clone(),
            status,
            exit_code,
            reason,
        }
    }
}

/// CSV 报告中的一行
#[derive(Debug, Serialize)]
pub struct UploadRecord {
    pub source: String,
    pub destination: String,
    pub status: &'static str,
    pub exit_code: i32,
    pub reason: String,
}
