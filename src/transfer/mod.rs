//! # 传输模块
//!
//! 单个任务的上传动作：校验可读、计算元数据、调用传输工具。
//!
//! ## 功能
//! - `Transfer` trait：传输工具的抽象（rclone / dry-run / 测试替身）
//! - `UploadAction`：把一个 `UploadTask` 变成一个 `UploadResult`
//! - 本层不做重试
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 使用
//! - 子模块: metadata, rclone, remote

pub mod metadata;
pub mod rclone;
pub mod remote;

pub use metadata::{build_metadata, FileMetadata, DEFAULT_WORKFLOW};
pub use rclone::{DryRunTransfer, RcloneTransfer, DEFAULT_RCLONE_BIN};
pub use remote::{RemoteConfig, DEFAULT_REMOTE};

use crate::error::Result;
use crate::models::{UploadResult, UploadTask};
use crate::utils::output;

use chrono::Utc;
use std::path::Path;

/// 一次传输请求
#[derive(Debug, Clone)]
pub struct TransferRequest<'a> {
    pub source: &'a Path,
    /// 传输工具理解的目标，例如 `CLMS:bucket/prefix/file.nc`
    pub destination: String,
    pub metadata: Vec<(String, String)>,
    /// 目标已存在时跳过
    pub ignore_existing: bool,
}

/// 传输工具的执行结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOutcome {
    pub exit_code: i32,
    /// 工具输出的最后一行错误信息
    pub message: String,
}

/// 传输工具
pub trait Transfer: Send + Sync {
    /// 执行一次复制；只有无法启动工具时才返回 `Err`
    fn copy(&self, request: &TransferRequest<'_>) -> Result<TransferOutcome>;
}

impl<T: Transfer + ?Sized> Transfer for Box<T> {
    fn copy(&self, request: &TransferRequest<'_>) -> Result<TransferOutcome> {
        (**self).copy(request)
    }
}

/// 单次调用内所有任务共享的上传设置
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub remote: RemoteConfig,
    pub workflow: String,
    /// 下游是否可以清理源对象
    pub cleanup_source: bool,
    /// 被取代的旧版本
    pub supersedes: Vec<String>,
    /// 关闭目标已存在检查
    pub overwrite: bool,
}

/// 上传动作
pub struct UploadAction<T: Transfer> {
    transfer: T,
    context: UploadContext,
}

impl<T: Transfer> UploadAction<T> {
    pub fn new(transfer: T, context: UploadContext) -> Self {
        Self { transfer, context }
    }

    #[cfg(test)]
    pub(crate) fn transfer(&self) -> &T {
        &self.transfer
    }

    /// 上传一个任务
    pub fn run(&self, task: &UploadTask) -> UploadResult {
        let source = task.source_path().display().to_string();
        output::print_transfer(&source, task.destination_key());

        let file = match FileMetadata::compute(task.source_path()) {
            Ok(file) => file,
            Err(e) => {
                output::print_error(&format!("Uploading file {}: {}", source, e));
                return UploadResult::failed(task.clone(), 1, e.to_string());
            }
        };

        let request = TransferRequest {
            source: task.source_path(),
            destination: self.context.remote.rclone_target(task.destination_key()),
            metadata: build_metadata(&self.context, task, &file, Utc::now()),
            ignore_existing: !self.context.overwrite,
        };

        match self.transfer.copy(&request) {
            Ok(outcome) if outcome.exit_code == 0 => {
                output::print_success(&format!("Successfully uploaded {}", source));
                UploadResult::success(task.clone())
            }
            Ok(outcome) => {
                let reason = if outcome.message.is_empty() {
                    format!("exit status {}", outcome.exit_code)
                } else {
                    format!("exit status {}: {}", outcome.exit_code, outcome.message)
                };
                output::print_error(&format!("Uploading file {} failed ({})", source, reason));
                UploadResult::failed(task.clone(), outcome.exit_code, reason)
            }
            Err(e) => {
                output::print_error(&format!("Uploading file {}: {}", source, e));
                UploadResult::failed(task.clone(), -1, e.to_string())
            }
        }
    }
}
