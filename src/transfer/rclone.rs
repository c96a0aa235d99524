//! # rclone 传输实现
//!
//! 以子进程方式调用 `rclone copyto`，重试与校验全部交给 rclone 本身。
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 创建
//! - 实现 `transfer::Transfer`

use super::{Transfer, TransferOutcome, TransferRequest};
use crate::error::{Result, UploadError};
use crate::utils::output;

use std::io::ErrorKind;
use std::process::{Command, Stdio};

/// 默认 rclone 可执行文件
pub const DEFAULT_RCLONE_BIN: &str = "rclone";

/// 高层重试次数
pub const RETRIES: u32 = 20;
/// 底层重试次数
pub const LOW_LEVEL_RETRIES: u32 = 20;

/// rclone 子进程传输
pub struct RcloneTransfer {
    bin: String,
}

impl RcloneTransfer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// 检测 rclone 是否可用
    pub fn detect(&self) -> Result<()> {
        let status = Command::new(&self.bin)
            .arg("version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(_) => Err(UploadError::TransferToolNotFound {
                command: self.bin.clone(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::TransferToolNotFound {
                command: self.bin.clone(),
            }),
            Err(e) => Err(UploadError::TransferSpawnError {
                command: self.bin.clone(),
                source: e,
            }),
        }
    }
}

impl Transfer for RcloneTransfer {
    fn copy(&self, request: &TransferRequest<'_>) -> Result<TransferOutcome> {
        let output = Command::new(&self.bin)
            .arg("copyto")
            .arg(request.source)
            .arg(&request.destination)
            .args(flag_args(request))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| UploadError::TransferSpawnError {
                command: self.bin.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim()
            .to_string();

        Ok(TransferOutcome {
            // 被信号终止时没有退出码
            exit_code: output.status.code().unwrap_or(-1),
            message,
        })
    }
}

/// 只打印命令、不执行的传输
pub struct DryRunTransfer {
    bin: String,
}

impl DryRunTransfer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

impl Transfer for DryRunTransfer {
    fn copy(&self, request: &TransferRequest<'_>) -> Result<TransferOutcome> {
        output::print_info(&format!(
            "[DRY] {} copyto {} {} {}",
            self.bin,
            request.source.display(),
            request.destination,
            flag_args(request).join(" ")
        ));
        Ok(TransferOutcome::default())
    }
}

/// `copyto SRC DST` 之后的全部参数
pub fn flag_args(request: &TransferRequest<'_>) -> Vec<String> {
    let mut args = vec![
        "--s3-no-check-bucket".to_string(),
        format!("--retries={}", RETRIES),
        format!("--low-level-retries={}", LOW_LEVEL_RETRIES),
        "--checksum".to_string(),
        "--s3-use-multipart-uploads=false".to_string(),
        "--metadata".to_string(),
    ];

    if request.ignore_existing {
        args.push("--ignore-existing".to_string());
    }

    for (key, value) in &request.metadata {
        args.push("--metadata-set".to_string());
        args.push(format!("{}={}", key, value));
    }

    args
}
