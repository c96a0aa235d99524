//! # 文件元数据
//!
//! 计算上传前的文件信息（大小、MD5、修改时间），并组装附加到对象上的元数据。
//!
//! ## 依赖关系
//! - 被 `transfer/mod.rs` 使用
//! - 使用 `md-5` 计算校验和，`chrono` 格式化时间

use super::UploadContext;
use crate::error::{Result, UploadError};
use crate::models::UploadTask;

use chrono::{DateTime, Local, Utc};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 元数据中使用的时间格式（秒级）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 默认工作流标签
pub const DEFAULT_WORKFLOW: &str = "clms_upload";

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// 本地文件信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// 文件大小（字节）
    pub size: u64,
    /// MD5 十六进制摘要
    pub md5: String,
    /// 本地时区的修改时间
    pub last_modified: String,
}

impl FileMetadata {
    /// 读取并计算文件信息
    pub fn compute(path: &Path) -> Result<Self> {
        let read_err = |e: std::io::Error| UploadError::FileReadError {
            path: path.display().to_string(),
            source: e,
        };

        let mut file = File::open(path).map_err(read_err)?;
        let stat = file.metadata().map_err(read_err)?;
        let modified: DateTime<Local> = stat.modified().map_err(read_err)?.into();

        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = file.read(&mut buffer).map_err(read_err)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(FileMetadata {
            size: stat.len(),
            md5: format!("{:x}", hasher.finalize()),
            last_modified: modified.format(TIMESTAMP_FORMAT).to_string(),
        })
    }
}

/// 组装对象元数据（有序键值对）
pub fn build_metadata(
    context: &UploadContext,
    task: &UploadTask,
    file: &FileMetadata,
    uploaded: DateTime<Utc>,
) -> Vec<(String, String)> {
    let mut pairs = vec![
        (
            "uploaded".to_string(),
            uploaded.format(TIMESTAMP_FORMAT).to_string(),
        ),
        ("WorkflowName".to_string(), context.workflow.clone()),
        (
            "source-s3-endpoint-url".to_string(),
            context.remote.endpoint.clone(),
        ),
        ("file-size".to_string(), file.size.to_string()),
        ("md5".to_string(), file.md5.clone()),
        ("last_modified".to_string(), file.last_modified.clone()),
        (
            "s3-public-key".to_string(),
            context.remote.access_key_id.clone(),
        ),
        (
            "source-s3-path".to_string(),
            context.remote.s3_url(task.destination_key()),
        ),
        (
            "source-cleanup".to_string(),
            context.cleanup_source.to_string(),
        ),
    ];

    if !context.supersedes.is_empty() {
        pairs.push(("supersedes".to_string(), context.supersedes.join(",")));
    }

    pairs
}
