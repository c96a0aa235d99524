//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 参数分组
//! - 输入（三选一）: `-l` 单文件, `-d` glob, `-r` 递归目录
//! - 目标: `-p` 前缀, `-b` bucket, `--remote`
//! - 执行: `-j` 并发数, `--scheduler`, `--dry-run`
//! - 元数据: `--workflow`, `--cleanup-source`, `--supersedes`
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `commands/upload.rs`

use crate::batch::runner::DEFAULT_JOBS;
use crate::batch::Scheduler;
use crate::transfer::{DEFAULT_RCLONE_BIN, DEFAULT_REMOTE, DEFAULT_WORKFLOW};

use clap::{ArgAction, Args, Parser};
use std::path::PathBuf;

/// clms-upload - 上传数据产品到 CLMS 对象存储
#[derive(Parser, Debug)]
#[command(name = "clms-upload")]
#[command(author = "Changjiang Wu")]
#[command(version, disable_version_flag = true)]
#[command(
    about = "Upload data product files to S3-compatible object storage with product metadata",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,

    /// File name filter for recursive mode (comma-separated globs)
    #[arg(short = 'e', long, default_value = "*")]
    pub filter: String,

    /// Destination prefix under which all keys are placed
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Bucket placed in front of the prefix
    #[arg(short = 'b', long, env = "CLMS_UPLOAD_BUCKET")]
    pub bucket: Option<String>,

    /// Number of parallel uploads (0 = number of CPUs)
    #[arg(short = 'j', long, env = "CLMS_UPLOAD_JOBS", default_value_t = DEFAULT_JOBS)]
    pub jobs: usize,

    /// Disable the destination-overwrite check (replace existing objects)
    #[arg(short = 'o', long, default_value_t = false)]
    pub overwrite: bool,

    // ─────────────────────────────────────────────────────────────
    // Remote options
    // ─────────────────────────────────────────────────────────────
    /// rclone remote name
    #[arg(long, env = "CLMS_UPLOAD_REMOTE", default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// rclone configuration file (endpoint and key fallback)
    #[arg(long, env = "RCLONE_CONFIG")]
    pub rclone_config: Option<PathBuf>,

    /// rclone executable
    #[arg(long, env = "RCLONE_BIN", default_value = DEFAULT_RCLONE_BIN)]
    pub rclone_bin: String,

    // ─────────────────────────────────────────────────────────────
    // Metadata options
    // ─────────────────────────────────────────────────────────────
    /// Workflow tag recorded on every object
    #[arg(long, default_value = DEFAULT_WORKFLOW)]
    pub workflow: String,

    /// Mark the source as safe to clean up after ingestion
    #[arg(long, default_value_t = false)]
    pub cleanup_source: bool,

    /// Prior product versions superseded by this upload (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub supersedes: Vec<String>,

    // ─────────────────────────────────────────────────────────────
    // Execution control
    // ─────────────────────────────────────────────────────────────
    /// Scheduling strategy for parallel uploads
    #[arg(long, value_enum, default_value = "counted")]
    pub scheduler: Scheduler,

    /// Write a CSV report of every upload result
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the transfers without running them
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,
}

/// 输入模式参数（最多选择一种）
#[derive(Args, Debug, Default)]
#[group(required = false, multiple = false)]
pub struct InputArgs {
    /// Upload a single local file
    #[arg(short = 'l', long)]
    pub local_file: Option<PathBuf>,

    /// Upload files matching a glob pattern
    #[arg(short = 'd', long, num_args = 1..)]
    pub pattern: Option<Vec<String>>,

    /// Upload a directory tree recursively, preserving relative paths
    #[arg(short = 'r', long)]
    pub root: Option<PathBuf>,
}
