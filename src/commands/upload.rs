//! # upload 命令实现
//!
//! 校验配置 → 枚举任务 → 有限并发上传 → 汇总报告。
//!
//! ## 功能
//! - 三种输入模式的选择与校验
//! - rclone 检测（`--dry-run` 时跳过）
//! - 失败汇总表格与 CSV 报告
//!
//! ## 依赖关系
//! - 使用 `cli/mod.rs` 定义的参数
//! - 使用 `batch/`, `transfer/`, `utils/output.rs`

use crate::batch::{BatchRunner, InputMode, TaskCollector};
use crate::cli::Cli;
use crate::error::{Result, UploadError};
use crate::models::BatchReport;
use crate::transfer::{
    DryRunTransfer, RcloneTransfer, RemoteConfig, Transfer, UploadAction, UploadContext,
};
use crate::utils::output;

use std::fs::File;
use std::path::Path;
use tabled::{Table, Tabled};

/// 失败汇总中最多显示的行数
const MAX_FAILURE_ROWS: usize = 10;

/// 失败结果行
#[derive(Debug, Clone, Tabled)]
struct FailureRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Exit")]
    exit_code: i32,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// 执行 upload 命令
pub fn execute(cli: Cli) -> Result<()> {
    output::print_header("CLMS Product Upload");

    // 配置错误先于一切
    let prefix = destination_prefix(&cli)?;
    let mode = input_mode(&cli)?;

    let transfer: Box<dyn Transfer> = if cli.dry_run {
        output::print_warning("Dry run: no data will be transferred");
        Box::new(DryRunTransfer::new(cli.rclone_bin.clone()))
    } else {
        let rclone = RcloneTransfer::new(cli.rclone_bin.clone());
        rclone.detect()?;
        Box::new(rclone)
    };

    let remote = RemoteConfig::resolve(
        &cli.remote,
        cli.bucket.clone(),
        cli.rclone_config.as_deref(),
    );
    warn_missing_remote_values(&remote);

    let context = UploadContext {
        remote,
        workflow: cli.workflow.clone(),
        cleanup_source: cli.cleanup_source,
        supersedes: cli
            .supersedes
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        overwrite: cli.overwrite,
    };

    let action = UploadAction::new(transfer, context);
    let runner = BatchRunner::new(cli.jobs, cli.scheduler);

    run_batch(
        &TaskCollector::new(mode, prefix),
        &runner,
        &action,
        cli.report.as_deref(),
    )
    .map(|_| ())
}

/// 枚举并执行一个批次，任一任务失败返回 `UploadsFailed`
pub fn run_batch<T: Transfer>(
    collector: &TaskCollector,
    runner: &BatchRunner,
    action: &UploadAction<T>,
    report_path: Option<&Path>,
) -> Result<BatchReport> {
    let tasks = collector.collect()?;
    output::print_info(&format!(
        "Found {} file(s), uploading with {} parallel job(s)",
        tasks.len(),
        runner.jobs()
    ));

    let report = runner.run(tasks, |task| action.run(task))?;

    if let Some(path) = report_path {
        write_report(path, &report)?;
        output::print_info(&format!("Report written to {}", path.display()));
    }

    print_summary(&report);

    if report.is_success() {
        Ok(report)
    } else {
        Err(UploadError::UploadsFailed {
            failed: report.state.failed,
            total: report.state.total,
        })
    }
}

/// 目标前缀（必需）
fn destination_prefix(cli: &Cli) -> Result<String> {
    match cli.prefix.as_deref().map(str::trim) {
        Some(prefix) if !prefix.is_empty() => Ok(prefix.to_string()),
        _ => Err(UploadError::MissingPrefix),
    }
}

/// 选择输入模式（恰好一种）
fn input_mode(cli: &Cli) -> Result<InputMode> {
    let input = &cli.input;
    let selected = [
        input.local_file.is_some(),
        input.pattern.is_some(),
        input.root.is_some(),
    ]
    .iter()
    .filter(|s| **s)
    .count();

    if selected > 1 {
        return Err(UploadError::InvalidArgument(
            "only one of -l, -d and -r may be used".to_string(),
        ));
    }

    if let Some(path) = &input.local_file {
        Ok(InputMode::Single(path.clone()))
    } else if let Some(patterns) = &input.pattern {
        Ok(InputMode::Multiple(patterns.clone()))
    } else if let Some(root) = &input.root {
        Ok(InputMode::Recursive {
            root: root.clone(),
            filter: cli.filter.clone(),
        })
    } else {
        Err(UploadError::NoModeSelected)
    }
}

fn warn_missing_remote_values(remote: &RemoteConfig) {
    if remote.endpoint.is_empty() {
        output::print_warning(&format!(
            "No endpoint configured for remote '{}'; metadata will be empty",
            remote.remote
        ));
    }
    if remote.access_key_id.is_empty() {
        output::print_warning(&format!(
            "No access key configured for remote '{}'; metadata will be empty",
            remote.remote
        ));
    }
}

/// 写出 CSV 报告
fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file = File::create(path).map_err(|e| UploadError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut wtr = csv::Writer::from_writer(file);
    for result in &report.results {
        wtr.serialize(result.to_record())?;
    }
    wtr.flush().map_err(|e| UploadError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 打印汇总
fn print_summary(report: &BatchReport) {
    let state = &report.state;
    output::print_separator();

    if report.is_success() {
        output::print_done(&format!(
            "All {} upload(s) completed successfully",
            state.total
        ));
        return;
    }

    output::print_error(&format!(
        "Batch complete: {} total, {} succeeded, {} failed",
        state.total,
        state.succeeded(),
        state.failed
    ));

    let rows: Vec<FailureRow> = report
        .failures()
        .take(MAX_FAILURE_ROWS)
        .map(|r| {
            let record = r.to_record();
            FailureRow {
                source: record.source,
                destination: record.destination,
                exit_code: record.exit_code,
                reason: record.reason,
            }
        })
        .collect();

    println!("{}", Table::new(&rows));
    if state.failed > MAX_FAILURE_ROWS {
        output::print_warning(&format!("  ... and {} more", state.failed - MAX_FAILURE_ROWS));
    }
}
