//! # 美化输出工具
//!
//! 提供统一的终端输出样式。
//!
//! ## 依赖关系
//! - 被 `commands/`, `batch/`, `transfer/` 模块使用
//! - 使用 `colored` crate
//! - 进度条显示期间经 `utils/progress.rs` 暂停后再打印

use crate::models::BatchState;
use crate::utils::progress;

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    progress::suspend_for_output(|| println!("{} {}", "[OK]".green().bold(), msg));
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    progress::suspend_for_output(|| eprintln!("{} {}", "[ERR]".red().bold(), msg));
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    progress::suspend_for_output(|| println!("{} {}", "[WARN]".yellow().bold(), msg));
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印上传开始消息
pub fn print_transfer(from: &str, to: &str) {
    progress::suspend_for_output(|| {
        println!(
            "{} {} {} {}",
            "[UP]".cyan().bold(),
            from.dimmed(),
            "->".cyan(),
            to
        )
    });
}

/// 打印批量进度（每完成一个任务一次）
pub fn print_progress(state: &BatchState) {
    let failed = if state.failed > 0 {
        state.failed.to_string().red().to_string()
    } else {
        state.failed.to_string()
    };
    println!(
        "{} [{}/{}] failed: {}, active: {}",
        "[..]".dimmed(),
        state.completed,
        state.total,
        failed,
        state.active
    );
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}
