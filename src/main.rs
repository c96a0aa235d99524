//! # clms-upload - CLMS 数据产品上传工具
//!
//! 将地理空间数据产品上传到 S3 兼容的对象存储，并附加产品元数据。
//! 实际传输由 rclone 完成。
//!
//! ## 输入模式
//! - `-l` 单个文件
//! - `-d` glob 匹配的多个文件
//! - `-r` 递归目录（保留相对路径）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (任务枚举与并发调度)
//!   │     ├── transfer/  (元数据与 rclone 调用)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod transfer;
mod utils;

use clap::error::ErrorKind;
use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                e.print().ok();
                std::process::exit(error::USAGE_EXIT_CODE);
            }
        },
    };

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(e.exit_code());
    }
}
