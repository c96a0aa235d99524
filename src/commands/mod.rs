//! # 命令执行模块
//!
//! 实现上传命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `batch/`, `transfer/`, `utils/`
//! - 子模块: upload

pub mod upload;

use crate::cli::Cli;
use crate::error::Result;

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    upload::execute(cli)
}
