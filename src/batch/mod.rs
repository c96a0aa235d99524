//! # 批量处理模块
//!
//! 枚举上传任务并以有限并发执行。
//!
//! ## 功能
//! - 三种输入模式（单文件/glob/递归目录）
//! - 并发上限控制
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 使用
//! - 使用 `rayon` 进行线程池调度
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{InputMode, TaskCollector};
pub use runner::{BatchRunner, Scheduler};
