//! # 数据模型模块
//!
//! 定义上传任务、执行结果和批量状态。
//!
//! ## 依赖关系
//! - 被 `batch/`, `transfer/` 和 `commands/` 使用
//! - 子模块: task, batch_state

pub mod batch_state;
pub mod task;

pub use batch_state::{BatchReport, BatchState};
pub use task::{join_key, UploadResult, UploadTask};
