//! # 批量执行状态
//!
//! 调度器独占的计数器（total/completed/failed/active），
//! 只在任务启动或观察到任务完成时修改。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用

use super::task::UploadResult;

/// 批量执行状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchState {
    /// 任务总数
    pub total: usize,
    /// 已完成数量（含失败）
    pub completed: usize,
    /// 失败数量
    pub failed: usize,
    /// 正在执行的数量
    pub active: usize,
}

impl BatchState {
    pub fn new(total: usize) -> Self {
        BatchState {
            total,
            ..Default::default()
        }
    }

    /// 记录一个任务启动
    pub fn launch(&mut self) {
        self.active += 1;
    }

    /// 记录一个任务完成
    pub fn observe(&mut self, result: &UploadResult) {
        self.active = self.active.saturating_sub(1);
        self.completed += 1;
        if !result.is_success() {
            self.failed += 1;
        }
    }

    /// 成功数量
    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }
}

/// 批量执行报告（结果按完成顺序排列）
#[derive(Debug, Default)]
pub struct BatchReport {
    pub state: BatchState,
    pub results: Vec<UploadResult>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.state.failed == 0
    }

    /// 失败的结果
    pub fn failures(&self) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
