//! # 进度条工具
//!
//! 封装 `indicatif` 提供统一的进度条样式。
//!
//! ## 功能
//! - `create_progress_bar`：标准样式的进度条
//! - `attach_output`：进度条存在期间，`utils/output.rs` 的输出先暂停进度条再打印
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `utils/output.rs` 使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// 当前接管输出的进度条（后注册者优先）
static ATTACHED: Mutex<Vec<(usize, ProgressBar)>> = Mutex::new(Vec::new());
static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// 创建标准进度条
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// 进度条接管输出的期间；drop 时解除
pub struct OutputGuard {
    id: usize,
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        let mut attached = ATTACHED.lock().unwrap_or_else(PoisonError::into_inner);
        attached.retain(|(id, _)| *id != self.id);
    }
}

/// 让终端输出绕开进度条的重绘
pub fn attach_output(pb: &ProgressBar) -> OutputGuard {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    ATTACHED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push((id, pb.clone()));
    OutputGuard { id }
}

/// 执行一次输出；有进度条时先暂停它
pub fn suspend_for_output<R>(f: impl FnOnce() -> R) -> R {
    let current = ATTACHED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .last()
        .map(|(_, pb)| pb.clone());

    match current {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}

#[cfg(test)]
pub(crate) fn output_is_attached() -> bool {
    !ATTACHED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .is_empty()
}
