//! # 批量执行器
//!
//! 以有限并发执行上传任务，失败不会中断批次。
//!
//! ## 功能
//! - `Counted`：调度线程自己维护计数器，槽位满时等待任意一个任务完成
//! - `Pool`：委托给固定大小的 rayon 线程池，附带进度条
//! - 两种方式的汇总语义一致：任一任务失败即整体失败
//!
//! ## 依赖关系
//! - 被 `commands/upload.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 线程池

use crate::error::{Result, UploadError};
use crate::models::{BatchReport, BatchState, UploadResult, UploadTask};
use crate::utils::{output, progress};

use clap::ValueEnum;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// 默认并发数
pub const DEFAULT_JOBS: usize = 3;

/// 调度策略
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Scheduler {
    /// Launch tasks in order and wait for a free slot, printing progress per completion
    #[default]
    Counted,
    /// Delegate to a fixed-size thread pool with a progress bar
    Pool,
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
    scheduler: Scheduler,
}

impl BatchRunner {
    /// 创建新的批量执行器（`jobs == 0` 时使用 CPU 核数）
    pub fn new(jobs: usize, scheduler: Scheduler) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs, scheduler }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 执行全部任务
    pub fn run<F>(&self, tasks: Vec<UploadTask>, action: F) -> Result<BatchReport>
    where
        F: Fn(&UploadTask) -> UploadResult + Sync + Send,
    {
        match self.scheduler {
            Scheduler::Counted => Ok(self.run_counted(tasks, &action)),
            Scheduler::Pool => self.run_pool(tasks, &action),
        }
    }

    fn run_counted<F>(&self, tasks: Vec<UploadTask>, action: &F) -> BatchReport
    where
        F: Fn(&UploadTask) -> UploadResult + Sync + Send,
    {
        let mut report = BatchReport {
            state: BatchState::new(tasks.len()),
            results: Vec::with_capacity(tasks.len()),
        };

        let (tx, rx) = mpsc::channel::<UploadResult>();

        thread::scope(|scope| {
            for task in tasks {
                while report.state.active >= self.jobs {
                    if !wait_for_completion(&rx, &mut report) {
                        break;
                    }
                }

                report.state.launch();
                let tx = tx.clone();
                scope.spawn(move || {
                    // 接收端在全部任务完成前不会关闭
                    let _ = tx.send(run_guarded(action, task));
                });
            }

            while report.state.active > 0 {
                if !wait_for_completion(&rx, &mut report) {
                    break;
                }
            }
        });

        report
    }

    fn run_pool<F>(&self, tasks: Vec<UploadTask>, action: &F) -> Result<BatchReport>
    where
        F: Fn(&UploadTask) -> UploadResult + Sync + Send,
    {
        let total = tasks.len();
        let pb = progress::create_progress_bar(total as u64, "Uploading");
        let _output = progress::attach_output(&pb);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| UploadError::ThreadPool(e.to_string()))?;

        // 按完成顺序汇总
        let report = Mutex::new(BatchReport {
            state: BatchState::new(total),
            results: Vec::with_capacity(total),
        });

        pool.install(|| {
            tasks.into_par_iter().for_each(|task| {
                let result = run_guarded(action, task);
                pb.inc(1);

                let mut report = report.lock().unwrap_or_else(PoisonError::into_inner);
                report.state.launch();
                report.state.observe(&result);
                if !result.is_success() {
                    pb.set_message(format!("{} failed", report.state.failed));
                }
                report.results.push(result);
            })
        });

        pb.finish_and_clear();

        Ok(report.into_inner().unwrap_or_else(PoisonError::into_inner))
    }
}

/// 等待任意一个任务完成并记录；通道关闭时返回 false
fn wait_for_completion(rx: &Receiver<UploadResult>, report: &mut BatchReport) -> bool {
    match rx.recv() {
        Ok(result) => {
            report.state.observe(&result);
            output::print_progress(&report.state);
            report.results.push(result);
            true
        }
        Err(_) => false,
    }
}

/// 执行单个任务，worker panic 记为失败
fn run_guarded<F>(action: &F, task: UploadTask) -> UploadResult
where
    F: Fn(&UploadTask) -> UploadResult,
{
    match panic::catch_unwind(AssertUnwindSafe(|| action(&task))) {
        Ok(result) => result,
        Err(_) => UploadResult::failed(task, -1, "upload worker panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn make_tasks(n: usize) -> Vec<UploadTask> {
        (1..=n)
            .map(|i| UploadTask::new(format!("/data/{}.nc", i), format!("P/{}.nc", i)))
            .collect()
    }

    /// 记录同时执行的最大任务数
    fn assert_max_in_flight(scheduler: Scheduler, jobs: usize) {
        let in_flight = AtomicUsize::new(0);
        let max_seen = AtomicUsize::new(0);

        let runner = BatchRunner::new(jobs, scheduler);
        let report = runner
            .run(make_tasks(12), |task| {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(15));
                in_flight.fetch_sub(1, Ordering::SeqCst);
                UploadResult::success(task.clone())
            })
            .unwrap();

        assert_eq!(report.state.completed, 12);
        assert_eq!(report.state.active, 0);
        let max = max_seen.load(Ordering::SeqCst);
        assert!(max >= 1 && max <= jobs, "max in flight {} > {}", max, jobs);
    }

    fn fail_even_numbered(task: &UploadTask) -> UploadResult {
        match task.destination_key() {
            "P/2.nc" | "P/4.nc" => UploadResult::failed(task.clone(), 1, "exit status 1"),
            _ => UploadResult::success(task.clone()),
        }
    }

    #[test]
    fn test_counted_respects_parallelism_limit() {
        assert_max_in_flight(Scheduler::Counted, 3);
        assert_max_in_flight(Scheduler::Counted, 1);
    }

    #[test]
    fn test_pool_respects_parallelism_limit() {
        assert_max_in_flight(Scheduler::Pool, 2);
    }

    /// 记录每个任务开始执行的顺序
    fn start_order(jobs: usize, delay: impl Fn(usize) -> u64 + Sync) -> Vec<String> {
        let started = Mutex::new(Vec::new());
        let runner = BatchRunner::new(jobs, Scheduler::Counted);
        runner
            .run(make_tasks(8), |task| {
                let index = {
                    let mut started = started.lock().unwrap();
                    started.push(task.destination_key().to_string());
                    started.len()
                };
                thread::sleep(Duration::from_millis(delay(index)));
                UploadResult::success(task.clone())
            })
            .unwrap();
        started.into_inner().unwrap()
    }

    fn enumeration_keys(n: usize) -> Vec<String> {
        make_tasks(n)
            .iter()
            .map(|t| t.destination_key().to_string())
            .collect()
    }

    #[test]
    fn test_counted_starts_in_enumeration_order_with_one_job() {
        assert_eq!(start_order(1, |_| 2), enumeration_keys(8));
    }

    #[test]
    fn test_counted_starts_in_enumeration_order_with_two_jobs() {
        let expected = enumeration_keys(8);
        let started = start_order(2, |i| if i % 2 == 0 { 25 } else { 5 });

        assert_eq!(started.len(), expected.len());
        // 同一时刻最多两个任务在途，开始位置偏差不超过 jobs - 1
        for (position, key) in started.iter().enumerate() {
            let index = expected.iter().position(|k| k == key).unwrap();
            assert!(
                index.abs_diff(position) <= 1,
                "{} started at {} but was enumerated at {}",
                key,
                position,
                index
            );
        }
    }

    fn completion_keys(scheduler: Scheduler) -> Vec<String> {
        let runner = BatchRunner::new(2, scheduler);
        let report = runner
            .run(make_tasks(2), |task| {
                if task.destination_key() == "P/1.nc" {
                    thread::sleep(Duration::from_millis(150));
                }
                UploadResult::success(task.clone())
            })
            .unwrap();
        report
            .results
            .iter()
            .map(|r| r.task.destination_key().to_string())
            .collect()
    }

    #[test]
    fn test_results_are_in_completion_order() {
        let expected = vec!["P/2.nc".to_string(), "P/1.nc".to_string()];
        assert_eq!(completion_keys(Scheduler::Counted), expected);
        assert_eq!(completion_keys(Scheduler::Pool), expected);
    }

    #[test]
    fn test_pool_routes_output_through_progress_bar() {
        let runner = BatchRunner::new(2, Scheduler::Pool);
        let report = runner
            .run(make_tasks(3), |task| {
                assert!(progress::output_is_attached());
                output::print_transfer("/data/x.nc", task.destination_key());
                UploadResult::success(task.clone())
            })
            .unwrap();

        assert!(report.is_success());
    }

    #[test]
    fn test_counted_fail_soft_accounting() {
        let runner = BatchRunner::new(2, Scheduler::Counted);
        let report = runner.run(make_tasks(5), fail_even_numbered).unwrap();

        assert_eq!(report.state.total, 5);
        assert_eq!(report.state.completed, 5);
        assert_eq!(report.state.succeeded(), 3);
        assert_eq!(report.state.failed, 2);
        assert!(!report.is_success());

        let mut failed: Vec<&str> = report.failures().map(|r| r.task.destination_key()).collect();
        failed.sort();
        assert_eq!(failed, vec!["P/2.nc", "P/4.nc"]);
    }

    #[test]
    fn test_pool_fail_soft_accounting() {
        let runner = BatchRunner::new(2, Scheduler::Pool);
        let report = runner.run(make_tasks(5), fail_even_numbered).unwrap();

        assert_eq!(report.state.total, 5);
        assert_eq!(report.state.succeeded(), 3);
        assert_eq!(report.state.failed, 2);
        assert!(!report.is_success());
    }

    #[test]
    fn test_all_success_is_success() {
        let runner = BatchRunner::new(4, Scheduler::Counted);
        let report = runner
            .run(make_tasks(7), |task| UploadResult::success(task.clone()))
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.results.len(), 7);
    }

    #[test]
    fn test_empty_batch() {
        let runner = BatchRunner::new(3, Scheduler::Counted);
        let report = runner
            .run(Vec::new(), |task| UploadResult::success(task.clone()))
            .unwrap();

        assert_eq!(report.state, BatchState::default());
        assert!(report.is_success());
    }

    #[test]
    fn test_zero_jobs_uses_cpu_count() {
        let runner = BatchRunner::new(0, Scheduler::Counted);
        assert!(runner.jobs() >= 1);
    }

    #[test]
    fn test_panicking_worker_is_recorded_as_failure() {
        let runner = BatchRunner::new(2, Scheduler::Counted);
        let report = runner
            .run(make_tasks(3), |task| {
                if task.destination_key() == "P/2.nc" {
                    panic!("boom");
                }
                UploadResult::success(task.clone())
            })
            .unwrap();

        assert_eq!(report.state.completed, 3);
        assert_eq!(report.state.failed, 1);
    }
}
