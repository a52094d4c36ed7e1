//! Parallel feature execution
//!
//! Fans worker tasks out over a bounded pool and collects their results in
//! completion order.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::FeatureWorker;
use crate::config::RunnerConfig;
use crate::models::{RunStatistics, TaskResult, WorkerAssignment};
use crate::utils::Timer;

/// Outcome of a complete parallel run
#[derive(Clone, Debug)]
pub struct ExecutionReport {
    /// One result per assignment, in completion order
    pub results: Vec<TaskResult>,
    pub wall_clock: Duration,
    pub statistics: RunStatistics,
}

impl ExecutionReport {
    pub fn all_passed(&self) -> bool {
        self.statistics.all_passed()
    }
}

/// Parallel feature executor
pub struct ParallelExecutor {
    worker: FeatureWorker,
    max_concurrent: usize,
}

impl ParallelExecutor {
    pub fn new(config: Arc<RunnerConfig>, max_concurrent: usize) -> Self {
        Self {
            worker: FeatureWorker::new(config),
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run every assignment, calling `on_result(result, completed, total)` as
    /// each one finishes. Individual failures never abort the run.
    pub async fn run<F>(&self, assignments: Vec<WorkerAssignment>, mut on_result: F) -> ExecutionReport
    where
        F: FnMut(&TaskResult, usize, usize),
    {
        let total = assignments.len();
        info!(
            "Dispatching {} features across {} workers",
            total, self.max_concurrent
        );

        let timer = Timer::start("parallel execution");
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut pending = FuturesUnordered::new();

        for assignment in assignments {
            let semaphore = semaphore.clone();
            let worker = self.worker.clone();
            let task = assignment.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                worker.run(&task).await
            });

            pending.push(async move { (assignment, handle.await) });
        }

        let mut results: Vec<TaskResult> = Vec::with_capacity(total);

        while let Some((assignment, joined)) = pending.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Worker task for {} aborted: {}", assignment.feature, e);
                    TaskResult::error(&assignment, format!("Worker task aborted: {e}"))
                }
            };

            debug!("Collected {}", result);
            results.push(result);
            if let Some(last) = results.last() {
                on_result(last, results.len(), total);
            }
        }

        let wall_clock = timer.stop();
        let statistics = RunStatistics::compute(&results, wall_clock);

        info!(
            "Parallel execution completed in {}ms - Pass: {}/{} ({:.1}%)",
            wall_clock.as_millis(),
            statistics.passed_features,
            statistics.total_features,
            statistics.success_rate()
        );

        ExecutionReport {
            results,
            wall_clock,
            statistics,
        }
    }
}
