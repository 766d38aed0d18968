use std::time::SystemTime;

use async_trait::async_trait;

use drover_model::{TaskId, TaskParams, TaskResponse};

/// One executor per task type.
///
/// `run_once` must not fail: every provider error, bad parameter or publish
/// problem is converted into a `Failed` response at this boundary so the
/// scheduling layer never sees a raw error.
#[async_trait]
pub trait PerpetualTaskExecutor: Send + Sync {
    /// Execute one poll cycle.
    ///
    /// `heartbeat_time` is the start time of the last run that produced a
    /// heartbeat; executors may use it to bound incremental work.
    async fn run_once(
        &self,
        task_id: &TaskId,
        params: &TaskParams,
        heartbeat_time: SystemTime,
    ) -> TaskResponse;

    /// Release per-task state when the task is unassigned. Best-effort; the
    /// task is removed from the running set regardless of the outcome.
    async fn cleanup(&self, _task_id: &TaskId, _params: &TaskParams) -> bool {
        true
    }
}
