use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use drover_client::ControlPlaneClient;
use drover_model::{TaskContext, TaskId};
use drover_sync::PerpetualTaskExecutor;

/// Per-task run wrapper: one instance per running task.
///
/// Enforces the schedule's wall-clock timeout around each executor run and
/// publishes a heartbeat on success. The timeout is a soft deadline: an
/// executor that ignores cancellation keeps running detached while the next
/// tick fires at the normal interval.
pub struct TaskLifecycle {
    task_id: TaskId,
    context: TaskContext,
    executor: Arc<dyn PerpetualTaskExecutor>,
    client: Arc<dyn ControlPlaneClient>,
    last_heartbeat: Mutex<SystemTime>,
}

impl TaskLifecycle {
    pub fn new(
        task_id: TaskId,
        context: TaskContext,
        executor: Arc<dyn PerpetualTaskExecutor>,
        client: Arc<dyn ControlPlaneClient>,
    ) -> Self {
        Self {
            task_id,
            context,
            executor,
            client,
            last_heartbeat: Mutex::new(UNIX_EPOCH),
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn interval(&self) -> Duration {
        self.context.schedule.interval()
    }

    /// Execute one run under the task's timeout.
    pub async fn run_once(&self) {
        let started = SystemTime::now();
        let heartbeat = *self.last_heartbeat.lock().unwrap();

        let run = self
            .executor
            .run_once(&self.task_id, &self.context.params, heartbeat);

        match tokio::time::timeout(self.context.schedule.timeout(), run).await {
            Ok(response) if response.is_success() => {
                // Heartbeat carries the run *start* time so staleness
                // detection reflects execution latency.
                match self.client.publish_heartbeat(&self.task_id, started).await {
                    Ok(()) => {
                        debug!(task_id = %self.task_id, "heartbeat published");
                        *self.last_heartbeat.lock().unwrap() = started;
                    }
                    Err(e) => {
                        warn!(task_id = %self.task_id, error = %e, "heartbeat publish failed")
                    }
                }
            }
            Ok(response) => {
                warn!(
                    task_id = %self.task_id,
                    code = response.code,
                    message = %response.message,
                    "task run failed"
                );
            }
            Err(_) => {
                warn!(
                    task_id = %self.task_id,
                    timeout_ms = self.context.schedule.timeout_ms,
                    "task run timed out"
                );
            }
        }
    }

    /// Best-effort cleanup when the task is unassigned.
    pub async fn stop(&self) {
        let ok = self
            .executor
            .cleanup(&self.task_id, &self.context.params)
            .await;
        if ok {
            debug!(task_id = %self.task_id, "task cleanup completed");
        } else {
            warn!(task_id = %self.task_id, "task cleanup reported failure");
        }
    }
}
