use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use drover_client::ControlPlaneClient;
use drover_model::{TaskId, TaskType};
use drover_sync::ExecutorRegistry;

use crate::backoff::RpcBackoff;
use crate::lifecycle::TaskLifecycle;

struct RunningTask {
    task_type: TaskType,
    lifecycle: Arc<TaskLifecycle>,
    cancel: CancellationToken,
    // Kept so an in-flight run is not detached silently; the job exits on
    // its own once the cancel token fires.
    _handle: JoinHandle<()>,
}

/// Top-level scheduling loop.
///
/// Keeps the set of locally running tasks equal to the set assigned by the
/// control plane. Each running task is an independent fixed-delay job:
/// successive runs of one task are serialized, runs of different tasks are
/// concurrent. The reconciliation tick itself runs under [`RpcBackoff`].
pub struct PerpetualTaskWorker {
    worker_id: String,
    client: Arc<dyn ControlPlaneClient>,
    registry: Arc<ExecutorRegistry>,
    running: tokio::sync::Mutex<HashMap<TaskId, RunningTask>>,
    backoff: Mutex<RpcBackoff>,
}

impl PerpetualTaskWorker {
    pub fn new(
        worker_id: impl Into<String>,
        client: Arc<dyn ControlPlaneClient>,
        registry: Arc<ExecutorRegistry>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            client,
            registry,
            running: tokio::sync::Mutex::new(HashMap::new()),
            backoff: Mutex::new(RpcBackoff::default()),
        }
    }

    pub fn with_backoff(mut self, backoff: RpcBackoff) -> Self {
        self.backoff = Mutex::new(backoff);
        self
    }

    /// Ids of the currently running tasks.
    pub async fn running_task_ids(&self) -> BTreeSet<TaskId> {
        let running = self.running.lock().await;
        running.keys().cloned().collect()
    }

    /// Delay until the next reconciliation tick.
    pub fn reconcile_delay(&self) -> std::time::Duration {
        self.backoff.lock().unwrap().delay()
    }

    /// Run the reconciliation loop until `shutdown` fires, then stop every
    /// running task.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(worker_id = %self.worker_id, "perpetual task worker started");
        loop {
            self.tick().await;
            let delay = self.reconcile_delay();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        self.stop_all().await;
        info!(worker_id = %self.worker_id, "perpetual task worker stopped");
    }

    /// One reconciliation pass: fetch assignment, stop removed tasks, start
    /// newly assigned ones.
    #[instrument(level = "debug", skip(self), fields(worker_id = %self.worker_id))]
    pub async fn tick(&self) {
        let assigned = match self.client.list_assigned_task_ids(&self.worker_id).await {
            Ok(assigned) => assigned,
            // A failed fetch aborts the tick without touching running state.
            Err(e) if e.is_transport() => {
                self.backoff.lock().unwrap().record_failure();
                warn!(error = %e, "assignment fetch failed; backing off");
                return;
            }
            Err(e) => {
                warn!(error = %e, "assignment fetch rejected");
                return;
            }
        };

        self.stop_cancelled(&assigned).await;
        let transport_clean = self.start_assigned(&assigned).await;

        let mut backoff = self.backoff.lock().unwrap();
        if transport_clean {
            backoff.record_success();
        } else {
            backoff.record_failure();
        }
    }

    async fn stop_cancelled(&self, assigned: &BTreeSet<TaskId>) {
        let removed: Vec<(TaskId, RunningTask)> = {
            let mut running = self.running.lock().await;
            let cancelled: Vec<TaskId> = running
                .keys()
                .filter(|id| !assigned.contains(id))
                .cloned()
                .collect();
            cancelled
                .into_iter()
                .filter_map(|id| running.remove(&id).map(|task| (id, task)))
                .collect()
        };

        for (task_id, task) in removed {
            info!(%task_id, task_type = task.task_type.as_str(), "stopping unassigned task");
            task.cancel.cancel();
            // Cleanup failures are logged inside; the task is already out of
            // the running map either way.
            task.lifecycle.stop().await;
        }
    }

    async fn start_assigned(&self, assigned: &BTreeSet<TaskId>) -> bool {
        let mut transport_clean = true;

        for task_id in assigned {
            if self.running.lock().await.contains_key(task_id) {
                continue;
            }

            let context = match self.client.get_task_context(task_id).await {
                Ok(context) => context,
                Err(e) => {
                    if e.is_transport() {
                        transport_clean = false;
                    }
                    warn!(%task_id, error = %e, "context fetch failed; task not started");
                    continue;
                }
            };

            // Resolved once here; later runs reuse the cached executor.
            let task_type = context.params.task_type();
            let Some(executor) = self.registry.resolve(task_type) else {
                warn!(%task_id, task_type = task_type.as_str(), "no executor registered");
                continue;
            };

            let lifecycle = Arc::new(TaskLifecycle::new(
                task_id.clone(),
                context,
                executor,
                Arc::clone(&self.client),
            ));
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(run_schedule(Arc::clone(&lifecycle), cancel.clone()));

            let mut running = self.running.lock().await;
            running.insert(
                task_id.clone(),
                RunningTask {
                    task_type,
                    lifecycle,
                    cancel,
                    _handle: handle,
                },
            );
            info!(%task_id, task_type = task_type.as_str(), "task started");
        }

        transport_clean
    }

    async fn stop_all(&self) {
        let all: BTreeSet<TaskId> = BTreeSet::new();
        self.stop_cancelled(&all).await;
    }
}

/// Fixed-delay repeating job for one task: the next run is scheduled only
/// after the previous one completes, with zero initial delay.
async fn run_schedule(lifecycle: Arc<TaskLifecycle>, cancel: CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        lifecycle.run_once().await;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(lifecycle.interval()) => {}
        }
    }
}
