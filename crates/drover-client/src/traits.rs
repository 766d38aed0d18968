use std::collections::BTreeSet;
use std::time::SystemTime;

use async_trait::async_trait;

use drover_model::{ClusterEvent, InstanceSyncResult, TaskContext, TaskId};

use crate::error::ClientError;

/// Control-plane RPC surface used by the worker and the executors.
///
/// The concrete transport is an implementation detail; [`crate::HttpControlPlane`]
/// is the HTTP/JSON one shipped with the agent.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// Current assignment set for this worker identity.
    async fn list_assigned_task_ids(&self, worker_id: &str)
    -> Result<BTreeSet<TaskId>, ClientError>;

    /// Params and schedule for one task, fetched once at assignment.
    async fn get_task_context(&self, task_id: &TaskId) -> Result<TaskContext, ClientError>;

    /// Liveness signal, tagged with the time the run *started*.
    async fn publish_heartbeat(
        &self,
        task_id: &TaskId,
        run_started_at: SystemTime,
    ) -> Result<(), ClientError>;

    /// Full-snapshot result from a stateless instance-sync run.
    async fn publish_result(
        &self,
        task_id: &TaskId,
        account_id: &str,
        result: &InstanceSyncResult,
    ) -> Result<(), ClientError>;
}

/// Sink for cluster lifecycle/description/sync events.
///
/// Publishing is fire-and-forget from the executor's point of view: a failed
/// publish is logged and the next run re-publishes fresh state. Consumers
/// treat delivery as at-least-once.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ClusterEvent) -> Result<(), ClientError>;
}
