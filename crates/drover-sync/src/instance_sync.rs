use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::{debug, warn};

use drover_client::ControlPlaneClient;
use drover_model::{
    ExecutionStatus, InstanceSyncParams, InstanceSyncResult, TaskId, TaskParams, TaskResponse,
    TaskType,
};

use crate::directory::InstanceDirectory;
use crate::executor::PerpetualTaskExecutor;

/// Stateless full-snapshot sync executor.
///
/// One instance per provider variant (VM group, container service,
/// serverless function, SSH host, PaaS app), each wired to its own
/// directory. Every run reports the complete current resource list and the
/// control plane does the comparison; nothing is cached between runs.
pub struct InstanceSyncExecutor {
    task_type: TaskType,
    directory: Arc<dyn InstanceDirectory>,
    client: Arc<dyn ControlPlaneClient>,
}

impl InstanceSyncExecutor {
    pub fn new(
        task_type: TaskType,
        directory: Arc<dyn InstanceDirectory>,
        client: Arc<dyn ControlPlaneClient>,
    ) -> Self {
        Self {
            task_type,
            directory,
            client,
        }
    }

    fn sync_params<'a>(&self, params: &'a TaskParams) -> Option<&'a InstanceSyncParams> {
        if params.task_type() != self.task_type {
            return None;
        }
        match params {
            TaskParams::VmGroupSync(p)
            | TaskParams::ContainerServiceSync(p)
            | TaskParams::ServerlessFunctionSync(p)
            | TaskParams::SshHostSync(p)
            | TaskParams::PaasAppSync(p) => Some(p),
            TaskParams::ClusterSync(_) => None,
        }
    }
}

#[async_trait]
impl PerpetualTaskExecutor for InstanceSyncExecutor {
    async fn run_once(
        &self,
        task_id: &TaskId,
        params: &TaskParams,
        _heartbeat_time: SystemTime,
    ) -> TaskResponse {
        let Some(sync) = self.sync_params(params) else {
            return TaskResponse::failed(format!(
                "unexpected params {} for executor {}",
                params.task_type().as_str(),
                self.task_type.as_str()
            ));
        };

        let result = match self.directory.list_instances(sync).await {
            Ok(instances) => {
                debug!(%task_id, count = instances.len(), "instance listing fetched");
                InstanceSyncResult::success(instances)
            }
            Err(e) => {
                warn!(%task_id, error = %e, "instance listing failed");
                InstanceSyncResult::failed(e.to_string())
            }
        };

        // Publish failures never fail the run; the next cycle re-publishes
        // fresh state anyway.
        if let Err(e) = self
            .client
            .publish_result(task_id, &sync.account_id, &result)
            .await
        {
            warn!(%task_id, error = %e, "result publish failed");
        }

        match result.status {
            ExecutionStatus::Success => TaskResponse::succeeded(format!(
                "synced {} instances",
                result.instances.len()
            )),
            ExecutionStatus::Failed => TaskResponse::failed(
                result
                    .error_message
                    .unwrap_or_else(|| "instance sync failed".to_string()),
            ),
        }
    }
}
