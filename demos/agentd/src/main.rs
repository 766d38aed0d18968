//! Minimal perpetual-task agent: wires the HTTP control-plane client, the
//! executor registry and the worker loop. Real deployments replace
//! [`NullDirectory`] with provider SDK integrations.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use drover_client::{HttpControlPlane, worker_id};
use drover_model::{
    ClusterSyncParams, ContainerHost, ContainerTask, HostStatus, InstanceInfo, InstanceSyncParams,
    TaskDesiredStatus, TaskType, VmInstance,
};
use drover_observe::{LoggerConfig, logger_init};
use drover_sync::{
    ClusterDirectory, ClusterSyncExecutor, DirectoryError, ExecutorRegistry, InstanceDirectory,
    InstanceSyncExecutor,
};
use drover_worker::PerpetualTaskWorker;

/// Placeholder directory that reports empty snapshots.
struct NullDirectory;

#[async_trait]
impl InstanceDirectory for NullDirectory {
    async fn list_instances(
        &self,
        _params: &InstanceSyncParams,
    ) -> Result<Vec<InstanceInfo>, DirectoryError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl ClusterDirectory for NullDirectory {
    async fn list_container_hosts(
        &self,
        _params: &ClusterSyncParams,
        _statuses: &[HostStatus],
    ) -> Result<Vec<ContainerHost>, DirectoryError> {
        Ok(Vec::new())
    }

    async fn describe_vms(
        &self,
        _params: &ClusterSyncParams,
        _vm_ids: &BTreeSet<String>,
    ) -> Result<Vec<VmInstance>, DirectoryError> {
        Ok(Vec::new())
    }

    async fn service_task_map(
        &self,
        _params: &ClusterSyncParams,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, DirectoryError> {
        Ok(BTreeMap::new())
    }

    async fn list_tasks(
        &self,
        _params: &ClusterSyncParams,
        _desired: &[TaskDesiredStatus],
    ) -> Result<Vec<ContainerTask>, DirectoryError> {
        Ok(Vec::new())
    }

    async fn fetch_utilization_metrics(
        &self,
        _params: &ClusterSyncParams,
        _from: SystemTime,
        _to: SystemTime,
    ) -> Result<(), DirectoryError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = std::env::var("DROVER_LOG").unwrap_or_else(|_| "info".to_string());
    let format = std::env::var("DROVER_LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string())
        .parse()?;
    logger_init(&LoggerConfig {
        format,
        level,
        with_targets: true,
    })?;

    let endpoint =
        std::env::var("DROVER_ENDPOINT").unwrap_or_else(|_| "http://localhost:7100".to_string());
    let plane = Arc::new(HttpControlPlane::new(endpoint));
    let directory = Arc::new(NullDirectory);

    let mut registry = ExecutorRegistry::new();
    for task_type in [
        TaskType::VmGroupSync,
        TaskType::ContainerServiceSync,
        TaskType::ServerlessFunctionSync,
        TaskType::SshHostSync,
        TaskType::PaasAppSync,
    ] {
        registry = registry.register(
            task_type,
            Arc::new(InstanceSyncExecutor::new(
                task_type,
                directory.clone(),
                plane.clone(),
            )),
        );
    }
    registry = registry.register(
        TaskType::ClusterSync,
        Arc::new(ClusterSyncExecutor::new(directory.clone(), plane.clone())),
    );

    let worker = Arc::new(PerpetualTaskWorker::new(
        worker_id(),
        plane,
        Arc::new(registry),
    ));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    worker.run(shutdown).await;
    Ok(())
}
