use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use async_trait::async_trait;

use drover_model::{
    ClusterSyncParams, ContainerHost, ContainerTask, HostStatus, InstanceInfo, InstanceSyncParams,
    TaskDesiredStatus, VmInstance,
};

use crate::error::DirectoryError;

/// Flat resource listing for the stateless instance-sync executors.
///
/// One implementation per provider; the executor does not care which cloud
/// is behind it as long as it gets a typed snapshot back.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    async fn list_instances(
        &self,
        params: &InstanceSyncParams,
    ) -> Result<Vec<InstanceInfo>, DirectoryError>;
}

/// Container-cluster view backing the stateful cluster-sync executor.
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Container instances in the cluster matching the given registration
    /// statuses.
    async fn list_container_hosts(
        &self,
        params: &ClusterSyncParams,
        statuses: &[HostStatus],
    ) -> Result<Vec<ContainerHost>, DirectoryError>;

    /// Describe the given VMs. Ids unknown to the provider (already reaped)
    /// are silently absent from the result.
    async fn describe_vms(
        &self,
        params: &ClusterSyncParams,
        vm_ids: &BTreeSet<String>,
    ) -> Result<Vec<VmInstance>, DirectoryError>;

    /// service name -> task arns currently associated with it.
    async fn service_task_map(
        &self,
        params: &ClusterSyncParams,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, DirectoryError>;

    /// Tasks in the cluster matching the given desired statuses.
    async fn list_tasks(
        &self,
        params: &ClusterSyncParams,
        desired: &[TaskDesiredStatus],
    ) -> Result<Vec<ContainerTask>, DirectoryError>;

    /// Collect utilization metrics for the window `[from, to]`.
    /// Called at most once per hour per cluster by the sync executor.
    async fn fetch_utilization_metrics(
        &self,
        params: &ClusterSyncParams,
        from: SystemTime,
        to: SystemTime,
    ) -> Result<(), DirectoryError>;
}
