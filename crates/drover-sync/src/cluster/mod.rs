mod diff;
pub use diff::{ClusterDiff, diff_cluster};

mod metrics;
use metrics::metrics_window;

mod store;
pub use store::InstanceCacheStore;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use drover_client::EventPublisher;
use drover_model::{
    ClusterEvent, ClusterSyncParams, HostStatus, TaskDesiredStatus, TaskId, TaskParams,
    TaskResponse,
};

use crate::directory::ClusterDirectory;
use crate::error::DirectoryError;
use crate::executor::PerpetualTaskExecutor;

const HOST_STATUSES: &[HostStatus] = &[HostStatus::Active, HostStatus::Draining];
const TASK_STATUSES: &[TaskDesiredStatus] = &[TaskDesiredStatus::Running, TaskDesiredStatus::Stopped];

/// Stateful container-cluster sync: reconstructs start/stop transitions from
/// repeated point-in-time snapshots and keeps one cache entry per cluster.
///
/// Cache mutation is single-writer per key: the assignment service gives a
/// cluster to exactly one worker, and within a worker a task's runs are
/// serialized by the fixed-delay schedule.
pub struct ClusterSyncExecutor {
    directory: Arc<dyn ClusterDirectory>,
    publisher: Arc<dyn EventPublisher>,
    store: InstanceCacheStore,
}

impl ClusterSyncExecutor {
    pub fn new(directory: Arc<dyn ClusterDirectory>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            directory,
            publisher,
            store: InstanceCacheStore::new(),
        }
    }

    pub fn store(&self) -> &InstanceCacheStore {
        &self.store
    }

    async fn sync_cluster(
        &self,
        params: &ClusterSyncParams,
        heartbeat_time: SystemTime,
    ) -> Result<usize, DirectoryError> {
        let cache = self.store.snapshot(&params.cluster_id);

        let hosts = self
            .directory
            .list_container_hosts(params, HOST_STATUSES)
            .await?;

        // Previously active VMs are always re-queried even when absent from
        // the current host listing, so terminated-but-not-yet-reaped VMs are
        // still detectable.
        let mut vm_ids: BTreeSet<String> = hosts.iter().map(|h| h.vm_id.clone()).collect();
        vm_ids.extend(cache.active_vm_ids.iter().cloned());

        let vms = self.directory.describe_vms(params, &vm_ids).await?;
        let service_tasks = self.directory.service_task_map(params).await?;
        let tasks = self.directory.list_tasks(params, TASK_STATUSES).await?;

        let now = SystemTime::now();
        let mut diff = diff_cluster(
            &params.cluster_id,
            &cache,
            &hosts,
            &vms,
            &service_tasks,
            &tasks,
            now,
        );
        let event_count = diff.events.len();

        for event in &diff.events {
            if let Err(e) = self.publisher.publish(event).await {
                warn!(cluster_id = %params.cluster_id, error = %e, "event publish failed");
            }
        }
        if let Err(e) = self.publisher.publish(&ClusterEvent::Sync(diff.sync.clone())).await {
            warn!(cluster_id = %params.cluster_id, error = %e, "sync event publish failed");
        }

        if let Some((from, to)) =
            metrics_window(cache.metrics_collected_till_hour, heartbeat_time, now)
        {
            match self.directory.fetch_utilization_metrics(params, from, to).await {
                Ok(()) => {
                    debug!(cluster_id = %params.cluster_id, "utilization metrics collected");
                    diff.cache.metrics_collected_till_hour = to;
                }
                // Watermark stays put; the next hour tick retries the window.
                Err(e) => {
                    warn!(cluster_id = %params.cluster_id, error = %e, "metrics collection failed")
                }
            }
        }

        self.store.replace(&params.cluster_id, diff.cache);

        info!(
            cluster_id = %params.cluster_id,
            events = event_count,
            "cluster sync completed"
        );
        Ok(event_count)
    }
}

#[async_trait]
impl PerpetualTaskExecutor for ClusterSyncExecutor {
    async fn run_once(
        &self,
        task_id: &TaskId,
        params: &TaskParams,
        heartbeat_time: SystemTime,
    ) -> TaskResponse {
        let TaskParams::ClusterSync(params) = params else {
            return TaskResponse::failed(format!(
                "unexpected params {} for cluster sync",
                params.task_type().as_str()
            ));
        };

        match self.sync_cluster(params, heartbeat_time).await {
            Ok(events) => TaskResponse::succeeded(format!("published {} events", events)),
            Err(e) => {
                warn!(%task_id, cluster_id = %params.cluster_id, error = %e, "cluster sync failed");
                TaskResponse::failed(e.to_string())
            }
        }
    }

    /// Drops the cluster's cache entry so a re-assignment elsewhere starts
    /// from a clean cold-start diff.
    async fn cleanup(&self, _task_id: &TaskId, params: &TaskParams) -> bool {
        match params {
            TaskParams::ClusterSync(p) => self.store.invalidate(&p.cluster_id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;
    use std::time::{Duration, UNIX_EPOCH};

    use drover_client::ClientError;
    use drover_model::{ContainerHost, ContainerTask, Credentials, TaskState, VmInstance};

    use super::*;

    #[derive(Default)]
    struct FakeDirectory {
        hosts: Vec<ContainerHost>,
        vms: Vec<VmInstance>,
        tasks: Vec<ContainerTask>,
        fail_hosts: bool,
        metric_calls: Mutex<Vec<(SystemTime, SystemTime)>>,
        vm_queries: Mutex<Vec<BTreeSet<String>>>,
    }

    #[async_trait]
    impl ClusterDirectory for FakeDirectory {
        async fn list_container_hosts(
            &self,
            _params: &ClusterSyncParams,
            _statuses: &[HostStatus],
        ) -> Result<Vec<ContainerHost>, DirectoryError> {
            if self.fail_hosts {
                return Err(DirectoryError::Provider("cluster not found".to_string()));
            }
            Ok(self.hosts.clone())
        }

        async fn describe_vms(
            &self,
            _params: &ClusterSyncParams,
            vm_ids: &BTreeSet<String>,
        ) -> Result<Vec<VmInstance>, DirectoryError> {
            self.vm_queries.lock().unwrap().push(vm_ids.clone());
            Ok(self
                .vms
                .iter()
                .filter(|vm| vm_ids.contains(&vm.vm_id))
                .cloned()
                .collect())
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
            Ok(self.tasks.clone())
        }

        async fn fetch_utilization_metrics(
            &self,
            _params: &ClusterSyncParams,
            from: SystemTime,
            to: SystemTime,
        ) -> Result<(), DirectoryError> {
            self.metric_calls.lock().unwrap().push((from, to));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<ClusterEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: &ClusterEvent) -> Result<(), ClientError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(ClientError::Rejected("stream unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn params() -> TaskParams {
        TaskParams::ClusterSync(ClusterSyncParams {
            account_id: "acct-1".to_string(),
            cluster_id: "cluster-a".to_string(),
            region: "us-east-1".to_string(),
            credentials: Credentials {
                access_key: "AK".to_string(),
                secret: "shh".to_string(),
            },
        })
    }

    fn vm(id: &str, state: &str) -> VmInstance {
        VmInstance {
            vm_id: id.to_string(),
            state_name: state.to_string(),
            launched_at: UNIX_EPOCH + Duration::from_secs(100),
            instance_type: "m5.large".to_string(),
            capacity_reservation_id: None,
            spot_request_id: None,
            lifecycle: "on-demand".to_string(),
        }
    }

    fn host(arn: &str, vm_id: &str) -> ContainerHost {
        ContainerHost {
            arn: arn.to_string(),
            vm_id: vm_id.to_string(),
            registered_at: UNIX_EPOCH + Duration::from_secs(100),
            cpu: 2048,
            memory_mb: 4096,
            os_type: Some("linux".to_string()),
        }
    }

    #[tokio::test]
    async fn run_publishes_events_and_updates_cache() {
        let directory = Arc::new(FakeDirectory {
            hosts: vec![host("arn:host/1", "i-1")],
            vms: vec![vm("i-1", "running")],
            ..FakeDirectory::default()
        });
        let publisher = Arc::new(RecordingPublisher::default());
        let executor = ClusterSyncExecutor::new(directory.clone(), publisher.clone());

        let response = executor
            .run_once(&TaskId::from("t-1"), &params(), SystemTime::now())
            .await;

        assert_eq!(response.state, TaskState::Succeeded);

        let events = publisher.events.lock().unwrap();
        // host start + desc, vm start + desc, plus the trailing sync event.
        assert_eq!(events.len(), 5);
        assert!(matches!(events.last().unwrap(), ClusterEvent::Sync(_)));

        let cache = executor.store().snapshot("cluster-a");
        assert_eq!(cache.active_vm_ids, BTreeSet::from(["i-1".to_string()]));
        assert_eq!(cache.active_host_arns, BTreeSet::from(["arn:host/1".to_string()]));
    }

    #[tokio::test]
    async fn cached_vm_ids_are_requeried() {
        let directory = Arc::new(FakeDirectory::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let executor = ClusterSyncExecutor::new(directory.clone(), publisher);

        let mut cache = drover_model::ActiveInstanceCache::default();
        cache.active_vm_ids = BTreeSet::from(["i-ghost".to_string()]);
        executor.store().replace("cluster-a", cache);

        executor
            .run_once(&TaskId::from("t-1"), &params(), SystemTime::now())
            .await;

        let queries = directory.vm_queries.lock().unwrap();
        assert!(queries[0].contains("i-ghost"));
    }

    #[tokio::test]
    async fn directory_failure_leaves_cache_untouched() {
        let directory = Arc::new(FakeDirectory {
            fail_hosts: true,
            ..FakeDirectory::default()
        });
        let publisher = Arc::new(RecordingPublisher::default());
        let executor = ClusterSyncExecutor::new(directory, publisher.clone());

        let response = executor
            .run_once(&TaskId::from("t-1"), &params(), SystemTime::now())
            .await;

        assert_eq!(response.state, TaskState::Failed);
        assert!(publisher.events.lock().unwrap().is_empty());
        assert!(!executor.store().contains("cluster-a"));
    }

    #[tokio::test]
    async fn publish_failure_still_succeeds_and_updates_cache() {
        let directory = Arc::new(FakeDirectory {
            vms: vec![],
            hosts: vec![host("arn:host/1", "i-1")],
            ..FakeDirectory::default()
        });
        let publisher = Arc::new(RecordingPublisher {
            fail: true,
            ..RecordingPublisher::default()
        });
        let executor = ClusterSyncExecutor::new(directory, publisher);

        let response = executor
            .run_once(&TaskId::from("t-1"), &params(), SystemTime::now())
            .await;

        assert_eq!(response.state, TaskState::Succeeded);
        assert!(executor.store().contains("cluster-a"));
    }

    #[tokio::test]
    async fn metrics_collected_once_per_hour() {
        let directory = Arc::new(FakeDirectory::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let executor = ClusterSyncExecutor::new(directory.clone(), publisher);

        // Last heartbeat two hours ago: at least one full hour is owed.
        let heartbeat = SystemTime::now() - Duration::from_secs(2 * 3600);
        executor
            .run_once(&TaskId::from("t-1"), &params(), heartbeat)
            .await;
        executor
            .run_once(&TaskId::from("t-1"), &params(), heartbeat)
            .await;

        // The first run collects up to the current hour boundary and
        // advances the watermark; the second run inside the same hour skips.
        let calls = directory.metric_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let cache = executor.store().snapshot("cluster-a");
        assert_eq!(
            cache.metrics_collected_till_hour,
            drover_model::timestamp::truncate_to_hour(SystemTime::now())
        );
    }

    #[tokio::test]
    async fn cleanup_invalidates_the_cluster_cache() {
        let directory = Arc::new(FakeDirectory::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let executor = ClusterSyncExecutor::new(directory, publisher);

        executor
            .run_once(&TaskId::from("t-1"), &params(), SystemTime::now())
            .await;
        assert!(executor.store().contains("cluster-a"));

        assert!(executor.cleanup(&TaskId::from("t-1"), &params()).await);
        assert!(!executor.store().contains("cluster-a"));
    }
}
