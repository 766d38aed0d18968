use std::collections::BTreeSet;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::timestamp::millis;

/// Start/stop transition for an externally observed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEventKind {
    Start,
    Stop,
}

/// Event emitted by the cluster-sync engine.
///
/// Fire-and-forget: produced every run, published to an external stream,
/// never stored locally. Each variant carries the cluster id routing key and
/// an authoritative event timestamp (the resource's own recorded time where
/// one exists, poll time otherwise) so consumers can order events correctly
/// regardless of publish latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterEvent {
    Lifecycle {
        cluster_id: String,
        resource_id: String,
        kind: LifecycleEventKind,
        #[serde(with = "millis")]
        timestamp: SystemTime,
    },
    VmDescription {
        cluster_id: String,
        vm_id: String,
        instance_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        capacity_reservation_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        spot_request_id: Option<String>,
        lifecycle: String,
        #[serde(with = "millis")]
        timestamp: SystemTime,
    },
    HostDescription {
        cluster_id: String,
        arn: String,
        cpu: u32,
        memory_mb: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        os_type: Option<String>,
        #[serde(with = "millis")]
        timestamp: SystemTime,
    },
    TaskDescription {
        cluster_id: String,
        arn: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        service_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        host_arn: Option<String>,
        cpu: u32,
        memory_mb: u32,
        #[serde(with = "millis")]
        timestamp: SystemTime,
    },
    Sync(ClusterSyncEvent),
}

impl ClusterEvent {
    /// Routing key for the external stream.
    pub fn cluster_id(&self) -> &str {
        match self {
            ClusterEvent::Lifecycle { cluster_id, .. }
            | ClusterEvent::VmDescription { cluster_id, .. }
            | ClusterEvent::HostDescription { cluster_id, .. }
            | ClusterEvent::TaskDescription { cluster_id, .. } => cluster_id,
            ClusterEvent::Sync(sync) => &sync.cluster_id,
        }
    }
}

/// Full active-set snapshot for a cluster, one per run.
///
/// Independent of the individual lifecycle events so consumers that missed
/// an event can self-heal from the next snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSyncEvent {
    pub cluster_id: String,
    pub active_vm_ids: BTreeSet<String>,
    pub active_host_arns: BTreeSet<String>,
    pub active_task_arns: BTreeSet<String>,
    #[serde(with = "millis")]
    pub watermark: SystemTime,
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn lifecycle_event_roundtrip() {
        let event = ClusterEvent::Lifecycle {
            cluster_id: "cluster-a".to_string(),
            resource_id: "i-123".to_string(),
            kind: LifecycleEventKind::Stop,
            timestamp: UNIX_EPOCH + Duration::from_millis(42_000),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: ClusterEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.cluster_id(), "cluster-a");
    }

    #[test]
    fn sync_event_routing_key() {
        let event = ClusterEvent::Sync(ClusterSyncEvent {
            cluster_id: "cluster-b".to_string(),
            active_vm_ids: BTreeSet::from(["i-1".to_string()]),
            active_host_arns: BTreeSet::new(),
            active_task_arns: BTreeSet::new(),
            watermark: UNIX_EPOCH + Duration::from_secs(100),
        });
        assert_eq!(event.cluster_id(), "cluster-b");
    }
}
