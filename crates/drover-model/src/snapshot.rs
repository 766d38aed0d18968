use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::timestamp::millis;

/// VM state name reported by providers for an instance that no longer runs.
///
/// Terminated instances may linger in describe results for a while after
/// shutdown before the provider reaps them entirely.
pub const VM_STATE_TERMINATED: &str = "terminated";

/// Point-in-time view of one virtual machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmInstance {
    pub vm_id: String,
    /// Provider state name, e.g. `"running"`, `"stopping"`, `"terminated"`.
    pub state_name: String,
    #[serde(with = "millis")]
    pub launched_at: SystemTime,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_reservation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_request_id: Option<String>,
    /// Provider lifecycle kind, e.g. on-demand vs spot.
    pub lifecycle: String,
}

impl VmInstance {
    pub fn is_terminated(&self) -> bool {
        self.state_name == VM_STATE_TERMINATED
    }
}

/// Registration status filter for container hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HostStatus {
    Active,
    Draining,
}

/// Point-in-time view of one container instance (host) in a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerHost {
    pub arn: String,
    /// Backing VM, used to build the VM id union for the describe call.
    pub vm_id: String,
    #[serde(with = "millis")]
    pub registered_at: SystemTime,
    /// Registered CPU units parsed from the host's resource list.
    pub cpu: u32,
    /// Registered memory in MiB parsed from the host's resource list.
    pub memory_mb: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
}

/// Desired-status filter for cluster task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskDesiredStatus {
    Running,
    Stopped,
}

/// Point-in-time view of one container task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTask {
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    /// Host the task is placed on; absent for externally launched tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_arn: Option<String>,
    pub cpu: u32,
    pub memory_mb: u32,
    /// When the image pull began; the task's effective start time.
    #[serde(default, with = "millis::option", skip_serializing_if = "Option::is_none")]
    pub pull_started_at: Option<SystemTime>,
    #[serde(default, with = "millis::option", skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<SystemTime>,
    pub last_status: String,
}

impl ContainerTask {
    /// A task counts toward the active set until it records a stop time.
    pub fn is_active(&self) -> bool {
        self.stopped_at.is_none()
    }
}

/// One resource in a stateless instance-sync snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    pub state: String,
    #[serde(default, with = "millis::option", skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn terminated_state_detection() {
        let vm = VmInstance {
            vm_id: "i-1".to_string(),
            state_name: "terminated".to_string(),
            launched_at: UNIX_EPOCH + Duration::from_secs(10),
            instance_type: "m5.large".to_string(),
            capacity_reservation_id: None,
            spot_request_id: None,
            lifecycle: "on-demand".to_string(),
        };
        assert!(vm.is_terminated());
    }

    #[test]
    fn container_task_serde_roundtrip() {
        let task = ContainerTask {
            arn: "arn:task/1".to_string(),
            service_name: Some("web".to_string()),
            host_arn: Some("arn:host/1".to_string()),
            cpu: 256,
            memory_mb: 512,
            pull_started_at: Some(UNIX_EPOCH + Duration::from_millis(1_000)),
            stopped_at: None,
            last_status: "RUNNING".to_string(),
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("stoppedAt"));
        let back: ContainerTask = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
        assert!(back.is_active());
    }
}
