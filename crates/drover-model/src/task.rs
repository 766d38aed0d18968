use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cadence for a perpetual task: how often it runs and how long one run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    /// Fixed delay between the end of one run and the start of the next.
    pub interval_ms: u64,
    /// Hard wall-clock limit for a single run.
    pub timeout_ms: u64,
}

impl TaskSchedule {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Everything the worker needs to run one task, fetched once at assignment.
///
/// Immutable for the lifetime of the running job; a re-assignment fetches a
/// fresh context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    pub params: TaskParams,
    pub schedule: TaskSchedule,
}

/// Executor dispatch key, resolved once from the params at assignment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    VmGroupSync,
    ContainerServiceSync,
    ServerlessFunctionSync,
    SshHostSync,
    PaasAppSync,
    ClusterSync,
}

impl TaskType {
    /// Short symbolic name for logging and routing.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::VmGroupSync => "vm-group-sync",
            TaskType::ContainerServiceSync => "container-service-sync",
            TaskType::ServerlessFunctionSync => "serverless-function-sync",
            TaskType::SshHostSync => "ssh-host-sync",
            TaskType::PaasAppSync => "paas-app-sync",
            TaskType::ClusterSync => "cluster-sync",
        }
    }
}

/// Typed parameter payload for a perpetual task.
///
/// The variant itself is the task-type discriminant; there is no separate
/// tag field to keep consistent with the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskParams {
    /// Sync instances of a cloud VM scaling group.
    VmGroupSync(InstanceSyncParams),
    /// Sync instances backing a managed container service.
    ContainerServiceSync(InstanceSyncParams),
    /// Sync deployed serverless function instances.
    ServerlessFunctionSync(InstanceSyncParams),
    /// Sync plain SSH-reachable hosts.
    SshHostSync(InstanceSyncParams),
    /// Sync application instances on a PaaS platform.
    PaasAppSync(InstanceSyncParams),
    /// Stateful container-cluster sync with lifecycle diffing.
    ClusterSync(ClusterSyncParams),
}

impl TaskParams {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskParams::VmGroupSync(_) => TaskType::VmGroupSync,
            TaskParams::ContainerServiceSync(_) => TaskType::ContainerServiceSync,
            TaskParams::ServerlessFunctionSync(_) => TaskType::ServerlessFunctionSync,
            TaskParams::SshHostSync(_) => TaskType::SshHostSync,
            TaskParams::PaasAppSync(_) => TaskType::PaasAppSync,
            TaskParams::ClusterSync(_) => TaskType::ClusterSync,
        }
    }

    /// Owner account for result publishing.
    pub fn account_id(&self) -> &str {
        match self {
            TaskParams::VmGroupSync(p)
            | TaskParams::ContainerServiceSync(p)
            | TaskParams::ServerlessFunctionSync(p)
            | TaskParams::SshHostSync(p)
            | TaskParams::PaasAppSync(p) => &p.account_id,
            TaskParams::ClusterSync(p) => &p.account_id,
        }
    }
}

/// Parameters shared by the stateless instance-sync executors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSyncParams {
    pub account_id: String,
    pub connection: ConnectionConfig,
    pub credentials: Credentials,
    #[serde(default)]
    pub filter: InstanceFilter,
}

/// Parameters for the stateful cluster-sync executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSyncParams {
    pub account_id: String,
    /// Cache key; one cache entry and one owning task per cluster id.
    pub cluster_id: String,
    pub region: String,
    pub credentials: Credentials,
}

/// Provider endpoint coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub endpoint: String,
    pub region: String,
}

/// Provider credentials. The secret is opaque to this subsystem and must
/// never appear in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_key: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Narrow the resource listing queried from the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_params() -> InstanceSyncParams {
        InstanceSyncParams {
            account_id: "acct-1".to_string(),
            connection: ConnectionConfig {
                endpoint: "https://compute.example.com".to_string(),
                region: "eu-west-1".to_string(),
            },
            credentials: Credentials {
                access_key: "AK".to_string(),
                secret: "shh".to_string(),
            },
            filter: InstanceFilter::default(),
        }
    }

    #[test]
    fn task_type_matches_variant() {
        let p = TaskParams::VmGroupSync(sync_params());
        assert_eq!(p.task_type(), TaskType::VmGroupSync);

        let p = TaskParams::ClusterSync(ClusterSyncParams {
            account_id: "acct-1".to_string(),
            cluster_id: "cluster-a".to_string(),
            region: "eu-west-1".to_string(),
            credentials: Credentials {
                access_key: "AK".to_string(),
                secret: "shh".to_string(),
            },
        });
        assert_eq!(p.task_type(), TaskType::ClusterSync);
    }

    #[test]
    fn params_serde_roundtrip() {
        let ctx = TaskContext {
            params: TaskParams::SshHostSync(sync_params()),
            schedule: TaskSchedule {
                interval_ms: 600_000,
                timeout_ms: 120_000,
            },
        };

        let json = serde_json::to_string(&ctx).unwrap();
        let back: TaskContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn credentials_debug_redacts_secret() {
        let creds = Credentials {
            access_key: "AK".to_string(),
            secret: "super-secret".to_string(),
        };
        let dbg = format!("{:?}", creds);
        assert!(!dbg.contains("super-secret"));
    }
}
