use serde::{Deserialize, Serialize};

use crate::InstanceInfo;

/// Terminal state of a single task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    Succeeded,
    Failed,
}

/// Outcome of one executor run, reported back to the lifecycle manager.
///
/// Always well-formed: executors convert every failure into a `Failed`
/// response instead of propagating errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub state: TaskState,
    pub code: u32,
    pub message: String,
}

impl TaskResponse {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Succeeded,
            code: 200,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: TaskState::Failed,
            code: 500,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == TaskState::Succeeded
    }
}

/// Whether a provider fetch inside an instance-sync run worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Full-snapshot payload published by the stateless instance-sync executors.
///
/// Carries either the complete current resource list or an error message;
/// the control plane does its own comparison against previous reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSyncResult {
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl InstanceSyncResult {
    pub fn success(instances: Vec<InstanceInfo>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            instances,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            instances: Vec::new(),
            error_message: Some(message.into()),
        }
    }
}
