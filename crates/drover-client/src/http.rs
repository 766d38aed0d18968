use std::collections::BTreeSet;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use drover_model::{ClusterEvent, InstanceSyncResult, TaskContext, TaskId, timestamp::millis};

use crate::error::ClientError;
use crate::traits::{ControlPlaneClient, EventPublisher};

/// HTTP/JSON implementation of the control-plane surface.
///
/// Every endpoint returns an envelope with an application-level `success`
/// flag; a `false` flag maps to [`ClientError::Rejected`] and does not count
/// as a transport failure.
pub struct HttpControlPlane {
    client: reqwest::Client,
    base_url: String,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "posting to control plane");

        let response = self.client.post(&url).json(body).send().await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse response: {}, body: {}", e, body))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksRequest<'a> {
    worker_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    task_ids: BTreeSet<TaskId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextRequest<'a> {
    task_id: &'a TaskId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextResponse {
    success: bool,
    #[serde(default)]
    message: String,
    context: Option<TaskContext>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatRequest<'a> {
    task_id: &'a TaskId,
    #[serde(with = "millis")]
    run_started_at: SystemTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultRequest<'a> {
    task_id: &'a TaskId,
    account_id: &'a str,
    result: &'a InstanceSyncResult,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventRequest<'a> {
    routing_key: &'a str,
    event: &'a ClusterEvent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AckResponse {
    success: bool,
    #[serde(default)]
    message: String,
}

fn ack(response: AckResponse) -> Result<(), ClientError> {
    if !response.success {
        return Err(ClientError::Rejected(response.message));
    }
    Ok(())
}

#[async_trait]
impl ControlPlaneClient for HttpControlPlane {
    async fn list_assigned_task_ids(
        &self,
        worker_id: &str,
    ) -> Result<BTreeSet<TaskId>, ClientError> {
        let response: ListTasksResponse = self
            .post_json("/api/v1/perpetual-tasks/list", &ListTasksRequest { worker_id })
            .await?;

        if !response.success {
            return Err(ClientError::Rejected(response.message));
        }
        Ok(response.task_ids)
    }

    async fn get_task_context(&self, task_id: &TaskId) -> Result<TaskContext, ClientError> {
        let response: ContextResponse = self
            .post_json("/api/v1/perpetual-tasks/context", &ContextRequest { task_id })
            .await?;

        if !response.success {
            return Err(ClientError::Rejected(response.message));
        }
        response.context.ok_or_else(|| {
            ClientError::InvalidResponse("context missing from successful response".to_string())
        })
    }

    async fn publish_heartbeat(
        &self,
        task_id: &TaskId,
        run_started_at: SystemTime,
    ) -> Result<(), ClientError> {
        let request = HeartbeatRequest {
            task_id,
            run_started_at,
        };
        let response: AckResponse = self
            .post_json("/api/v1/perpetual-tasks/heartbeat", &request)
            .await?;
        ack(response)
    }

    async fn publish_result(
        &self,
        task_id: &TaskId,
        account_id: &str,
        result: &InstanceSyncResult,
    ) -> Result<(), ClientError> {
        let request = ResultRequest {
            task_id,
            account_id,
            result,
        };
        let response: AckResponse = self
            .post_json("/api/v1/perpetual-tasks/result", &request)
            .await?;
        ack(response)
    }
}

#[async_trait]
impl EventPublisher for HttpControlPlane {
    async fn publish(&self, event: &ClusterEvent) -> Result<(), ClientError> {
        let request = EventRequest {
            routing_key: event.cluster_id(),
            event,
        };
        let response: AckResponse = self.post_json("/api/v1/events", &request).await?;
        ack(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_envelope_maps_to_rejected_error() {
        let response = AckResponse {
            success: false,
            message: "unknown task".to_string(),
        };
        let err = ack(response).unwrap_err();
        assert!(matches!(err, ClientError::Rejected(m) if m == "unknown task"));
        assert!(!ClientError::Rejected(String::new()).is_transport());
    }

    #[test]
    fn list_response_parses_with_defaults() {
        let response: ListTasksResponse =
            serde_json::from_str(r#"{"success":true,"taskIds":["t-1","t-2"]}"#).unwrap();
        assert!(response.success);
        assert!(response.message.is_empty());
        assert_eq!(response.task_ids.len(), 2);
    }
}
