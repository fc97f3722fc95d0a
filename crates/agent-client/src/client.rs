//! HTTP client for the automation agent API.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use botpilot_core::automation::{WorkerAdapter, WorkerError, WorkerOutcome, WorkerProgress};
use botpilot_core::errors::{Error, Result};

/// Default timeout for a single API request. The whole job is bounded by the
/// queue, not here.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:9000";

// ─────────────────────────────────────────────────────────────────────────────
// API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRequest<'a> {
    account_id: &'a str,
    settings: &'a serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentApplyStatus {
    Running,
    Waiting,
    Completed,
    Error,
}

/// Status document returned by both the submit and the poll endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatusResponse {
    pub status: AgentApplyStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl AgentStatusResponse {
    /// Terminal responses map straight onto a worker outcome.
    fn into_outcome(self) -> Option<WorkerOutcome> {
        match self.status {
            AgentApplyStatus::Completed => Some(WorkerOutcome::Completed {
                message: self.message,
            }),
            AgentApplyStatus::Error => Some(WorkerOutcome::Failed {
                message: self
                    .message
                    .unwrap_or_else(|| "Agent reported an error".to_string()),
            }),
            AgentApplyStatus::Running | AgentApplyStatus::Waiting => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Agent API Client
// ─────────────────────────────────────────────────────────────────────────────

/// Worker adapter backed by the agent's HTTP API.
///
/// ```ignore
/// let client = AgentApiClient::new("http://127.0.0.1:9000", Duration::from_secs(2))?;
/// let outcome = client.run("acc1", settings, progress).await?;
/// ```
#[derive(Debug, Clone)]
pub struct AgentApiClient {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl AgentApiClient {
    pub fn new(base_url: &str, poll_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Submits the settings for an account and returns the agent's first status.
    pub async fn submit(
        &self,
        account_id: &str,
        settings: &serde_json::Value,
    ) -> std::result::Result<AgentStatusResponse, WorkerError> {
        let url = format!("{}/api/apply", self.base_url);
        debug!("[AgentApi] POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&ApplyRequest {
                account_id,
                settings,
            })
            .send()
            .await
            .map_err(|e| WorkerError::Transport(format!("Request failed: {}", e)))?;

        parse_response(response).await
    }

    /// Current status of the account's apply job on the agent.
    pub async fn poll(
        &self,
        account_id: &str,
    ) -> std::result::Result<AgentStatusResponse, WorkerError> {
        let url = format!("{}/api/apply/{}", self.base_url, account_id);
        debug!("[AgentApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| WorkerError::Transport(format!("Request failed: {}", e)))?;

        parse_response(response).await
    }
}

async fn parse_response(
    response: reqwest::Response,
) -> std::result::Result<AgentStatusResponse, WorkerError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| WorkerError::Transport(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(&body) {
            if let Some(msg) = err.message.or(err.error) {
                return Err(WorkerError::Transport(format!("Agent error {}: {}", status, msg)));
            }
        }
        return Err(WorkerError::Transport(format!(
            "Agent error {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| WorkerError::Transport(format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl WorkerAdapter for AgentApiClient {
    async fn run(
        &self,
        account_id: &str,
        settings: serde_json::Value,
        progress: Arc<dyn WorkerProgress>,
    ) -> std::result::Result<WorkerOutcome, WorkerError> {
        info!("[AgentApi] Applying settings for account {}", account_id);
        let mut current = self.submit(account_id, &settings).await?;

        loop {
            if current.status == AgentApplyStatus::Waiting {
                progress.waiting(current.message.clone());
            }
            if let Some(outcome) = current.clone().into_outcome() {
                debug!(
                    "[AgentApi] Account {} finished with {:?}",
                    account_id, current.status
                );
                return Ok(outcome);
            }
            tokio::time::sleep(self.poll_interval).await;
            current = self.poll(account_id).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_url_normalization() {
        let client = AgentApiClient::new("http://agent.local:9000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://agent.local:9000");
    }

    #[test]
    fn terminal_statuses_become_outcomes() {
        let completed: AgentStatusResponse =
            serde_json::from_str(r#"{"status":"completed","message":"done"}"#).unwrap();
        assert_eq!(
            completed.into_outcome(),
            Some(WorkerOutcome::Completed {
                message: Some("done".to_string())
            })
        );

        let failed: AgentStatusResponse = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        assert_eq!(
            failed.into_outcome(),
            Some(WorkerOutcome::Failed {
                message: "Agent reported an error".to_string()
            })
        );
    }

    #[test]
    fn in_progress_statuses_keep_polling() {
        for body in [r#"{"status":"running"}"#, r#"{"status":"waiting","message":"login"}"#] {
            let response: AgentStatusResponse = serde_json::from_str(body).unwrap();
            assert!(response.into_outcome().is_none());
        }
    }

    #[test]
    fn unknown_status_is_a_parse_error() {
        assert!(serde_json::from_str::<AgentStatusResponse>(r#"{"status":"paused"}"#).is_err());
    }

    #[test]
    fn request_body_is_camel_case() {
        let settings = serde_json::json!({ "a": 1 });
        let body = serde_json::to_value(ApplyRequest {
            account_id: "acc1",
            settings: &settings,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "accountId": "acc1", "settings": { "a": 1 } }));
    }
}
