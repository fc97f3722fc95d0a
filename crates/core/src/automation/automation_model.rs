//! Automation queue domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One pending or executing request to push configuration for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: Uuid,
    pub account_id: String,
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    pub fn new(account_id: impl Into<String>, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            account_id: account_id.into(),
            enqueued_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Waiting,
    Completed,
    Error,
}

/// A job transition as broadcast on the `automation-status` channel. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOutcome {
    pub account_id: String,
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Ordered view of the queue. The running job, if any, is always the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub queued_account_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_account_id: Option<String>,
    pub is_running: bool,
}

impl QueueSnapshot {
    pub fn new(queued_account_ids: Vec<String>, running_account_id: Option<String>) -> Self {
        let is_running = running_account_id.is_some();
        Self {
            queued_account_ids,
            running_account_id,
            is_running,
        }
    }

    /// Zero-based index of the account in arrival order. While a job runs,
    /// index 0 is the running job and index 1 is next.
    pub fn position_of(&self, account_id: &str) -> Option<usize> {
        self.queued_account_ids
            .iter()
            .position(|queued| queued == account_id)
    }

    pub fn len(&self) -> usize {
        self.queued_account_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued_account_ids.is_empty()
    }
}

/// Returned to the caller as soon as a job is accepted into the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReceipt {
    pub job_id: Uuid,
    pub account_id: String,
    pub cooldown_until: DateTime<Utc>,
    pub position: usize,
}

/// Authoritative cooldown state of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooldownStatus {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
    pub remaining_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_position_follows_arrival_order() {
        let snapshot = QueueSnapshot::new(
            vec!["acc1".into(), "acc2".into(), "acc3".into()],
            Some("acc1".into()),
        );
        assert!(snapshot.is_running);
        assert_eq!(snapshot.position_of("acc1"), Some(0));
        assert_eq!(snapshot.position_of("acc2"), Some(1));
        assert_eq!(snapshot.position_of("acc9"), None);
    }

    #[test]
    fn snapshot_wire_format() {
        let idle = QueueSnapshot::new(vec!["acc1".into()], None);
        let json = serde_json::to_value(&idle).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "queuedAccountIds": ["acc1"], "isRunning": false })
        );
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(
            serde_json::to_value(JobStatus::Waiting).unwrap(),
            serde_json::json!("waiting")
        );
    }
}
