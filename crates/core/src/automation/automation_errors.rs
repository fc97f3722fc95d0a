use chrono::{DateTime, Utc};
use thiserror::Error;

/// Synchronous rejections of an apply request.
///
/// Failures that happen while a job is executing are never returned to the
/// caller; they are published as `error` job outcomes instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("An apply request for account {account_id} is already pending")]
    DuplicateQueued { account_id: String },

    #[error("Apply is on cooldown for account {account_id}, try again in {remaining_seconds} seconds")]
    CooldownActive {
        account_id: String,
        remaining_seconds: u64,
        cooldown_until: DateTime<Utc>,
    },

    #[error("Automation queue is not running")]
    QueueUnavailable,
}
