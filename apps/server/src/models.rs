use botpilot_core::automation::{ApplyReceipt, CooldownStatus, QueueSnapshot};
use botpilot_core::settings::AccountSettings;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyChangesRequest {
    pub account_id: String,
}

/// Accepted apply request. The job outcome arrives on the event stream.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyChangesResponse {
    pub success: bool,
    pub job_id: Uuid,
    pub account_id: String,
    pub cooldown_until: DateTime<Utc>,
    pub position: usize,
}

impl From<ApplyReceipt> for ApplyChangesResponse {
    fn from(receipt: ApplyReceipt) -> Self {
        Self {
            success: true,
            job_id: receipt.job_id,
            account_id: receipt.account_id,
            cooldown_until: receipt.cooldown_until,
            position: receipt.position,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AccountQuery {
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    pub queued_account_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_account_id: Option<String>,
    pub is_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl QueueStatusResponse {
    pub fn new(snapshot: QueueSnapshot, account_id: Option<&str>) -> Self {
        let position = account_id.and_then(|id| snapshot.position_of(id));
        Self {
            queued_account_ids: snapshot.queued_account_ids,
            running_account_id: snapshot.running_account_id,
            is_running: snapshot.is_running,
            position,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CooldownResponse {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<DateTime<Utc>>,
    pub remaining_seconds: u64,
}

impl From<CooldownStatus> for CooldownResponse {
    fn from(status: CooldownStatus) -> Self {
        Self {
            account_id: status.account_id,
            cooldown_until: status.cooldown_until,
            remaining_seconds: status.remaining_seconds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettingsResponse {
    pub account_id: String,
    #[schema(value_type = Object)]
    pub settings: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<AccountSettings> for AccountSettingsResponse {
    fn from(s: AccountSettings) -> Self {
        Self {
            account_id: s.account_id,
            settings: s.settings,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
