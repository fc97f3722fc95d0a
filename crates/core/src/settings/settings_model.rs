//! Account settings domain model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Saved configuration for one account.
///
/// `settings` is never interpreted by this crate. It is stored and handed to
/// the worker exactly as the dashboard saved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    pub account_id: String,
    pub settings: serde_json::Value,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
