//! Repository traits for account settings.

use async_trait::async_trait;

use crate::errors::Result;
use crate::settings::AccountSettings;

/// Persistence boundary for account settings blobs.
#[async_trait]
pub trait AccountSettingsRepositoryTrait: Send + Sync {
    /// Get the saved settings for an account, if any.
    fn get_settings(&self, account_id: &str) -> Result<Option<AccountSettings>>;

    /// List every account that has saved settings.
    fn list_account_ids(&self) -> Result<Vec<String>>;

    /// Insert or replace the settings blob for an account.
    async fn upsert_settings(
        &self,
        account_id: &str,
        settings: serde_json::Value,
    ) -> Result<AccountSettings>;
}
