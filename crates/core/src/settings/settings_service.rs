use super::AccountSettingsRepositoryTrait;
use crate::automation::validate_account_id;
use crate::errors::{Error, Result, ValidationError};
use crate::settings::AccountSettings;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

#[async_trait]
pub trait AccountSettingsServiceTrait: Send + Sync {
    /// Current saved settings blob for an account. Fails with
    /// `ValidationError::UnknownAccount` when nothing was ever saved.
    fn get_current_settings(&self, account_id: &str) -> Result<serde_json::Value>;

    fn get_account_settings(&self, account_id: &str) -> Result<AccountSettings>;

    fn account_exists(&self, account_id: &str) -> Result<bool>;

    fn list_account_ids(&self) -> Result<Vec<String>>;

    async fn save_settings(
        &self,
        account_id: &str,
        settings: serde_json::Value,
    ) -> Result<AccountSettings>;
}

pub struct AccountSettingsService {
    repository: Arc<dyn AccountSettingsRepositoryTrait>,
}

impl AccountSettingsService {
    pub fn new(repository: Arc<dyn AccountSettingsRepositoryTrait>) -> Self {
        AccountSettingsService { repository }
    }
}

#[async_trait]
impl AccountSettingsServiceTrait for AccountSettingsService {
    fn get_current_settings(&self, account_id: &str) -> Result<serde_json::Value> {
        self.get_account_settings(account_id).map(|s| s.settings)
    }

    fn get_account_settings(&self, account_id: &str) -> Result<AccountSettings> {
        validate_account_id(account_id)?;
        self.repository
            .get_settings(account_id)?
            .ok_or_else(|| Error::from(ValidationError::UnknownAccount(account_id.to_string())))
    }

    fn account_exists(&self, account_id: &str) -> Result<bool> {
        Ok(self.repository.get_settings(account_id)?.is_some())
    }

    fn list_account_ids(&self) -> Result<Vec<String>> {
        self.repository.list_account_ids()
    }

    async fn save_settings(
        &self,
        account_id: &str,
        settings: serde_json::Value,
    ) -> Result<AccountSettings> {
        validate_account_id(account_id)?;
        debug!("Saving settings for account {}", account_id);
        self.repository.upsert_settings(account_id, settings).await
    }
}
