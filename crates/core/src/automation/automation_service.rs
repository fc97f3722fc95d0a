use async_trait::async_trait;
use log::{debug, info};
use std::sync::Arc;

use super::{
    spawn_queue_manager, validate_account_id, ApplyReceipt, CooldownStatus, QueueConfig,
    QueueHandle, QueueManagerDeps, QueueSnapshot, StatusBroadcaster, StatusSubscription,
    WorkerAdapter,
};
use crate::errors::{Error, Result, ValidationError};
use crate::settings::AccountSettingsServiceTrait;
use crate::utils::Clock;

#[async_trait]
pub trait AutomationServiceTrait: Send + Sync {
    /// Accepts an apply request and returns as soon as the job is queued.
    ///
    /// The outcome of the job itself is only reported on the status channels.
    async fn apply_changes(&self, account_id: &str) -> Result<ApplyReceipt>;

    async fn queue_snapshot(&self) -> Result<QueueSnapshot>;

    async fn cooldown_status(&self, account_id: &str) -> Result<CooldownStatus>;

    fn subscribe(&self, account_id: Option<&str>) -> StatusSubscription;
}

pub struct AutomationService {
    settings_service: Arc<dyn AccountSettingsServiceTrait>,
    queue: QueueHandle,
    broadcaster: StatusBroadcaster,
}

impl AutomationService {
    /// Starts the queue actor. Must be called inside a tokio runtime.
    pub fn new(
        settings_service: Arc<dyn AccountSettingsServiceTrait>,
        worker: Arc<dyn WorkerAdapter>,
        broadcaster: StatusBroadcaster,
        clock: Arc<dyn Clock>,
        config: QueueConfig,
    ) -> Self {
        let queue = spawn_queue_manager(
            QueueManagerDeps {
                worker,
                settings_service: settings_service.clone(),
                broadcaster: broadcaster.clone(),
                clock,
            },
            config,
        );
        Self {
            settings_service,
            queue,
            broadcaster,
        }
    }
}

#[async_trait]
impl AutomationServiceTrait for AutomationService {
    async fn apply_changes(&self, account_id: &str) -> Result<ApplyReceipt> {
        validate_account_id(account_id)?;
        if !self.settings_service.account_exists(account_id)? {
            debug!("Apply requested for unknown account {}", account_id);
            return Err(Error::from(ValidationError::UnknownAccount(
                account_id.to_string(),
            )));
        }

        let receipt = self.queue.enqueue(account_id).await?;
        info!(
            "Accepted apply for account {} as job {} at position {}",
            receipt.account_id, receipt.job_id, receipt.position
        );
        Ok(receipt)
    }

    async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        self.queue.snapshot().await
    }

    async fn cooldown_status(&self, account_id: &str) -> Result<CooldownStatus> {
        validate_account_id(account_id)?;
        self.queue.cooldown_status(account_id).await
    }

    fn subscribe(&self, account_id: Option<&str>) -> StatusSubscription {
        self.broadcaster.subscribe(account_id)
    }
}
