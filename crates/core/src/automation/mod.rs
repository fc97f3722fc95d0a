//! Automation-apply coordination.
//!
//! A request to push an account's saved configuration to the live agent goes
//! through [`AutomationService::apply_changes`]: the account id is validated,
//! the single queue actor checks for a duplicate and reserves the cooldown in
//! one step, and the job is executed by the one shared [`WorkerAdapter`].
//! Every transition is published on the [`StatusBroadcaster`].

mod automation_errors;
mod automation_model;
mod automation_service;
mod broadcaster;
mod cooldown;
mod queue_manager;
mod validation;
mod worker;

pub use automation_errors::AutomationError;
pub use automation_model::{
    ApplyReceipt, CooldownStatus, Job, JobOutcome, JobStatus, QueueSnapshot,
};
pub use automation_service::{AutomationService, AutomationServiceTrait};
pub use broadcaster::{StatusBroadcaster, StatusEvent, StatusSubscription};
pub use cooldown::{remaining_seconds, CooldownRecord, CooldownTracker};
pub use queue_manager::{spawn_queue_manager, QueueConfig, QueueHandle, QueueManagerDeps};
pub use validation::validate_account_id;
pub use worker::{run_with_timeout, WorkerAdapter, WorkerError, WorkerOutcome, WorkerProgress};
