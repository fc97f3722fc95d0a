//! Single-flight apply queue.
//!
//! All queue and cooldown state is owned by one tokio task. Callers talk to it
//! through a [`QueueHandle`]; worker tasks report back over a second channel
//! that only the actor reads, so a finishing job never re-enters the command
//! path that started it.

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::{
    remaining_seconds, run_with_timeout, ApplyReceipt, AutomationError, CooldownStatus,
    CooldownTracker, Job, JobOutcome, JobStatus, QueueSnapshot, StatusBroadcaster, StatusEvent,
    WorkerAdapter, WorkerError, WorkerOutcome, WorkerProgress,
};
use crate::constants::{COOLDOWN_WINDOW_SECS, DEFAULT_WORKER_TIMEOUT_SECS};
use crate::errors::Result;
use crate::settings::AccountSettingsServiceTrait;
use crate::utils::Clock;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Upper bound for one worker call before the slot is force-released.
    pub worker_timeout: Duration,
    pub cooldown_window: chrono::Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_timeout: Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS),
            cooldown_window: chrono::Duration::seconds(COOLDOWN_WINDOW_SECS),
        }
    }
}

/// Collaborators the queue manager needs.
pub struct QueueManagerDeps {
    pub worker: Arc<dyn WorkerAdapter>,
    pub settings_service: Arc<dyn AccountSettingsServiceTrait>,
    pub broadcaster: StatusBroadcaster,
    pub clock: Arc<dyn Clock>,
}

enum QueueCommand {
    Enqueue {
        account_id: String,
        reply: oneshot::Sender<std::result::Result<ApplyReceipt, AutomationError>>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    Cooldown {
        account_id: String,
        reply: oneshot::Sender<CooldownStatus>,
    },
}

enum JobEvent {
    Waiting {
        job_id: Uuid,
        message: Option<String>,
    },
    Finished {
        job_id: Uuid,
        result: std::result::Result<WorkerOutcome, WorkerError>,
    },
}

/// Handle for sending commands to the queue actor.
#[derive(Clone)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<QueueCommand>,
}

impl QueueHandle {
    /// Duplicate check, cooldown reservation and append, as one step.
    pub async fn enqueue(&self, account_id: &str) -> Result<ApplyReceipt> {
        let (reply, rx) = oneshot::channel();
        self.send(QueueCommand::Enqueue {
            account_id: account_id.to_string(),
            reply,
        })?;
        let receipt = rx.await.map_err(|_| AutomationError::QueueUnavailable)??;
        Ok(receipt)
    }

    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(QueueCommand::Snapshot { reply })?;
        Ok(rx.await.map_err(|_| AutomationError::QueueUnavailable)?)
    }

    pub async fn cooldown_status(&self, account_id: &str) -> Result<CooldownStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(QueueCommand::Cooldown {
            account_id: account_id.to_string(),
            reply,
        })?;
        Ok(rx.await.map_err(|_| AutomationError::QueueUnavailable)?)
    }

    fn send(&self, command: QueueCommand) -> std::result::Result<(), AutomationError> {
        self.tx
            .send(command)
            .map_err(|_| AutomationError::QueueUnavailable)
    }
}

/// Spawns the queue actor on the current tokio runtime.
///
/// The actor stops once every [`QueueHandle`] is dropped and the jobs already
/// accepted have run.
pub fn spawn_queue_manager(deps: QueueManagerDeps, config: QueueConfig) -> QueueHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (job_tx, job_rx) = mpsc::unbounded_channel();

    let manager = QueueManager {
        state: QueueState::default(),
        cooldowns: CooldownTracker::new(config.cooldown_window),
        deps,
        config,
        job_tx,
    };
    tokio::spawn(manager.run(rx, job_rx));

    QueueHandle { tx }
}

/// Ordered pending jobs plus the single execution slot.
///
/// Invariant: `running` is either `None` or the id of `order[0]`.
#[derive(Debug, Default)]
struct QueueState {
    order: VecDeque<Job>,
    running: Option<Uuid>,
}

impl QueueState {
    fn contains(&self, account_id: &str) -> bool {
        self.order.iter().any(|job| job.account_id == account_id)
    }

    fn push(&mut self, job: Job) {
        self.order.push_back(job);
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn running_job(&self) -> Option<&Job> {
        self.running.and_then(|_| self.order.front())
    }

    /// Marks the head as running and returns it, unless busy or empty.
    fn start_head(&mut self) -> Option<Job> {
        if self.running.is_some() {
            return None;
        }
        let head = self.order.front()?.clone();
        self.running = Some(head.id);
        Some(head)
    }

    /// Removes the head if it is the running job `job_id`.
    fn finish_head(&mut self, job_id: Uuid) -> Option<Job> {
        if self.running != Some(job_id) {
            return None;
        }
        self.running = None;
        self.order.pop_front()
    }

    fn position_of(&self, account_id: &str) -> Option<usize> {
        self.order.iter().position(|job| job.account_id == account_id)
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot::new(
            self.order.iter().map(|job| job.account_id.clone()).collect(),
            self.running_job().map(|job| job.account_id.clone()),
        )
    }
}

struct QueueManager {
    state: QueueState,
    cooldowns: CooldownTracker,
    deps: QueueManagerDeps,
    config: QueueConfig,
    job_tx: mpsc::UnboundedSender<JobEvent>,
}

impl QueueManager {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<QueueCommand>,
        mut job_events: mpsc::UnboundedReceiver<JobEvent>,
    ) {
        info!("Automation queue manager started");
        let mut accepting = true;

        loop {
            if !accepting && !self.state.is_running() {
                break;
            }
            tokio::select! {
                command = commands.recv(), if accepting => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All queue handles dropped, draining accepted jobs");
                        accepting = false;
                    }
                },
                Some(event) = job_events.recv() => self.handle_job_event(event),
            }
        }

        info!("Automation queue manager stopped");
    }

    fn handle_command(&mut self, command: QueueCommand) {
        match command {
            QueueCommand::Enqueue { account_id, reply } => {
                let result = self.enqueue(account_id);
                let _ = reply.send(result);
            }
            QueueCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            QueueCommand::Cooldown { account_id, reply } => {
                let now = self.deps.clock.now();
                self.cooldowns.prune_expired(now);
                let until = self
                    .cooldowns
                    .active(&account_id, now)
                    .map(|record| record.cooldown_until);
                let _ = reply.send(CooldownStatus {
                    remaining_seconds: until.map_or(0, |u| remaining_seconds(u, now)),
                    cooldown_until: until,
                    account_id,
                });
            }
        }
    }

    fn enqueue(&mut self, account_id: String) -> std::result::Result<ApplyReceipt, AutomationError> {
        if self.state.contains(&account_id) {
            debug!("Rejected apply for {}: already queued", account_id);
            return Err(AutomationError::DuplicateQueued { account_id });
        }

        let now = self.deps.clock.now();
        let pruned = self.cooldowns.prune_expired(now);
        if pruned > 0 {
            debug!("Dropped {} expired cooldown record(s)", pruned);
        }
        let cooldown_until = self
            .cooldowns
            .check_and_reserve(&account_id, now)
            .inspect_err(|e| debug!("Rejected apply for {}: {}", account_id, e))?;

        let job = Job::new(account_id.clone(), now);
        let job_id = job.id;
        self.state.push(job);
        info!(
            "Queued apply job {} for account {} ({} in queue)",
            job_id,
            account_id,
            self.state.order.len()
        );

        self.publish_snapshot();
        self.process_head();

        Ok(ApplyReceipt {
            job_id,
            position: self.state.position_of(&account_id).unwrap_or(0),
            account_id,
            cooldown_until,
        })
    }

    /// Starts the head job if the slot is free. The worker call runs on its
    /// own task and reports back through `job_tx`.
    ///
    /// Emits `running` followed by a snapshot that carries the new running
    /// account.
    fn process_head(&mut self) {
        let Some(job) = self.state.start_head() else {
            return;
        };
        info!(
            "Starting apply job {} for account {}",
            job.id, job.account_id
        );
        self.publish_outcome(&job, JobStatus::Running, None);
        self.publish_snapshot();

        let worker = self.deps.worker.clone();
        let settings_service = self.deps.settings_service.clone();
        let timeout = self.config.worker_timeout;
        let job_tx = self.job_tx.clone();
        let progress: Arc<dyn WorkerProgress> = Arc::new(JobProgress {
            job_id: job.id,
            tx: job_tx.clone(),
        });

        tokio::spawn(async move {
            let result = match settings_service.get_current_settings(&job.account_id) {
                Ok(settings) => {
                    run_with_timeout(worker, job.account_id.clone(), settings, progress, timeout)
                        .await
                }
                Err(e) => Err(WorkerError::Settings(e.to_string())),
            };
            let _ = job_tx.send(JobEvent::Finished {
                job_id: job.id,
                result,
            });
        });
    }

    fn handle_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Waiting { job_id, message } => {
                let Some(job) = self.state.running_job().filter(|j| j.id == job_id).cloned()
                else {
                    debug!("Ignoring waiting signal from stale job {}", job_id);
                    return;
                };
                info!(
                    "Apply job {} for account {} is waiting: {}",
                    job.id,
                    job.account_id,
                    message.as_deref().unwrap_or("-")
                );
                self.publish_outcome(&job, JobStatus::Waiting, message);
            }
            JobEvent::Finished { job_id, result } => self.finish(job_id, result),
        }
    }

    fn finish(
        &mut self,
        job_id: Uuid,
        result: std::result::Result<WorkerOutcome, WorkerError>,
    ) {
        let Some(job) = self.state.running_job().filter(|j| j.id == job_id).cloned() else {
            warn!("Ignoring completion of job {} that is not running", job_id);
            return;
        };

        let (status, message) = match result {
            Ok(WorkerOutcome::Completed { message }) => {
                info!(
                    "Apply job {} for account {} completed",
                    job.id, job.account_id
                );
                (JobStatus::Completed, message)
            }
            Ok(WorkerOutcome::Failed { message }) => {
                warn!(
                    "Apply job {} for account {} failed: {}",
                    job.id, job.account_id, message
                );
                (JobStatus::Error, Some(message))
            }
            Err(e) => {
                warn!(
                    "Apply job {} for account {} failed: {}",
                    job.id, job.account_id, e
                );
                (JobStatus::Error, Some(e.to_string()))
            }
        };

        self.publish_outcome(&job, status, message);
        self.state.finish_head(job.id);
        self.publish_snapshot();
        self.process_head();
    }

    fn publish_snapshot(&self) {
        self.deps
            .broadcaster
            .publish(StatusEvent::QueueStatus(self.state.snapshot()));
    }

    fn publish_outcome(&self, job: &Job, status: JobStatus, message: Option<String>) {
        self.deps
            .broadcaster
            .publish(StatusEvent::AutomationStatus(JobOutcome {
                account_id: job.account_id.clone(),
                job_id: job.id,
                status,
                message,
                occurred_at: self.deps.clock.now(),
            }));
    }
}

/// Forwards `waiting` signals of one job to the actor, which drops them once
/// the job is no longer running.
struct JobProgress {
    job_id: Uuid,
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl WorkerProgress for JobProgress {
    fn waiting(&self, message: Option<String>) {
        let _ = self.tx.send(JobEvent::Waiting {
            job_id: self.job_id,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{
        AccountSettings, AccountSettingsRepositoryTrait, AccountSettingsService,
    };
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use chrono::Utc;

    fn job(account_id: &str) -> Job {
        Job::new(account_id, Utc::now())
    }

    struct RefusingWorker;

    #[async_trait]
    impl WorkerAdapter for RefusingWorker {
        async fn run(
            &self,
            _account_id: &str,
            _settings: serde_json::Value,
            _progress: Arc<dyn WorkerProgress>,
        ) -> std::result::Result<WorkerOutcome, WorkerError> {
            Err(WorkerError::Rejected("not in this test".to_string()))
        }
    }

    struct EmptyRepository;

    #[async_trait]
    impl AccountSettingsRepositoryTrait for EmptyRepository {
        fn get_settings(&self, _account_id: &str) -> Result<Option<AccountSettings>> {
            Ok(None)
        }

        fn list_account_ids(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn upsert_settings(
            &self,
            _account_id: &str,
            _settings: serde_json::Value,
        ) -> Result<AccountSettings> {
            Err(crate::Error::Unexpected("read only".to_string()))
        }
    }

    /// Actor state without the run loop, so tests can call it directly.
    fn manager(clock: &ManualClock) -> (QueueManager, mpsc::UnboundedReceiver<JobEvent>) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let config = QueueConfig::default();
        let manager = QueueManager {
            state: QueueState::default(),
            cooldowns: CooldownTracker::new(config.cooldown_window),
            deps: QueueManagerDeps {
                worker: Arc::new(RefusingWorker),
                settings_service: Arc::new(AccountSettingsService::new(Arc::new(EmptyRepository))),
                broadcaster: StatusBroadcaster::default(),
                clock: Arc::new(clock.clone()),
            },
            config,
            job_tx,
        };
        (manager, job_rx)
    }

    #[tokio::test]
    async fn enqueue_drops_expired_cooldowns() {
        let clock = ManualClock::new(Utc::now());
        let (mut manager, _job_rx) = manager(&clock);

        manager.enqueue("acc1".to_string()).unwrap();
        assert_eq!(manager.cooldowns.len(), 1);

        clock.advance(chrono::Duration::seconds(COOLDOWN_WINDOW_SECS));
        manager.enqueue("acc2".to_string()).unwrap();

        assert_eq!(manager.cooldowns.len(), 1);
        assert!(manager.cooldowns.active("acc1", clock.now()).is_none());
        assert!(manager.cooldowns.active("acc2", clock.now()).is_some());
    }

    #[tokio::test]
    async fn enqueue_publishes_snapshot_before_starting_the_head() {
        let clock = ManualClock::new(Utc::now());
        let (mut manager, _job_rx) = manager(&clock);
        let mut events = manager.deps.broadcaster.subscribe(None);

        manager.enqueue("acc1".to_string()).unwrap();

        match events.try_next() {
            Some(StatusEvent::QueueStatus(snapshot)) => {
                assert_eq!(snapshot.queued_account_ids, vec!["acc1"]);
                assert!(snapshot.running_account_id.is_none());
            }
            other => panic!("expected the enqueue snapshot, got {other:?}"),
        }
        assert!(matches!(
            events.try_next(),
            Some(StatusEvent::AutomationStatus(JobOutcome { status: JobStatus::Running, .. }))
        ));
        match events.try_next() {
            Some(StatusEvent::QueueStatus(snapshot)) => {
                assert_eq!(snapshot.running_account_id.as_deref(), Some("acc1"));
            }
            other => panic!("expected the running snapshot, got {other:?}"),
        }
    }

    #[test]
    fn running_is_always_the_head() {
        let mut state = QueueState::default();
        assert!(state.start_head().is_none());

        state.push(job("acc1"));
        state.push(job("acc2"));
        let started = state.start_head().unwrap();
        assert_eq!(started.account_id, "acc1");
        assert!(state.start_head().is_none(), "slot is single-flight");

        let snapshot = state.snapshot();
        assert_eq!(snapshot.running_account_id.as_deref(), Some("acc1"));
        assert_eq!(snapshot.queued_account_ids, vec!["acc1", "acc2"]);
    }

    #[test]
    fn finish_only_removes_the_running_head() {
        let mut state = QueueState::default();
        state.push(job("acc1"));
        state.push(job("acc2"));
        let acc2_id = state.order[1].id;

        assert!(state.finish_head(acc2_id).is_none());
        let started = state.start_head().unwrap();
        assert!(state.finish_head(acc2_id).is_none());

        let removed = state.finish_head(started.id).unwrap();
        assert_eq!(removed.account_id, "acc1");
        assert_eq!(state.order.len(), 1);
        assert!(!state.is_running());
        assert!(state.snapshot().running_account_id.is_none());
    }

    #[test]
    fn duplicate_detection_covers_running_and_pending() {
        let mut state = QueueState::default();
        state.push(job("acc1"));
        state.start_head();
        state.push(job("acc2"));
        assert!(state.contains("acc1"));
        assert!(state.contains("acc2"));
        assert!(!state.contains("acc3"));
        assert_eq!(state.position_of("acc2"), Some(1));
    }
}
