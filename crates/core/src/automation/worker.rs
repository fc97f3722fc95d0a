//! Boundary to the external automation worker.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Normal resolution of a worker call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Completed { message: Option<String> },
    /// The worker ran but reported an application-level failure.
    Failed { message: String },
}

/// Abnormal resolution of a worker call. Always reported as an `error` outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("Worker rejected the job: {0}")]
    Rejected(String),

    #[error("Worker unreachable: {0}")]
    Transport(String),

    #[error("Automation timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not load account settings: {0}")]
    Settings(String),
}

/// Intermediate signals a worker may raise while a job is running.
pub trait WorkerProgress: Send + Sync {
    /// The job is blocked on an external precondition. May be called any number of times.
    fn waiting(&self, message: Option<String>);
}

/// The single shared executor that applies settings to the live agent.
///
/// Implementations do not need to bound their own duration; the queue wraps
/// every call with [`run_with_timeout`].
#[async_trait]
pub trait WorkerAdapter: Send + Sync {
    async fn run(
        &self,
        account_id: &str,
        settings: serde_json::Value,
        progress: Arc<dyn WorkerProgress>,
    ) -> Result<WorkerOutcome, WorkerError>;
}

/// Runs one worker call on its own task, bounded by `limit`.
///
/// A panic inside the adapter resolves as `Rejected`, and on timeout the task
/// is aborted so the execution slot can be released.
pub async fn run_with_timeout(
    adapter: Arc<dyn WorkerAdapter>,
    account_id: String,
    settings: serde_json::Value,
    progress: Arc<dyn WorkerProgress>,
    limit: Duration,
) -> Result<WorkerOutcome, WorkerError> {
    let mut handle =
        tokio::spawn(async move { adapter.run(&account_id, settings, progress).await });

    match tokio::time::timeout(limit, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) if join_err.is_panic() => {
            Err(WorkerError::Rejected("worker panicked".to_string()))
        }
        Ok(Err(_)) => Err(WorkerError::Rejected("worker task was cancelled".to_string())),
        Err(_) => {
            handle.abort();
            Err(WorkerError::Timeout(limit))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoProgress;

    impl WorkerProgress for NoProgress {
        fn waiting(&self, _message: Option<String>) {}
    }

    struct SleepyWorker(Duration);

    #[async_trait]
    impl WorkerAdapter for SleepyWorker {
        async fn run(
            &self,
            _account_id: &str,
            _settings: serde_json::Value,
            _progress: Arc<dyn WorkerProgress>,
        ) -> Result<WorkerOutcome, WorkerError> {
            tokio::time::sleep(self.0).await;
            Ok(WorkerOutcome::Completed { message: None })
        }
    }

    struct PanickingWorker;

    #[async_trait]
    impl WorkerAdapter for PanickingWorker {
        async fn run(
            &self,
            _account_id: &str,
            _settings: serde_json::Value,
            _progress: Arc<dyn WorkerProgress>,
        ) -> Result<WorkerOutcome, WorkerError> {
            panic!("driver crashed");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_before_deadline() {
        let result = run_with_timeout(
            Arc::new(SleepyWorker(Duration::from_secs(5))),
            "acc1".into(),
            serde_json::json!({}),
            Arc::new(NoProgress),
            Duration::from_secs(60),
        )
        .await;
        assert_eq!(result, Ok(WorkerOutcome::Completed { message: None }));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_worker_times_out() {
        let result = run_with_timeout(
            Arc::new(SleepyWorker(Duration::from_secs(3600))),
            "acc1".into(),
            serde_json::json!({}),
            Arc::new(NoProgress),
            Duration::from_secs(60),
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(err, WorkerError::Timeout(Duration::from_secs(60)));
        assert_eq!(err.to_string(), "Automation timed out after 60 seconds");
    }

    #[tokio::test]
    async fn panic_becomes_rejection() {
        let result = run_with_timeout(
            Arc::new(PanickingWorker),
            "acc1".into(),
            serde_json::json!({}),
            Arc::new(NoProgress),
            Duration::from_secs(60),
        )
        .await;
        assert!(matches!(result, Err(WorkerError::Rejected(_))));
    }
}
