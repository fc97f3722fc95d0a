use std::sync::Arc;

use crate::config::Config;
use botpilot_agent_client::AgentApiClient;
use botpilot_core::automation::{
    AutomationService, AutomationServiceTrait, QueueConfig, StatusBroadcaster, WorkerAdapter,
};
use botpilot_core::settings::{AccountSettingsService, AccountSettingsServiceTrait};
use botpilot_core::utils::SystemClock;
use botpilot_storage_sqlite::{db, settings::AccountSettingsRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub settings_service: Arc<dyn AccountSettingsServiceTrait>,
    pub automation_service: Arc<dyn AutomationServiceTrait>,
    pub db_path: String,
}

pub fn init_tracing() {
    let log_format = std::env::var("BP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Wires the production state: SQLite settings store and the HTTP agent.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let worker = Arc::new(AgentApiClient::new(
        &config.agent_url,
        config.agent_poll_interval,
    )?);
    tracing::info!("Automation agent at {}", worker.base_url());
    build_state_with_worker(config, worker).await
}

/// Same as [`build_state`] with a caller-supplied worker adapter.
pub async fn build_state_with_worker(
    config: &Config,
    worker: Arc<dyn WorkerAdapter>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let settings_repo = Arc::new(AccountSettingsRepository::new(pool.clone(), writer));
    let settings_service: Arc<dyn AccountSettingsServiceTrait> =
        Arc::new(AccountSettingsService::new(settings_repo));

    let automation_service = Arc::new(AutomationService::new(
        settings_service.clone(),
        worker,
        StatusBroadcaster::default(),
        Arc::new(SystemClock),
        QueueConfig {
            worker_timeout: config.worker_timeout,
            ..QueueConfig::default()
        },
    ));

    Ok(Arc::new(AppState {
        settings_service,
        automation_service,
        db_path,
    }))
}
