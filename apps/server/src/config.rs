use std::{net::SocketAddr, time::Duration};

use botpilot_agent_client::DEFAULT_AGENT_URL;
use botpilot_core::constants::DEFAULT_WORKER_TIMEOUT_SECS;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub static_dir: String,
    pub agent_url: String,
    pub agent_poll_interval: Duration,
    pub worker_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/botpilot.db".into(),
            cors_allow: vec!["*".into()],
            request_timeout: Duration::from_millis(30000),
            static_dir: "dist".into(),
            agent_url: DEFAULT_AGENT_URL.into(),
            agent_poll_interval: Duration::from_millis(2000),
            worker_timeout: Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = std::env::var("BP_LISTEN_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.listen_addr);
        let db_path = std::env::var("BP_DB_PATH").unwrap_or(defaults.db_path);
        let cors_allow = std::env::var("BP_CORS_ALLOW_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or(defaults.cors_allow);
        let static_dir = std::env::var("BP_STATIC_DIR").unwrap_or(defaults.static_dir);
        let agent_url = std::env::var("BP_AGENT_URL").unwrap_or(defaults.agent_url);

        Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(env_u64("BP_REQUEST_TIMEOUT_MS", 30000)),
            static_dir,
            agent_url,
            agent_poll_interval: Duration::from_millis(env_u64("BP_AGENT_POLL_INTERVAL_MS", 2000)),
            worker_timeout: Duration::from_secs(env_u64(
                "BP_WORKER_TIMEOUT_SECS",
                DEFAULT_WORKER_TIMEOUT_SECS,
            )),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
