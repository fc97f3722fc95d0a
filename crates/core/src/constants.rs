/// Fixed minimum interval between two accepted apply requests for one account.
pub const COOLDOWN_WINDOW_SECS: i64 = 5 * 60;

/// Default upper bound for a single worker invocation.
pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 10 * 60;

/// Capacity of the status broadcast channel. Slow subscribers beyond this lag and drop events.
pub const STATUS_CHANNEL_CAPACITY: usize = 256;

/// Maximum accepted length of an account identifier.
pub const ACCOUNT_ID_MAX_LEN: usize = 64;

/// Event name for queue snapshots, shared with the web client.
pub const QUEUE_STATUS_EVENT: &str = "queue-status";

/// Event name for per-account job transitions, shared with the web client.
pub const AUTOMATION_STATUS_EVENT: &str = "automation-status";
