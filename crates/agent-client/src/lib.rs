//! HTTP worker adapter for the botpilot automation agent.
//!
//! The agent applies one account's configuration at a time. This crate
//! submits the job, then polls until the agent reports a terminal status.

mod client;

pub use client::{AgentApiClient, AgentApplyStatus, AgentStatusResponse, DEFAULT_AGENT_URL};
