//! Botpilot Core - automation-apply coordination, services, and traits.
//!
//! This crate owns the apply queue, the per-account cooldown and the status
//! broadcaster. It is storage-agnostic and defines traits that are implemented
//! by the `storage-sqlite` and `agent-client` crates.

pub mod automation;
pub mod constants;
pub mod errors;
pub mod settings;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
