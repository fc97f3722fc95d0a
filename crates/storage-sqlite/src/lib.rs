//! SQLite storage implementation for botpilot.
//!
//! This crate is the only place where Diesel dependencies exist. It implements
//! the repository traits defined in `botpilot-core`:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - Repository implementations with database-specific model types
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

// Repository implementations
pub mod settings;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from botpilot-core for convenience
pub use botpilot_core::errors::{DatabaseError, Error, Result};
