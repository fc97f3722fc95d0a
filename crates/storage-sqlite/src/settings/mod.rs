//! SQLite storage implementation for account settings.

mod model;
mod repository;

pub use model::AccountSettingsDB;
pub use repository::AccountSettingsRepository;

// Re-export trait from core for convenience
pub use botpilot_core::settings::AccountSettingsRepositoryTrait;
