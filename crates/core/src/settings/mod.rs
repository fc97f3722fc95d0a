//! Account settings store - the opaque JSON configuration blob per account.

mod settings_model;
mod settings_service;
mod settings_traits;

pub use settings_model::AccountSettings;
pub use settings_service::{AccountSettingsService, AccountSettingsServiceTrait};
pub use settings_traits::AccountSettingsRepositoryTrait;
