//! Database model for account settings.

use botpilot_core::settings::AccountSettings;
use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;

/// One row of `account_settings`. The blob is kept as JSON text.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::account_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountSettingsDB {
    pub account_id: String,
    pub settings_json: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<AccountSettingsDB> for AccountSettings {
    type Error = StorageError;

    fn try_from(db: AccountSettingsDB) -> Result<Self, Self::Error> {
        Ok(AccountSettings {
            settings: serde_json::from_str(&db.settings_json)?,
            account_id: db.account_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
        })
    }
}
