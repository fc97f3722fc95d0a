use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use super::model::AccountSettingsDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::account_settings;
use botpilot_core::errors::Result;
use botpilot_core::settings::{AccountSettings, AccountSettingsRepositoryTrait};

pub struct AccountSettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AccountSettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        AccountSettingsRepository { pool, writer }
    }
}

#[async_trait]
impl AccountSettingsRepositoryTrait for AccountSettingsRepository {
    fn get_settings(&self, account_id: &str) -> Result<Option<AccountSettings>> {
        let mut conn = get_connection(&self.pool)?;
        let row = account_settings::table
            .find(account_id)
            .select(AccountSettingsDB::as_select())
            .first(&mut conn)
            .optional()
            .into_core()?;

        match row {
            Some(row) => Ok(Some(AccountSettings::try_from(row)?)),
            None => Ok(None),
        }
    }

    fn list_account_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        account_settings::table
            .select(account_settings::account_id)
            .order(account_settings::account_id.asc())
            .load::<String>(&mut conn)
            .into_core()
    }

    async fn upsert_settings(
        &self,
        account_id: &str,
        settings: serde_json::Value,
    ) -> Result<AccountSettings> {
        let now = Utc::now().naive_utc();
        let row = AccountSettingsDB {
            account_id: account_id.to_string(),
            settings_json: serde_json::to_string(&settings).map_err(StorageError::from)?,
            created_at: now,
            updated_at: now,
        };

        let saved = self
            .writer
            .exec(move |conn| {
                diesel::insert_into(account_settings::table)
                    .values(&row)
                    .on_conflict(account_settings::account_id)
                    .do_update()
                    .set((
                        account_settings::settings_json.eq(&row.settings_json),
                        account_settings::updated_at.eq(row.updated_at),
                    ))
                    .execute(conn)
                    .into_core()?;

                account_settings::table
                    .find(&row.account_id)
                    .select(AccountSettingsDB::as_select())
                    .first(conn)
                    .into_core()
            })
            .await?;

        Ok(AccountSettings::try_from(saved)?)
    }
}
