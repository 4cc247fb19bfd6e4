//! SurrealDB implementation of [`UserSettingsRepository`].
//!
//! The record key is the owning user's UUID, so the one-row-per-user
//! invariant is enforced by the key itself on top of the unique index.

use chrono::{DateTime, Utc};
use coursecraft_core::error::CoreResult;
use coursecraft_core::models::settings::UserSettings;
use coursecraft_core::repository::UserSettingsRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_unique_violation};

#[derive(Debug, SurrealValue)]
struct SettingsRow {
    user_id: String,
    is_email_verified: bool,
    created_at: DateTime<Utc>,
}

impl SettingsRow {
    fn try_into_settings(self) -> Result<UserSettings, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(UserSettings {
            user_id,
            is_email_verified: self.is_email_verified,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the UserSettings repository.
#[derive(Clone)]
pub struct SurrealUserSettingsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserSettingsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserSettingsRepository for SurrealUserSettingsRepository<C> {
    async fn create(&self, user_id: Uuid, is_email_verified: bool) -> CoreResult<UserSettings> {
        let user_id_str = user_id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user_settings', $user_id) SET \
                 user_id = $user_id, \
                 is_email_verified = $is_email_verified",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("is_email_verified", is_email_verified))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists {
                    entity: "user_settings".into(),
                }
            } else {
                DbError::Migration(e.to_string())
            }
        })?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_settings".into(),
            id: user_id_str,
        })?;

        Ok(row.try_into_settings()?)
    }

    async fn get_by_user(&self, user_id: Uuid) -> CoreResult<UserSettings> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user_settings', $user_id)")
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user_settings".into(),
            id: user_id_str,
        })?;

        Ok(row.try_into_settings()?)
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> CoreResult<()> {
        let user_id_str = user_id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user_settings', $user_id) SET \
                 is_email_verified = true",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SettingsRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user_settings".into(),
                id: user_id_str,
            }
            .into());
        }

        Ok(())
    }
}
