//! SurrealDB implementation of [`InstructorBalanceRepository`].

use chrono::{DateTime, Utc};
use coursecraft_core::error::CoreResult;
use coursecraft_core::models::balance::InstructorBalance;
use coursecraft_core::repository::InstructorBalanceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct BalanceRow {
    user_id: String,
    current_balance: i64,
    created_at: DateTime<Utc>,
}

impl BalanceRow {
    fn try_into_balance(self) -> Result<InstructorBalance, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(InstructorBalance {
            user_id,
            current_balance: self.current_balance,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the InstructorBalance repository.
#[derive(Clone)]
pub struct SurrealInstructorBalanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInstructorBalanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InstructorBalanceRepository for SurrealInstructorBalanceRepository<C> {
    async fn ensure_ledger(&self, user_id: Uuid) -> CoreResult<InstructorBalance> {
        let user_id_str = user_id.to_string();

        // Keyed by the user UUID; the coalesce keeps an existing balance
        // untouched while a first write starts at zero.
        let result = self
            .db
            .query(
                "UPSERT type::record('instructor_balance', $user_id) SET \
                 user_id = $user_id, \
                 current_balance = current_balance ?? 0",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<BalanceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "instructor_balance".into(),
            id: user_id_str,
        })?;

        Ok(row.try_into_balance()?)
    }

    async fn get_by_user(&self, user_id: Uuid) -> CoreResult<Option<InstructorBalance>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('instructor_balance', $user_id)")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BalanceRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_balance()?)),
            None => Ok(None),
        }
    }
}
