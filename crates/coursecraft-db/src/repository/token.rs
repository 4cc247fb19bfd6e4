//! SurrealDB implementation of [`TokenRepository`].
//!
//! The record key is `{user_id}_{purpose}`, which makes re-issuance an
//! atomic replace: UPSERT against the same key overwrites the earlier
//! row instead of racing the unique `(user_id, purpose)` index.

use chrono::{DateTime, Utc};
use coursecraft_core::error::CoreResult;
use coursecraft_core::models::token::{Token, TokenPurpose, UpsertToken};
use coursecraft_core::repository::TokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn record_key(user_id: Uuid, purpose: TokenPurpose) -> String {
    format!("{}_{}", user_id, purpose.as_str())
}

#[derive(Debug, SurrealValue)]
struct TokenRow {
    user_id: String,
    purpose: String,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TokenRowWithId {
    record_id: String,
    user_id: String,
    purpose: String,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_purpose(s: &str) -> Result<TokenPurpose, DbError> {
    TokenPurpose::parse(s)
        .ok_or_else(|| DbError::Migration(format!("unknown token purpose: {s}")))
}

impl TokenRow {
    fn into_token(self, id: String) -> Result<Token, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(Token {
            id,
            user_id,
            purpose: parse_purpose(&self.purpose)?,
            token: self.token,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl TokenRowWithId {
    fn try_into_token(self) -> Result<Token, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(Token {
            id: self.record_id,
            user_id,
            purpose: parse_purpose(&self.purpose)?,
            token: self.token,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Token repository.
#[derive(Clone)]
pub struct SurrealTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TokenRepository for SurrealTokenRepository<C> {
    async fn upsert(&self, input: UpsertToken) -> CoreResult<Token> {
        let key = record_key(input.user_id, input.purpose);

        // $token is a protected variable in SurrealDB, hence $tok.
        let result = self
            .db
            .query(
                "UPSERT type::record('token', $id) SET \
                 user_id = $user_id, \
                 purpose = $purpose, \
                 token = $tok, \
                 expires_at = $expires_at, \
                 created_at = time::now()",
            )
            .bind(("id", key.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("purpose", input.purpose.as_str().to_string()))
            .bind(("tok", input.token))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "token".into(),
            id: key.clone(),
        })?;

        Ok(row.into_token(key)?)
    }

    async fn consume(&self, purpose: TokenPurpose, token: &str) -> CoreResult<Token> {
        let token_owned = token.to_string();

        // Single conditional write: only a still-live row is matched and
        // invalidated, so concurrent consumers cannot both win. The
        // returned expiry is the pre-update value.
        let result = self
            .db
            .query(
                "UPDATE token SET expires_at = time::now() \
                 WHERE purpose = $purpose AND token = $tok \
                 AND expires_at > time::now() \
                 RETURN meta::id(id) AS record_id, user_id, purpose, \
                 token, $before.expires_at AS expires_at, created_at",
            )
            .bind(("purpose", purpose.as_str().to_string()))
            .bind(("tok", token_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TokenRowWithId> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.try_into_token()?);
        }

        // Nothing matched: distinguish a dead row from no row at all.
        let mut lookup = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM token \
                 WHERE purpose = $purpose AND token = $tok",
            )
            .bind(("purpose", purpose.as_str().to_string()))
            .bind(("tok", token_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let existing: Vec<TokenRowWithId> = lookup.take(0).map_err(DbError::from)?;
        if existing.is_empty() {
            Err(DbError::NotFound {
                entity: "token".into(),
                id: format!("purpose={}", purpose.as_str()),
            }
            .into())
        } else {
            Err(DbError::TokenExpired.into())
        }
    }

    async fn find_live(&self, user_id: Uuid, purpose: TokenPurpose) -> CoreResult<Option<Token>> {
        let key = record_key(user_id, purpose);

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('token', $id) \
                 WHERE expires_at > time::now()",
            )
            .bind(("id", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_token(key)?)),
            None => Ok(None),
        }
    }

    async fn cleanup_expired(&self) -> CoreResult<u64> {
        // Count expired rows first, then delete.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM token \
                 WHERE expires_at <= time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE token WHERE expires_at <= time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
