//! Token store — persistence-backed lifecycle for purpose-scoped
//! tokens.
//!
//! Signing lives in [`crate::token`]; this layer owns issuance
//! (sign + replace-on-conflict upsert) and consumption (verify +
//! single conditional invalidation in the repository).

use chrono::{Duration, Utc};
use coursecraft_core::error::CoreResult;
use coursecraft_core::models::token::{Token, TokenPurpose, UpsertToken};
use coursecraft_core::repository::TokenRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::token;

/// Generic over the repository implementation so the auth layer has no
/// dependency on the database crate.
#[derive(Clone)]
pub struct TokenStore<T: TokenRepository> {
    repo: T,
    config: AuthConfig,
}

impl<T: TokenRepository> TokenStore<T> {
    pub fn new(repo: T, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    /// Sign a fresh token for `(user_id, purpose)` and upsert it,
    /// atomically replacing any earlier unconsumed token for the same
    /// pair. Re-issuance is therefore idempotent: only the last-issued
    /// string remains consumable.
    pub async fn issue(&self, user_id: Uuid, purpose: TokenPurpose) -> CoreResult<Token> {
        let ttl_secs = self.config.email_token_lifetime_secs;
        let signed = token::issue_token(user_id, purpose, ttl_secs, &self.config)?;
        let expires_at = Utc::now() + Duration::seconds(ttl_secs as i64);

        self.repo
            .upsert(UpsertToken {
                user_id,
                purpose,
                token: signed,
                expires_at,
            })
            .await
    }

    /// Validate and invalidate a token in one pass.
    ///
    /// Signature and purpose are checked against the signed string;
    /// expiry and single-use are enforced against the persisted row
    /// (the source of truth). Returns the pre-invalidation record.
    pub async fn consume(&self, purpose: TokenPurpose, signed: &str) -> CoreResult<Token> {
        token::verify_token(signed, purpose, &self.config)?;
        self.repo.consume(purpose, signed).await
    }

    /// The still-valid token for `(user_id, purpose)`, if any.
    pub async fn find_live(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> CoreResult<Option<Token>> {
        self.repo.find_live(user_id, purpose).await
    }

    /// Garbage-collect rows past their expiry. Returns the number of
    /// rows removed.
    pub async fn cleanup_expired(&self) -> CoreResult<u64> {
        self.repo.cleanup_expired().await
    }
}
