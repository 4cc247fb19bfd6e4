//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in the
//! `coursecraft-db` crate; the auth services are generic over these
//! traits so the auth layer has no dependency on the database crate.

use std::future::Future;

use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::{
    balance::InstructorBalance,
    settings::UserSettings,
    token::{Token, TokenPurpose, UpsertToken},
    user::{CreateUser, User},
};

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CoreResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CoreResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CoreResult<User>> + Send;
    fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = CoreResult<()>> + Send;
    /// Hard delete. Cascades to settings, ledger, and token rows.
    fn delete(&self, id: Uuid) -> impl Future<Output = CoreResult<()>> + Send;
}

pub trait UserSettingsRepository: Send + Sync {
    fn create(
        &self,
        user_id: Uuid,
        is_email_verified: bool,
    ) -> impl Future<Output = CoreResult<UserSettings>> + Send;
    fn get_by_user(&self, user_id: Uuid) -> impl Future<Output = CoreResult<UserSettings>> + Send;
    fn mark_email_verified(&self, user_id: Uuid) -> impl Future<Output = CoreResult<()>> + Send;
}

pub trait InstructorBalanceRepository: Send + Sync {
    /// Create the zero-balance ledger row for a user if it does not
    /// exist yet; an existing row is left untouched.
    fn ensure_ledger(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CoreResult<InstructorBalance>> + Send;
    fn get_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CoreResult<Option<InstructorBalance>>> + Send;
}

pub trait TokenRepository: Send + Sync {
    /// Insert a new token row, or atomically replace any existing row
    /// sharing `(user_id, purpose)`. Repeated issuance for the same
    /// purpose therefore invalidates earlier unconsumed tokens rather
    /// than accumulating them.
    fn upsert(&self, input: UpsertToken) -> impl Future<Output = CoreResult<Token>> + Send;

    /// Validate-and-invalidate in one conditional write: the row
    /// matching `(purpose, token)` has its expiry set to now, but only
    /// if it is still live. Returns the pre-update record.
    ///
    /// Fails `NotFound` if no row matches (forged or superseded token)
    /// and `TokenExpired` if the row exists but is past its expiry.
    fn consume(
        &self,
        purpose: TokenPurpose,
        token: &str,
    ) -> impl Future<Output = CoreResult<Token>> + Send;

    /// The still-valid token for `(user_id, purpose)`, if any.
    fn find_live(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> impl Future<Output = CoreResult<Option<Token>>> + Send;

    /// Remove all naturally expired (or consumed) rows.
    fn cleanup_expired(&self) -> impl Future<Output = CoreResult<u64>> + Send;
}
