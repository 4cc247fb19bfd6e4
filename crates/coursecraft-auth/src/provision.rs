//! Account provisioning — user records and their dependent rows.

use std::sync::Arc;

use coursecraft_core::error::CoreResult;
use coursecraft_core::mail::MailDispatcher;
use coursecraft_core::models::token::TokenPurpose;
use coursecraft_core::models::user::{CreateUser, SocialProvider, User, UserRole};
use coursecraft_core::repository::{
    InstructorBalanceRepository, TokenRepository, UserRepository, UserSettingsRepository,
};
use tracing::error;
use uuid::Uuid;

use crate::store::TokenStore;

/// Creates and deletes users together with their settings and ledger
/// rows, and kicks off the verification email side effect for local
/// registrations.
#[derive(Clone)]
pub struct AccountProvisioner<U, S, B, T>
where
    T: TokenRepository,
{
    users: U,
    settings: S,
    balances: B,
    tokens: TokenStore<T>,
    mailer: Arc<dyn MailDispatcher>,
}

impl<U, S, B, T> AccountProvisioner<U, S, B, T>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    pub fn new(
        users: U,
        settings: S,
        balances: B,
        tokens: TokenStore<T>,
        mailer: Arc<dyn MailDispatcher>,
    ) -> Self {
        Self {
            users,
            settings,
            balances,
            tokens,
            mailer,
        }
    }

    /// Create a self-registered account: user row (with the already
    /// hashed password) plus unverified settings.
    ///
    /// Verify-email token issuance and mail dispatch run on a detached
    /// task — the returned user does not wait on them, and their
    /// failure is logged, never surfaced.
    pub async fn create_local(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> CoreResult<User> {
        let user = self
            .users
            .create(CreateUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash: Some(password_hash.to_string()),
                avatar_url: None,
                role: UserRole::Student,
                social: None,
            })
            .await?;

        self.settings.create(user.id, false).await?;

        let tokens = self.tokens.clone();
        let mailer = Arc::clone(&self.mailer);
        let (user_id, to, name) = (user.id, user.email.clone(), user.username.clone());
        tokio::spawn(async move {
            let outcome: CoreResult<()> = async {
                tokens.issue(user_id, TokenPurpose::VerifyEmail).await?;
                mailer.send_verification_email(&to, &name, user_id).await
            }
            .await;

            if let Err(err) = outcome {
                error!(user_id = %user_id, error = %err, "verification email dispatch failed");
            }
        });

        Ok(user)
    }

    /// Create an account from a federated identity: the provider's
    /// attestation is trusted, so the settings row starts verified and
    /// the zero-balance ledger exists from the start. No verification
    /// token is ever issued.
    pub async fn create_social(
        &self,
        email: &str,
        avatar_url: Option<&str>,
        username: &str,
        provider: SocialProvider,
    ) -> CoreResult<User> {
        let user = self
            .users
            .create(CreateUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash: None,
                avatar_url: avatar_url.map(str::to_string),
                role: UserRole::Student,
                social: Some(provider),
            })
            .await?;

        self.settings.create(user.id, true).await?;
        self.balances.ensure_ledger(user.id).await?;

        Ok(user)
    }

    /// Flip the settings row to verified and make sure the zero-balance
    /// ledger row exists, exactly once per user.
    pub async fn mark_email_verified(&self, user_id: Uuid) -> CoreResult<()> {
        self.settings.mark_email_verified(user_id).await?;
        self.balances.ensure_ledger(user_id).await?;
        Ok(())
    }

    /// Hard-delete a user and its dependent rows. Used to discard an
    /// abandoned unverified self-registration superseded by a federated
    /// login under the same email.
    pub async fn delete_by_id(&self, user_id: Uuid) -> CoreResult<()> {
        self.users.delete(user_id).await
    }
}
