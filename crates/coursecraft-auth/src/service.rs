//! Credential authentication service — login, registration, email
//! verification, and the password reset/change flows.

use std::sync::Arc;

use coursecraft_core::error::{CoreError, CoreResult};
use coursecraft_core::mail::MailDispatcher;
use coursecraft_core::models::token::TokenPurpose;
use coursecraft_core::models::user::User;
use coursecraft_core::repository::{
    InstructorBalanceRepository, TokenRepository, UserRepository, UserSettingsRepository,
};
use tracing::error;

use crate::config::AuthConfig;
use crate::password;
use crate::provision::AccountProvisioner;
use crate::store::TokenStore;

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Orchestrates password-based authentication over the token store and
/// the account provisioner.
///
/// Generic over repository implementations so that the auth layer has
/// no dependency on the database crate.
pub struct AuthService<U, S, B, T>
where
    T: TokenRepository,
{
    users: U,
    settings: S,
    provisioner: AccountProvisioner<U, S, B, T>,
    tokens: TokenStore<T>,
    mailer: Arc<dyn MailDispatcher>,
    config: AuthConfig,
}

impl<U, S, B, T> AuthService<U, S, B, T>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    pub fn new(
        users: U,
        settings: S,
        provisioner: AccountProvisioner<U, S, B, T>,
        tokens: TokenStore<T>,
        mailer: Arc<dyn MailDispatcher>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            settings,
            provisioner,
            tokens,
            mailer,
            config,
        }
    }

    /// Authenticate a user with email + password.
    ///
    /// Every credential failure mode — unknown email, unverified email,
    /// social-only account, wrong password — yields the one identical
    /// `Unauthorized` error so account existence is never revealed.
    /// Infrastructure failures propagate unchanged.
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<User> {
        let user = match self.users.get_by_email(email).await {
            Ok(user) => user,
            Err(CoreError::NotFound { .. }) => return Err(CoreError::bad_credentials()),
            Err(e) => return Err(e),
        };

        let settings = match self.settings.get_by_user(user.id).await {
            Ok(settings) => settings,
            Err(CoreError::NotFound { .. }) => return Err(CoreError::bad_credentials()),
            Err(e) => return Err(e),
        };
        if !settings.is_email_verified {
            return Err(CoreError::bad_credentials());
        }

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(CoreError::bad_credentials());
        };

        let valid = password::verify_password(password, hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(CoreError::bad_credentials());
        }

        Ok(user)
    }

    /// Register a local account. Returns the created user without
    /// waiting on verification-email dispatch.
    pub async fn register(&self, input: RegisterInput) -> CoreResult<User> {
        let hash = password::hash_password(&input.password, self.config.pepper.as_deref())?;
        self.provisioner
            .create_local(&input.email, &input.username, &hash)
            .await
    }

    /// Consume a verify-email token and mark the owning account
    /// verified (which also creates the zero-balance instructor
    /// ledger). Fails `NotFound` or `TokenExpired` as propagated from
    /// the store.
    pub async fn verify_email(&self, token: &str) -> CoreResult<()> {
        let record = self.tokens.consume(TokenPurpose::VerifyEmail, token).await?;
        self.provisioner.mark_email_verified(record.user_id).await
    }

    /// Issue (or re-issue, superseding any earlier one) a reset
    /// password token and dispatch the reset email on a detached task.
    ///
    /// Unlike login, an unknown email fails `NotFound` here.
    pub async fn forgot_password(&self, email: &str) -> CoreResult<()> {
        let user = self.users.get_by_email(email).await?;

        self.tokens
            .issue(user.id, TokenPurpose::ResetPassword)
            .await?;

        let mailer = Arc::clone(&self.mailer);
        let (user_id, to, name) = (user.id, user.email, user.username);
        tokio::spawn(async move {
            if let Err(err) = mailer.send_password_reset_email(&name, &to, user_id).await {
                error!(user_id = %user_id, error = %err, "reset password email dispatch failed");
            }
        });

        Ok(())
    }

    /// Consume a reset token and overwrite the owner's password hash.
    /// Trust is rooted in token possession — no prior-password check.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> CoreResult<()> {
        let record = self
            .tokens
            .consume(TokenPurpose::ResetPassword, token)
            .await?;

        let hash = password::hash_password(new_password, self.config.pepper.as_deref())?;
        self.users.update_password(record.user_id, &hash).await
    }

    /// Change the password of an already-authenticated user. The old
    /// password must verify; otherwise the stored hash is untouched.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> CoreResult<()> {
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(CoreError::Unauthorized {
                reason: "incorrect password".into(),
            });
        };

        let valid = password::verify_password(old_password, hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(CoreError::Unauthorized {
                reason: "incorrect password".into(),
            });
        }

        let new_hash = password::hash_password(new_password, self.config.pepper.as_deref())?;
        self.users.update_password(user.id, &new_hash).await
    }
}
