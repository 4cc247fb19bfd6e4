//! Federated (social) login — one stateless authenticator per external
//! identity provider, dispatched through a provider-tag lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use coursecraft_core::error::{CoreError, CoreResult};
use coursecraft_core::identity::{IdentityProviderClient, SocialProfile};
use coursecraft_core::models::user::{SocialProvider, User};
use coursecraft_core::repository::{
    InstructorBalanceRepository, TokenRepository, UserRepository, UserSettingsRepository,
};
use tracing::warn;

use crate::provision::AccountProvisioner;

/// Common login capability every provider variant implements.
#[async_trait]
pub trait SocialAuthenticator: Send + Sync {
    /// Authenticate a provider-issued access token and return the
    /// matching (or freshly provisioned) user.
    async fn login(&self, access_token: &str, external_user_id: Option<&str>) -> CoreResult<User>;
}

/// Provider-tag → authenticator lookup. An unrecognized or unmapped
/// tag fails `InvalidProvider`.
#[derive(Default)]
pub struct SocialLogin {
    handlers: HashMap<SocialProvider, Arc<dyn SocialAuthenticator>>,
}

impl SocialLogin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(
        mut self,
        provider: SocialProvider,
        handler: Arc<dyn SocialAuthenticator>,
    ) -> Self {
        self.handlers.insert(provider, handler);
        self
    }

    pub async fn login(
        &self,
        provider_tag: &str,
        access_token: &str,
        external_user_id: Option<&str>,
    ) -> CoreResult<User> {
        let provider = SocialProvider::parse(provider_tag).ok_or_else(|| {
            CoreError::InvalidProvider {
                provider: provider_tag.to_string(),
            }
        })?;

        let handler = self
            .handlers
            .get(&provider)
            .ok_or_else(|| CoreError::InvalidProvider {
                provider: provider_tag.to_string(),
            })?;

        handler.login(access_token, external_user_id).await
    }
}

/// Translate provider-side failures (bad assertion, network error,
/// audience mismatch) into the uniform `Unauthorized`; persistence
/// failures pass through unchanged.
fn provider_unauthorized(err: CoreError) -> CoreError {
    match err {
        CoreError::Provider(detail) => {
            warn!(detail = %detail, "identity provider rejected the assertion");
            CoreError::Unauthorized {
                reason: "social login failed".into(),
            }
        }
        other => other,
    }
}

/// Shared lookup used by the providers that treat an unverified local
/// account as an abandoned shell: delete it and provision a fresh
/// pre-verified social account; reuse a verified account as-is.
async fn login_replacing_unverified<U, S, B, T>(
    users: &U,
    settings: &S,
    provisioner: &AccountProvisioner<U, S, B, T>,
    provider: SocialProvider,
    profile: &SocialProfile,
) -> CoreResult<User>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    match users.get_by_email(&profile.email).await {
        Ok(existing) => {
            let existing_settings = settings.get_by_user(existing.id).await?;
            if existing_settings.is_email_verified {
                return Ok(existing);
            }

            provisioner.delete_by_id(existing.id).await?;
            provisioner
                .create_social(
                    &profile.email,
                    profile.avatar_url.as_deref(),
                    &profile.name,
                    provider,
                )
                .await
        }
        Err(CoreError::NotFound { .. }) => {
            provisioner
                .create_social(
                    &profile.email,
                    profile.avatar_url.as_deref(),
                    &profile.name,
                    provider,
                )
                .await
        }
        Err(e) => Err(e),
    }
}

/// Google login: the id-token is verified against Google's tokeninfo
/// endpoint. Only a verified-email account counts as an existing match;
/// an unverified account holding the email blocks the login.
pub struct GoogleAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    client: Arc<dyn IdentityProviderClient>,
    users: U,
    settings: S,
    provisioner: AccountProvisioner<U, S, B, T>,
}

impl<U, S, B, T> GoogleAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    pub fn new(
        client: Arc<dyn IdentityProviderClient>,
        users: U,
        settings: S,
        provisioner: AccountProvisioner<U, S, B, T>,
    ) -> Self {
        Self {
            client,
            users,
            settings,
            provisioner,
        }
    }
}

#[async_trait]
impl<U, S, B, T> SocialAuthenticator for GoogleAuthenticator<U, S, B, T>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    async fn login(&self, access_token: &str, external_user_id: Option<&str>) -> CoreResult<User> {
        let profile = self
            .client
            .fetch_profile(access_token, external_user_id)
            .await
            .map_err(provider_unauthorized)?;

        match self.users.get_by_email(&profile.email).await {
            Ok(existing) => {
                let existing_settings = self.settings.get_by_user(existing.id).await?;
                if existing_settings.is_email_verified {
                    Ok(existing)
                } else {
                    // The email is held by an unverified local shell;
                    // Google matches only verified accounts.
                    Err(CoreError::Unauthorized {
                        reason: "social login failed".into(),
                    })
                }
            }
            Err(CoreError::NotFound { .. }) => {
                self.provisioner
                    .create_social(
                        &profile.email,
                        profile.avatar_url.as_deref(),
                        &profile.name,
                        SocialProvider::Google,
                    )
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

/// Facebook login: profile fetched from the Graph API using the access
/// token and external user id. An unverified local account under the
/// same email is deleted and replaced by a fresh pre-verified one.
pub struct FacebookAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    client: Arc<dyn IdentityProviderClient>,
    users: U,
    settings: S,
    provisioner: AccountProvisioner<U, S, B, T>,
}

impl<U, S, B, T> FacebookAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    pub fn new(
        client: Arc<dyn IdentityProviderClient>,
        users: U,
        settings: S,
        provisioner: AccountProvisioner<U, S, B, T>,
    ) -> Self {
        Self {
            client,
            users,
            settings,
            provisioner,
        }
    }
}

#[async_trait]
impl<U, S, B, T> SocialAuthenticator for FacebookAuthenticator<U, S, B, T>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    async fn login(&self, access_token: &str, external_user_id: Option<&str>) -> CoreResult<User> {
        let profile = self
            .client
            .fetch_profile(access_token, external_user_id)
            .await
            .map_err(provider_unauthorized)?;

        login_replacing_unverified(
            &self.users,
            &self.settings,
            &self.provisioner,
            SocialProvider::Facebook,
            &profile,
        )
        .await
    }
}

/// GitHub login: profile fetched from the REST API with the bearer
/// token; mirrors the Facebook replace-unverified pattern.
pub struct GithubAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    client: Arc<dyn IdentityProviderClient>,
    users: U,
    settings: S,
    provisioner: AccountProvisioner<U, S, B, T>,
}

impl<U, S, B, T> GithubAuthenticator<U, S, B, T>
where
    T: TokenRepository,
{
    pub fn new(
        client: Arc<dyn IdentityProviderClient>,
        users: U,
        settings: S,
        provisioner: AccountProvisioner<U, S, B, T>,
    ) -> Self {
        Self {
            client,
            users,
            settings,
            provisioner,
        }
    }
}

#[async_trait]
impl<U, S, B, T> SocialAuthenticator for GithubAuthenticator<U, S, B, T>
where
    U: UserRepository + Clone + 'static,
    S: UserSettingsRepository + Clone + 'static,
    B: InstructorBalanceRepository + Clone + 'static,
    T: TokenRepository + Clone + 'static,
{
    async fn login(&self, access_token: &str, external_user_id: Option<&str>) -> CoreResult<User> {
        let profile = self
            .client
            .fetch_profile(access_token, external_user_id)
            .await
            .map_err(provider_unauthorized)?;

        login_replacing_unverified(
            &self.users,
            &self.settings,
            &self.provisioner,
            SocialProvider::Github,
            &profile,
        )
        .await
    }
}
