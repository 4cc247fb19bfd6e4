//! External identity provider contract.

use async_trait::async_trait;

use crate::error::CoreResult;

/// Profile attributes normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialProfile {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// One implementation per provider: verifies or exchanges the supplied
/// access token and returns the normalized profile.
///
/// `external_user_id` is only meaningful for providers whose profile
/// endpoint is keyed by user id (Facebook's Graph API).
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    async fn fetch_profile(
        &self,
        access_token: &str,
        external_user_id: Option<&str>,
    ) -> CoreResult<SocialProfile>;
}
