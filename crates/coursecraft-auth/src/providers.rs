//! Identity provider HTTP clients.
//!
//! One reqwest-backed client per provider, each implementing the
//! [`IdentityProviderClient`] contract. Every client carries an
//! explicit request timeout; there is no retry — a failed provider
//! call fails the login attempt.

use std::time::Duration;

use async_trait::async_trait;
use coursecraft_core::error::CoreError;
use coursecraft_core::identity::{IdentityProviderClient, SocialProfile};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const GOOGLE_API_BASE: &str = "https://oauth2.googleapis.com";
const FACEBOOK_GRAPH_BASE: &str = "https://graph.facebook.com/v17.0";
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Provider client errors.
#[derive(Debug, Error)]
pub enum ProviderApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("provider error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The provider response lacked required fields.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The call shape was wrong for this provider.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<ProviderApiError> for CoreError {
    fn from(err: ProviderApiError) -> Self {
        CoreError::Provider(err.to_string())
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

// -----------------------------------------------------------------------
// Google
// -----------------------------------------------------------------------

/// Application identity registered with Google; the tokeninfo `aud`
/// claim must match `client_id`.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

/// Verifies Google id-tokens against the tokeninfo endpoint and checks
/// the audience against the configured client id.
#[derive(Clone)]
pub struct GoogleIdentityClient {
    http: Client,
    config: GoogleConfig,
    base_url: String,
}

impl GoogleIdentityClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: build_http_client(),
            config,
            base_url: GOOGLE_API_BASE.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn token_info(&self, id_token: &str) -> Result<GoogleTokenInfo, ProviderApiError> {
        let response = self
            .http
            .get(format!("{}/tokeninfo", self.base_url))
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderApiError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProviderClient for GoogleIdentityClient {
    async fn fetch_profile(
        &self,
        access_token: &str,
        _external_user_id: Option<&str>,
    ) -> Result<SocialProfile, CoreError> {
        let info = self.token_info(access_token).await?;

        if info.aud != self.config.client_id {
            return Err(ProviderApiError::InvalidResponse("audience mismatch".into()).into());
        }

        let name = info.name.unwrap_or_else(|| info.email.clone());
        Ok(SocialProfile {
            email: info.email,
            name,
            avatar_url: info.picture,
        })
    }
}

// -----------------------------------------------------------------------
// Facebook
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Debug, Deserialize)]
struct FacebookUserInfo {
    name: String,
    email: Option<String>,
    picture: Option<FacebookPicture>,
}

/// Fetches profile info from the Graph API using
/// `(access_token, external_user_id)`.
#[derive(Clone)]
pub struct FacebookGraphClient {
    http: Client,
    base_url: String,
}

impl Default for FacebookGraphClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FacebookGraphClient {
    pub fn new() -> Self {
        Self {
            http: build_http_client(),
            base_url: FACEBOOK_GRAPH_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl IdentityProviderClient for FacebookGraphClient {
    async fn fetch_profile(
        &self,
        access_token: &str,
        external_user_id: Option<&str>,
    ) -> Result<SocialProfile, CoreError> {
        let external_user_id = external_user_id.ok_or_else(|| {
            ProviderApiError::BadRequest("facebook login requires the external user id".into())
        })?;

        let response = self
            .http
            .get(format!("{}/{}", self.base_url, external_user_id))
            .query(&[
                ("fields", "id,name,email,picture"),
                ("access_token", access_token),
            ])
            .send()
            .await
            .map_err(ProviderApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderApiError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }
            .into());
        }

        let info: FacebookUserInfo = response.json().await.map_err(ProviderApiError::from)?;
        let email = info.email.ok_or_else(|| {
            ProviderApiError::InvalidResponse("profile has no email".into())
        })?;

        Ok(SocialProfile {
            email,
            name: info.name,
            avatar_url: info.picture.map(|p| p.data.url),
        })
    }
}

// -----------------------------------------------------------------------
// GitHub
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GithubUserInfo {
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

fn primary_verified_email(emails: Vec<GithubEmail>) -> Option<String> {
    emails
        .into_iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email)
}

/// Fetches the authenticated user from the GitHub REST API with the
/// bearer token, falling back to `/user/emails` when the profile hides
/// the address.
#[derive(Clone)]
pub struct GithubApiClient {
    http: Client,
    base_url: String,
}

impl Default for GithubApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubApiClient {
    pub fn new() -> Self {
        Self {
            http: build_http_client(),
            base_url: GITHUB_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<D: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<D, ProviderApiError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, "coursecraft")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderApiError::ApiError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProviderClient for GithubApiClient {
    async fn fetch_profile(
        &self,
        access_token: &str,
        _external_user_id: Option<&str>,
    ) -> Result<SocialProfile, CoreError> {
        let info: GithubUserInfo = self.get_json("/user", access_token).await?;

        let email = match info.email {
            Some(email) => email,
            None => {
                let emails: Vec<GithubEmail> =
                    self.get_json("/user/emails", access_token).await?;
                primary_verified_email(emails).ok_or_else(|| {
                    ProviderApiError::InvalidResponse(
                        "no verified primary email on the account".into(),
                    )
                })?
            }
        };

        Ok(SocialProfile {
            email,
            name: info.name.unwrap_or(info.login),
            avatar_url: info.avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_tokeninfo_maps_all_fields() {
        let info: GoogleTokenInfo = serde_json::from_str(
            r#"{
                "aud": "client-123.apps.googleusercontent.com",
                "email": "jordan@example.com",
                "name": "Jordan Lee",
                "picture": "https://lh3.googleusercontent.com/a/photo",
                "iss": "https://accounts.google.com",
                "exp": "1716239022"
            }"#,
        )
        .unwrap();

        assert_eq!(info.aud, "client-123.apps.googleusercontent.com");
        assert_eq!(info.email, "jordan@example.com");
        assert_eq!(info.name.as_deref(), Some("Jordan Lee"));
        assert_eq!(
            info.picture.as_deref(),
            Some("https://lh3.googleusercontent.com/a/photo")
        );
    }

    #[test]
    fn google_tokeninfo_tolerates_missing_name_and_picture() {
        let info: GoogleTokenInfo = serde_json::from_str(
            r#"{"aud": "client-123", "email": "jordan@example.com"}"#,
        )
        .unwrap();

        assert!(info.name.is_none());
        assert!(info.picture.is_none());
    }

    #[test]
    fn facebook_profile_picture_comes_from_nested_data_url() {
        let info: FacebookUserInfo = serde_json::from_str(
            r#"{
                "id": "10225",
                "name": "Sam Rivera",
                "email": "sam@example.com",
                "picture": {
                    "data": {
                        "height": 50,
                        "width": 50,
                        "is_silhouette": false,
                        "url": "https://platform-lookaside.fbsbx.com/p50x50.jpg"
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(info.name, "Sam Rivera");
        assert_eq!(info.email.as_deref(), Some("sam@example.com"));
        assert_eq!(
            info.picture.map(|p| p.data.url).as_deref(),
            Some("https://platform-lookaside.fbsbx.com/p50x50.jpg")
        );
    }

    #[test]
    fn facebook_profile_without_email_deserializes_to_none() {
        // The Graph API omits `email` when the user granted no email scope.
        let info: FacebookUserInfo =
            serde_json::from_str(r#"{"id": "10225", "name": "Sam Rivera"}"#).unwrap();

        assert!(info.email.is_none());
        assert!(info.picture.is_none());
    }

    #[test]
    fn github_user_falls_back_to_login_when_name_is_null() {
        let info: GithubUserInfo = serde_json::from_str(
            r#"{
                "login": "octocat",
                "name": null,
                "email": null,
                "avatar_url": "https://avatars.githubusercontent.com/u/1"
            }"#,
        )
        .unwrap();

        assert_eq!(info.name.unwrap_or(info.login), "octocat");
        assert!(info.email.is_none());
    }

    #[test]
    fn primary_verified_email_picks_the_primary_verified_entry() {
        let emails: Vec<GithubEmail> = serde_json::from_str(
            r#"[
                {"email": "old@example.com", "primary": false, "verified": true},
                {"email": "unverified@example.com", "primary": true, "verified": false},
                {"email": "main@example.com", "primary": true, "verified": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            primary_verified_email(emails).as_deref(),
            Some("main@example.com")
        );
    }

    #[test]
    fn primary_verified_email_rejects_unverified_and_secondary_addresses() {
        let emails: Vec<GithubEmail> = serde_json::from_str(
            r#"[
                {"email": "side@example.com", "primary": false, "verified": true},
                {"email": "unverified@example.com", "primary": true, "verified": false}
            ]"#,
        )
        .unwrap();

        assert!(primary_verified_email(emails).is_none());
        assert!(primary_verified_email(Vec::new()).is_none());
    }

    #[test]
    fn clients_honour_base_url_overrides() {
        let google = GoogleIdentityClient::new(GoogleConfig {
            client_id: "client-123".into(),
        })
        .with_base_url("http://127.0.0.1:9100");
        assert_eq!(google.base_url, "http://127.0.0.1:9100");

        let facebook = FacebookGraphClient::new().with_base_url("http://127.0.0.1:9101");
        assert_eq!(facebook.base_url, "http://127.0.0.1:9101");

        let github = GithubApiClient::new().with_base_url("http://127.0.0.1:9102");
        assert_eq!(github.base_url, "http://127.0.0.1:9102");
    }
}
