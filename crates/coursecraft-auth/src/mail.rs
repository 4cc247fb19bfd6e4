//! HTTP mail dispatch through a Brevo-style transactional email API.
//!
//! The mailer embeds the persisted token for the user into a frontend
//! link, so the emailed string is always the one the store will accept.

use async_trait::async_trait;
use coursecraft_core::error::{CoreError, CoreResult};
use coursecraft_core::mail::MailDispatcher;
use coursecraft_core::models::token::TokenPurpose;
use coursecraft_core::repository::TokenRepository;
use reqwest::Client;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::store::TokenStore;

/// Mail API and sender identity settings.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Endpoint for the transactional send, e.g.
    /// `https://api.brevo.com/v3/smtp/email`.
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
    /// Base URL the verification and reset links point at.
    pub frontend_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

/// [`MailDispatcher`] backed by an HTTP mail API.
///
/// Holds a [`TokenStore`] handle to look up the live token for the
/// addressed user rather than signing a second, diverging one.
pub struct HttpMailer<T: TokenRepository> {
    http: Client,
    config: MailerConfig,
    tokens: TokenStore<T>,
}

impl<T: TokenRepository> HttpMailer<T> {
    pub fn new(config: MailerConfig, tokens: TokenStore<T>) -> Self {
        Self {
            http: Client::new(),
            config,
            tokens,
        }
    }

    async fn live_token_link(&self, user_id: Uuid, purpose: TokenPurpose) -> CoreResult<String> {
        let record = self
            .tokens
            .find_live(user_id, purpose)
            .await?
            .ok_or_else(|| CoreError::Mail(format!("no live {purpose} token for {user_id}")))?;

        let path = match purpose {
            TokenPurpose::VerifyEmail => "/verify-email",
            TokenPurpose::ResetPassword => "/reset-password",
            TokenPurpose::Access => {
                return Err(CoreError::Mail("access tokens are never mailed".into()));
            }
        };

        Ok(format!(
            "{}{}?token={}",
            self.config.frontend_url, path, record.token
        ))
    }

    async fn send(&self, to: &str, to_name: &str, subject: &str, html: String) -> CoreResult<()> {
        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.config.sender_email.clone(),
                name: Some(self.config.sender_name.clone()),
            },
            to: vec![EmailAddress {
                email: to.to_string(),
                name: Some(to_name.to_string()),
            }],
            subject: subject.to_string(),
            html_content: html,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .header("api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Mail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CoreError::Mail(format!(
                "send failed (status={status}): {detail}"
            )));
        }

        info!(to = %to, subject = %subject, "email dispatched");
        Ok(())
    }
}

#[async_trait]
impl<T: TokenRepository> MailDispatcher for HttpMailer<T> {
    async fn send_verification_email(
        &self,
        email: &str,
        username: &str,
        user_id: Uuid,
    ) -> CoreResult<()> {
        let link = self
            .live_token_link(user_id, TokenPurpose::VerifyEmail)
            .await?;
        let html = format!(
            "<p>Hi {username},</p>\
             <p>Confirm your email address to activate your account:</p>\
             <p><a href=\"{link}\">Verify email</a></p>"
        );
        self.send(email, username, "Verify your email address", html)
            .await
    }

    async fn send_password_reset_email(
        &self,
        username: &str,
        email: &str,
        user_id: Uuid,
    ) -> CoreResult<()> {
        let link = self
            .live_token_link(user_id, TokenPurpose::ResetPassword)
            .await?;
        let html = format!(
            "<p>Hi {username},</p>\
             <p>A password reset was requested for your account. The link \
             below stays valid until it is used or a newer request \
             supersedes it:</p>\
             <p><a href=\"{link}\">Reset password</a></p>"
        );
        self.send(email, username, "Reset your password", html).await
    }
}
