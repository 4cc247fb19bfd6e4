//! Environment-driven server configuration.

use std::env;

use coursecraft_auth::{AuthConfig, MailerConfig};
use coursecraft_db::DbConfig;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn require_env(key: &str) -> Result<String, String> {
    let value = env::var(key).map_err(|_| format!("{key} is required"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(format!("{key} is required"));
    }
    Ok(value)
}

/// Everything the server needs, assembled from environment variables.
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub mailer: MailerConfig,
    pub google_client_id: String,
    /// Interval between expired-token sweeps, in seconds.
    pub token_cleanup_interval_secs: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let db = DbConfig {
            url: env_or("DB_URL", "127.0.0.1:8000"),
            namespace: env_or("DB_NAMESPACE", "coursecraft"),
            database: env_or("DB_DATABASE", "main"),
            username: env_or("DB_USERNAME", "root"),
            password: env_or("DB_PASSWORD", "root"),
            ..DbConfig::default()
        };

        let auth = AuthConfig {
            jwt_private_key_pem: require_env("JWT_PRIVATE_KEY_PEM")?,
            jwt_public_key_pem: require_env("JWT_PUBLIC_KEY_PEM")?,
            jwt_issuer: env_or("JWT_ISSUER", "coursecraft"),
            access_token_lifetime_secs: env_or("ACCESS_TOKEN_LIFETIME_SECS", "900")
                .parse()
                .map_err(|e| format!("bad ACCESS_TOKEN_LIFETIME_SECS: {e}"))?,
            email_token_lifetime_secs: env_or("EMAIL_TOKEN_LIFETIME_SECS", "3600")
                .parse()
                .map_err(|e| format!("bad EMAIL_TOKEN_LIFETIME_SECS: {e}"))?,
            pepper: env::var("PASSWORD_PEPPER").ok().filter(|p| !p.is_empty()),
        };

        let mailer = MailerConfig {
            api_url: env_or("MAIL_API_URL", "https://api.brevo.com/v3/smtp/email"),
            api_key: require_env("MAIL_API_KEY")?,
            sender_email: require_env("MAIL_SENDER_EMAIL")?,
            sender_name: env_or("MAIL_SENDER_NAME", "CourseCraft"),
            frontend_url: require_env("FRONTEND_URL")?,
        };

        Ok(Self {
            db,
            auth,
            mailer,
            google_client_id: require_env("GOOGLE_CLIENT_ID")?,
            token_cleanup_interval_secs: env_or("TOKEN_CLEANUP_INTERVAL_SECS", "3600")
                .parse()
                .map_err(|e| format!("bad TOKEN_CLEANUP_INTERVAL_SECS: {e}"))?,
        })
    }
}
