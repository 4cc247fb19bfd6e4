//! CourseCraft Server — Application entry point.

mod config;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use coursecraft_auth::providers::{
    FacebookGraphClient, GithubApiClient, GoogleConfig, GoogleIdentityClient,
};
use coursecraft_auth::{
    AccountProvisioner, AuthService, HttpMailer, SocialLogin, TokenStore,
};
use coursecraft_auth::social::{FacebookAuthenticator, GithubAuthenticator, GoogleAuthenticator};
use coursecraft_core::mail::MailDispatcher;
use coursecraft_core::models::user::SocialProvider;
use coursecraft_db::{
    DbManager, SurrealInstructorBalanceRepository, SurrealTokenRepository, SurrealUserRepository,
    SurrealUserSettingsRepository,
};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("coursecraft=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting CourseCraft server...");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    let manager = match DbManager::connect(&config.db).await {
        Ok(manager) => manager,
        Err(err) => {
            tracing::error!(error = %err, "database connection failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = manager.migrate().await {
        tracing::error!(error = %err, "migrations failed");
        return ExitCode::FAILURE;
    }

    let db = manager.client().clone();
    let users = SurrealUserRepository::new(db.clone());
    let settings = SurrealUserSettingsRepository::new(db.clone());
    let balances = SurrealInstructorBalanceRepository::new(db.clone());
    let token_repo = SurrealTokenRepository::new(db);

    let tokens = TokenStore::new(token_repo, config.auth.clone());
    let mailer: Arc<dyn MailDispatcher> =
        Arc::new(HttpMailer::new(config.mailer.clone(), tokens.clone()));

    let provisioner = AccountProvisioner::new(
        users.clone(),
        settings.clone(),
        balances.clone(),
        tokens.clone(),
        Arc::clone(&mailer),
    );
    // Held until the HTTP transport mounts it.
    let _auth_service = AuthService::new(
        users.clone(),
        settings.clone(),
        provisioner.clone(),
        tokens.clone(),
        Arc::clone(&mailer),
        config.auth.clone(),
    );

    let google_client = Arc::new(GoogleIdentityClient::new(GoogleConfig {
        client_id: config.google_client_id.clone(),
    }));
    let _social_login = SocialLogin::new()
        .with_handler(
            SocialProvider::Google,
            Arc::new(GoogleAuthenticator::new(
                google_client,
                users.clone(),
                settings.clone(),
                provisioner.clone(),
            )),
        )
        .with_handler(
            SocialProvider::Facebook,
            Arc::new(FacebookAuthenticator::new(
                Arc::new(FacebookGraphClient::new()),
                users.clone(),
                settings.clone(),
                provisioner.clone(),
            )),
        )
        .with_handler(
            SocialProvider::Github,
            Arc::new(GithubAuthenticator::new(
                Arc::new(GithubApiClient::new()),
                users,
                settings,
                provisioner,
            )),
        );

    // Periodic sweep of dead token rows.
    let cleanup_tokens = tokens.clone();
    let cleanup_interval = Duration::from_secs(config.token_cleanup_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            match cleanup_tokens.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "expired tokens swept"),
                Err(err) => tracing::error!(error = %err, "token sweep failed"),
            }
        }
    });

    tracing::info!("CourseCraft server ready");

    // TODO: mount the HTTP transport once the API surface lands
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "shutdown signal error");
        return ExitCode::FAILURE;
    }

    tracing::info!("CourseCraft server stopped.");
    ExitCode::SUCCESS
}
