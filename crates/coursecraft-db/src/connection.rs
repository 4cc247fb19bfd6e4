//! SurrealDB connection management.

use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{info, warn};

use crate::error::DbError;
use crate::schema;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket URL (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
    /// How many times the initial connection is attempted before
    /// giving up. The database usually comes up alongside the server,
    /// so the first attempts may race its startup.
    pub connect_attempts: u32,
    /// Pause between connection attempts.
    pub connect_retry_delay: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "coursecraft".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
            connect_attempts: 5,
            connect_retry_delay: Duration::from_secs(2),
        }
    }
}

impl DbConfig {
    fn validate(&self) -> Result<(), DbError> {
        for (name, value) in [
            ("url", &self.url),
            ("namespace", &self.namespace),
            ("database", &self.database),
        ] {
            if value.trim().is_empty() {
                return Err(DbError::Config(format!("{name} must not be empty")));
            }
        }
        if self.connect_attempts == 0 {
            return Err(DbError::Config("connect_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Manages a connection to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Retries the WebSocket connection per the config, authenticates
    /// as root, selects the namespace and database, and verifies the
    /// session with a round trip before returning.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        config.validate()?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Self::connect_with_retry(config).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        // One round trip so a dead session fails here, not on the
        // first repository call.
        db.query("RETURN true").await?.check()?;

        info!("Successfully connected to SurrealDB");

        Ok(Self { db })
    }

    async fn connect_with_retry(config: &DbConfig) -> Result<Surreal<Client>, DbError> {
        let mut attempt = 1;
        loop {
            match Surreal::new::<Ws>(&config.url).await {
                Ok(db) => return Ok(db),
                Err(err) if attempt < config.connect_attempts => {
                    warn!(
                        attempt,
                        max_attempts = config.connect_attempts,
                        error = %err,
                        "SurrealDB connection failed, retrying"
                    );
                    tokio::time::sleep(config.connect_retry_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Apply pending schema migrations on this connection.
    pub async fn migrate(&self) -> Result<(), DbError> {
        schema::run_migrations(&self.db).await
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_namespace_is_rejected_before_connecting() {
        let config = DbConfig {
            namespace: "  ".into(),
            ..DbConfig::default()
        };

        let err = DbManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)), "{err}");
    }

    #[tokio::test]
    async fn zero_connect_attempts_is_rejected() {
        let config = DbConfig {
            connect_attempts: 0,
            ..DbConfig::default()
        };

        let err = DbManager::connect(&config).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)), "{err}");
    }
}
