//! Error types for the CourseCraft platform.
//!
//! The first four variants are the stable, machine-readable conditions
//! the auth flows surface to callers. The remaining kinds are
//! infrastructure failures that propagate unchanged to the caller's
//! boundary and are logged there.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Uniform credential failure. The reason is deliberately generic:
    /// unknown email, unverified email, and wrong password must be
    /// indistinguishable to the caller.
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// Token past (or already at) its recorded expiry — covers both
    /// natural timeout and prior consumption.
    #[error("Token has expired")]
    TokenExpired,

    #[error("Unknown social provider: {provider}")]
    InvalidProvider { provider: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Mail dispatch failed: {0}")]
    Mail(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The single error returned for every password-login failure mode.
    pub fn bad_credentials() -> Self {
        CoreError::Unauthorized {
            reason: "incorrect email or password".into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_credentials_is_stable() {
        // Every login failure cause must render identically.
        let a = CoreError::bad_credentials().to_string();
        let b = CoreError::bad_credentials().to_string();
        assert_eq!(a, b);
        assert_eq!(a, "Unauthorized: incorrect email or password");
    }
}
