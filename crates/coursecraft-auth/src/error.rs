//! Authentication error types.

use coursecraft_core::error::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("unknown social provider: {0}")]
    InvalidProvider(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => CoreError::bad_credentials(),
            AuthError::TokenExpired => CoreError::TokenExpired,
            // A token that fails signature or purpose checks is treated
            // like a token the store has never seen.
            AuthError::TokenInvalid(detail) => CoreError::NotFound {
                entity: "token".into(),
                id: detail,
            },
            AuthError::InvalidProvider(provider) => CoreError::InvalidProvider { provider },
            AuthError::Crypto(msg) => CoreError::Crypto(msg),
        }
    }
}
