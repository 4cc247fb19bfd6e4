//! Purpose-scoped security token records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The intended single use of a token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Access,
    VerifyEmail,
    ResetPassword,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::Access => "access",
            TokenPurpose::VerifyEmail => "verify_email",
            TokenPurpose::ResetPassword => "reset_password",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(TokenPurpose::Access),
            "verify_email" => Some(TokenPurpose::VerifyEmail),
            "reset_password" => Some(TokenPurpose::ResetPassword),
            _ => None,
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single in-flight authorization artifact.
///
/// Invariant: at most one live token per `(user_id, purpose)` pair.
/// A token is consumed by setting `expires_at` to the current time;
/// consumption and natural timeout share the field, so after the fact
/// they are observably indistinguishable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Deterministic record key derived from `(user_id, purpose)`.
    pub id: String,
    pub user_id: Uuid,
    pub purpose: TokenPurpose,
    /// The opaque signed string handed to the user.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertToken {
    pub user_id: Uuid,
    pub purpose: TokenPurpose,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_roundtrip() {
        for p in [
            TokenPurpose::Access,
            TokenPurpose::VerifyEmail,
            TokenPurpose::ResetPassword,
        ] {
            assert_eq!(TokenPurpose::parse(p.as_str()), Some(p));
        }
        assert_eq!(TokenPurpose::parse("refresh"), None);
    }
}
