//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External identity providers a user account can originate from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Facebook,
    Github,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Facebook => "facebook",
            SocialProvider::Github => "github",
        }
    }

    /// Parse a provider tag as received from the client.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "google" => Some(SocialProvider::Google),
            "facebook" => Some(SocialProvider::Facebook),
            "github" => Some(SocialProvider::Github),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Student,
    Instructor,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Student
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique across the platform.
    pub email: String,
    pub username: String,
    /// `None` for pure social accounts that never set a local password.
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    /// Originating identity provider, if the account was created
    /// through a federated login.
    pub social: Option<SocialProvider>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    /// Already hashed — raw passwords never cross the repository
    /// boundary.
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub social: Option<SocialProvider>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tag_roundtrip() {
        for p in [
            SocialProvider::Google,
            SocialProvider::Facebook,
            SocialProvider::Github,
        ] {
            assert_eq!(SocialProvider::parse(p.as_str()), Some(p));
        }
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!(
            SocialProvider::parse("GitHub"),
            Some(SocialProvider::Github)
        );
        assert_eq!(SocialProvider::parse("twitter"), None);
    }
}
