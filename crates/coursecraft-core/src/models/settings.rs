//! Per-user settings, one-to-one with [`User`](super::user::User).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: Uuid,
    /// Flipped to true either at creation (trusted social provider) or
    /// when a verify-email token is consumed.
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
}
