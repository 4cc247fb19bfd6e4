//! Instructor earnings ledger, one-to-one with a user.
//!
//! Created lazily, zero-initialized, at the moment a user's email
//! first becomes verified. Absence means the user has never been
//! verified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructorBalance {
    pub user_id: Uuid,
    pub current_balance: i64,
    pub created_at: DateTime<Utc>,
}
