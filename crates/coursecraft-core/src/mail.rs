//! Outbound mail contract.
//!
//! Dispatch is fire-and-forget from the auth flows' perspective: the
//! caller spawns the send on a detached task and logs failures there.
//! A mail-provider outage must never fail a registration or a
//! reset-password request.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;

#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send_verification_email(
        &self,
        email: &str,
        username: &str,
        user_id: Uuid,
    ) -> CoreResult<()>;

    async fn send_password_reset_email(
        &self,
        username: &str,
        email: &str,
        user_id: Uuid,
    ) -> CoreResult<()>;
}
