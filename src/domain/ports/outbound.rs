use async_trait::async_trait;

use crate::support::errors::InfraError;

/// Outbound email delivery.
///
/// Fire-and-report: an `Ok` means the provider accepted the message, not
/// that it reached the inbox.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), InfraError>;
}
