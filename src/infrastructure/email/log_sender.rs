use async_trait::async_trait;
use tracing::info;

use crate::domain::EmailSender;
use crate::support::errors::InfraError;

/// Development sender: records that a reset mail would have gone out.
///
/// The token is never written to the log.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_password_reset_email(&self, email: &str, _token: &str) -> Result<(), InfraError> {
        info!(recipient = %email, "Password reset email suppressed (log provider)");
        Ok(())
    }
}
