//! Outbound email adapters

pub mod log_sender;
pub mod resend;

pub use log_sender::LogEmailSender;
pub use resend::ResendEmailSender;

/// Link the user follows to complete a reset.
pub fn reset_link(app_base_url: &str, token: &str) -> String {
    format!(
        "{}/api/v1/auth/reset-password?token={}",
        app_base_url.trim_end_matches('/'),
        token
    )
}
