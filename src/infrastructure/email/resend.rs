//! Resend HTTP API sender

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::reset_link;
use crate::domain::EmailSender;
use crate::support::errors::InfraError;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: String,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

pub struct ResendEmailSender {
    client: Client,
    api_key: String,
    from: String,
    app_base_url: String,
    link_ttl_minutes: i64,
}

impl ResendEmailSender {
    pub fn new(
        api_key: String,
        from: String,
        app_base_url: String,
        link_ttl_minutes: i64,
    ) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InfraError::Email(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            from,
            app_base_url,
            link_ttl_minutes,
        })
    }

    fn render(&self, link: &str) -> String {
        format!(
            "<!DOCTYPE html>\
<html><head><meta charset=\"UTF-8\"><title>Reset Your Password</title></head>\
<body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;\">\
<h1>Password Reset Request</h1>\
<p>We received a request to reset your password. Follow the link below to choose a new one:</p>\
<p><a href=\"{link}\">Reset Password</a></p>\
<p style=\"word-break: break-all;\">{link}</p>\
<p><strong>This link will expire in {ttl} minutes.</strong></p>\
<p>If you didn't request this, please ignore this email.</p>\
</body></html>",
            link = link,
            ttl = self.link_ttl_minutes
        )
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<(), InfraError> {
        let link = reset_link(&self.app_base_url, token);
        let request = ResendRequest {
            from: &self.from,
            to: [email],
            subject: "Reset Your Password",
            html: self.render(&link),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, recipient = %email, "Request to Resend failed");
                InfraError::Email(format!("request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                recipient = %email,
                body = %body,
                "Resend rejected the message"
            );
            return Err(InfraError::Email(format!("provider returned status {}", status)));
        }

        let accepted: ResendResponse = response
            .json()
            .await
            .map_err(|e| InfraError::Email(format!("unreadable provider response: {}", e)))?;

        info!(email_id = %accepted.id, recipient = %email, "Password reset email sent");
        Ok(())
    }
}
