use serenity::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clients::resend_client;

/// Outbound email collaborator. Returns a dispatch id on success; the error
/// string is logged and never shown to the user.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String>;
}

pub struct ResendEmailService {
    api_key: String,
    sender: String,
    http: reqwest::Client,
}

impl ResendEmailService {
    pub fn new(api_key: String, sender: String) -> Self {
        Self {
            api_key,
            sender,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendEmailService {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String> {
        resend_client::send_resend_email(
            &self.http,
            &self.api_key,
            &self.sender,
            to,
            subject,
            html_body,
        )
        .await
        .map_err(|e| e.to_string())
    }
}

/// Used when no email provider is configured: the message is only logged.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<String, String> {
        let dispatch_id = format!("log-{}", Uuid::new_v4());
        warn!(to, subject, %dispatch_id, "no email provider configured, email not delivered");
        debug!(html_body, "undelivered email body");
        Ok(dispatch_id)
    }
}
