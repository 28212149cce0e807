use crate::config::MailConfig;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;

/// Outbound mail boundary.
///
/// Delivery is fire-and-forget: callers log a failed send and move on, the
/// surrounding state transition is already committed.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a plain-text email to a single recipient
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;

    /// Address of the fixed admin mailbox for intake notifications
    fn admin_address(&self) -> &str;
}

/// Mail-API client delivering over HTTP
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build mail client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let payload = json!({
            "from": self.config.from_address,
            "to": to,
            "subject": subject,
            "text": body,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::mail(format!("Mail API timeout: {}", e))
                } else {
                    AppError::mail(format!("Mail API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let response_body = response.text().await.unwrap_or_default();
            return Err(AppError::mail(format!(
                "Mail API error - HTTP {} ({})",
                status.as_u16(),
                response_body
            )));
        }

        tracing::debug!(to = %to, subject = %subject, "Email dispatched");
        Ok(())
    }

    fn admin_address(&self) -> &str {
        &self.config.admin_address
    }
}

/// In-memory mailer for tests; records every send instead of delivering
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<RecordedMail>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer lock poisoned").len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(RecordedMail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }

    fn admin_address(&self) -> &str {
        "admin@test.invalid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_mailer_captures_sends() {
        let mailer = RecordingMailer::new();
        mailer
            .send("user@example.com", "Hello", "Body text")
            .await
            .unwrap();
        mailer
            .send("other@example.com", "Again", "More text")
            .await
            .unwrap();

        assert_eq!(mailer.sent_count(), 2);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].to, "user@example.com");
        assert_eq!(sent[1].subject, "Again");
    }
}
