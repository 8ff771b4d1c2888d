use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use posty_core::config::MailerConfig;
use posty_core::errors::TransportError;
use posty_core::ports::{EmailTransport, OutboundEmail};

/// Sends confirmed emails by POSTing them to the configured provider
/// webhook. One attempt per send; the dialogue layer surfaces failures to
/// the user instead of retrying.
pub struct WebhookMailer {
    client: reqwest::Client,
    webhook_url: String,
    from_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    from: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_name: Option<&'a str>,
    to: &'a str,
    to_name: &'a str,
    subject: &'a str,
    body: &'a str,
}

impl WebhookMailer {
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build mailer http client")?;

        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
            from_name: config.from_name.clone(),
        })
    }

    fn payload<'a>(&'a self, email: &'a OutboundEmail) -> WebhookPayload<'a> {
        WebhookPayload {
            from: &email.from,
            from_name: self.from_name.as_deref(),
            to: &email.to,
            to_name: &email.to_name,
            subject: &email.subject,
            body: &email.body,
        }
    }
}

#[async_trait]
impl EmailTransport for WebhookMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(email))
            .send()
            .await
            .map_err(|error| TransportError(format!("email webhook unreachable: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError(format!("email webhook returned {status}: {body}")));
        }

        Ok(())
    }
}
