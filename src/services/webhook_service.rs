use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::WebhookPayload;
use crate::errors::{TattlerError, TattlerResult};

#[cfg_attr(test, mockall::automock)]
pub trait WebhookSender: Send + Sync {
    fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> TattlerResult<()>;
}

/// Posts digest messages to Discord or Slack incoming webhooks
pub struct WebhookService {
    client: Client,
}

impl WebhookService {
    pub fn new() -> TattlerResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client })
    }
}

impl WebhookSender for WebhookService {
    fn send(&self, webhook_url: &str, payload: &WebhookPayload) -> TattlerResult<()> {
        let response = self.client.post(webhook_url).json(payload).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TattlerError::Api {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        Ok(())
    }
}
