use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::application::dto::WebhookPayload;
use crate::application::ports::WebhookPort;
use crate::domain::errors::{DomainError, DomainResult};

/// POST JSON a un webhook fijo (Discord o compatible). Un intento por alerta.
pub struct HttpWebhook {
    client: reqwest::Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl WebhookPort for HttpWebhook {
    async fn post(&self, payload: &WebhookPayload) -> DomainResult<u16> {
        let res = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DomainError::OperationFailed(format!("webhook request failed: {e}")))?;

        let status = res.status();
        debug!("Webhook response: {:?}", res);
        Ok(status.as_u16())
    }
}
