use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{Transport, TransportError};
use crate::booking::domain::DispatchEnvelope;
use crate::config::{ConfigError, WebhookSettings};
use crate::secret::SecretString;

const CHANNEL: &str = "webhook";

/// Header the receiving automation checks before accepting a payload.
pub const SECRET_HEADER: &str = "x-clinic-secret";

/// POSTs the dispatch envelope as JSON to an automation endpoint.
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: Client,
    url: Url,
    secret: SecretString,
}

impl WebhookTransport {
    pub fn new(settings: &WebhookSettings) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ConfigError::InvalidWebhookUrl {
                reason: format!("http client could not be built: {err}"),
            })?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            secret: settings.secret.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    fn kind(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, envelope: &DispatchEnvelope) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.url.clone())
            .header(SECRET_HEADER, self.secret.expose_secret())
            .json(envelope)
            .send()
            .await
            .map_err(|err| TransportError::Unavailable {
                channel: CHANNEL,
                detail: err.without_url().to_string(),
            })?;

        let status = response.status();
        debug!(%status, "webhook responded");

        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status {
                channel: CHANNEL,
                status: status.as_u16(),
            })
        }
    }
}
