use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use super::dispatcher::{DispatchResult, Dispatcher};
use super::domain::AppointmentRequest;
use super::router::SEND_PATH;

/// The network-facing call a [`SubmissionController`](super::SubmissionController) awaits.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(&self, request: &AppointmentRequest) -> Result<(), SubmissionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("booking endpoint responded with HTTP {status}")]
    Status { status: u16 },
    #[error("booking endpoint unreachable: {0}")]
    Network(String),
    #[error("booking endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),
    #[error("delivery failed (retryable: {retryable})")]
    Delivery { retryable: bool },
}

#[async_trait]
impl<T> SubmissionClient for Arc<T>
where
    T: SubmissionClient + ?Sized,
{
    async fn submit(&self, request: &AppointmentRequest) -> Result<(), SubmissionError> {
        (**self).submit(request).await
    }
}

/// In-process submission straight into a dispatcher.
#[async_trait]
impl SubmissionClient for Dispatcher {
    async fn submit(&self, request: &AppointmentRequest) -> Result<(), SubmissionError> {
        match self.dispatch(request.clone()).await {
            DispatchResult::Delivered { .. } => Ok(()),
            DispatchResult::Failed { retryable, .. } => {
                Err(SubmissionError::Delivery { retryable })
            }
        }
    }
}

/// Posts the request to a running booking server. Any non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpBookingClient {
    client: Client,
    endpoint: Url,
}

impl HttpBookingClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, SubmissionError> {
        let endpoint = base_url
            .join(SEND_PATH)
            .map_err(|err| SubmissionError::InvalidEndpoint(err.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SubmissionError::Network(err.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionClient for HttpBookingClient {
    async fn submit(&self, request: &AppointmentRequest) -> Result<(), SubmissionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|err| SubmissionError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SubmissionError::Status {
                status: status.as_u16(),
            })
        }
    }
}
