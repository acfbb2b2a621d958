use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{AppointmentRequest, DispatchEnvelope};
use super::transport::{EmailTransport, Transport, WebhookTransport};
use crate::config::{BookingConfig, ConfigError, TransportConfig};

/// Message shown to the patient for every failed dispatch.
pub const DELIVERY_FAILED_MESSAGE: &str = "Delivery failed, please retry.";

/// Uniform outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchResult {
    Delivered { simulated: bool },
    Failed { reason: String, retryable: bool },
}

impl DispatchResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchResult::Delivered { .. })
    }
}

#[derive(Debug, Clone)]
enum DispatchMode {
    Live(Arc<dyn Transport>),
    /// No channel configured; report success after a fixed delay.
    Simulated { delay: Duration },
}

/// Binds validated requests to the deployment's single transport.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    clinic_id: String,
    source: String,
    mode: DispatchMode,
}

impl Dispatcher {
    /// Builds the configured transport. Fails before any request is accepted
    /// when the selected channel cannot be set up.
    pub fn from_config(config: &BookingConfig) -> Result<Self, ConfigError> {
        let mode = match &config.transport {
            TransportConfig::Email(settings) => {
                DispatchMode::Live(Arc::new(EmailTransport::new(settings)?))
            }
            TransportConfig::Webhook(settings) => {
                DispatchMode::Live(Arc::new(WebhookTransport::new(settings)?))
            }
            TransportConfig::Disabled => DispatchMode::Simulated {
                delay: config.simulation_delay,
            },
        };

        Ok(Self {
            clinic_id: config.clinic_id.clone(),
            source: config.source.clone(),
            mode,
        })
    }

    pub fn with_transport(
        clinic_id: impl Into<String>,
        source: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            clinic_id: clinic_id.into(),
            source: source.into(),
            mode: DispatchMode::Live(transport),
        }
    }

    pub fn simulated(
        clinic_id: impl Into<String>,
        source: impl Into<String>,
        delay: Duration,
    ) -> Self {
        Self {
            clinic_id: clinic_id.into(),
            source: source.into(),
            mode: DispatchMode::Simulated { delay },
        }
    }

    pub fn clinic_id(&self) -> &str {
        &self.clinic_id
    }

    /// Channel name, or "simulation" when no transport is configured.
    pub fn channel(&self) -> &'static str {
        match &self.mode {
            DispatchMode::Live(transport) => transport.kind(),
            DispatchMode::Simulated { .. } => "simulation",
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self.mode, DispatchMode::Simulated { .. })
    }

    /// Attempts delivery exactly once. Never fails past this boundary.
    pub async fn dispatch(&self, request: AppointmentRequest) -> DispatchResult {
        let envelope = DispatchEnvelope {
            clinic: self.clinic_id.clone(),
            source: self.source.clone(),
            submitted_at: Utc::now(),
            patient: request,
        };

        match &self.mode {
            DispatchMode::Simulated { delay } => {
                warn!(
                    clinic = %envelope.clinic,
                    delay_ms = delay.as_millis() as u64,
                    "simulation mode: no transport configured, appointment was not delivered"
                );
                tokio::time::sleep(*delay).await;
                DispatchResult::Delivered { simulated: true }
            }
            DispatchMode::Live(transport) => match transport.send(&envelope).await {
                Ok(()) => {
                    info!(
                        channel = transport.kind(),
                        clinic = %envelope.clinic,
                        service = envelope.patient.service().label(),
                        "appointment request delivered"
                    );
                    DispatchResult::Delivered { simulated: false }
                }
                Err(err) => {
                    let retryable = err.retryable();
                    if retryable {
                        warn!(
                            channel = transport.kind(),
                            retryable,
                            error = %err,
                            "appointment delivery failed"
                        );
                    } else {
                        error!(
                            channel = transport.kind(),
                            retryable,
                            error = %err,
                            "appointment delivery failed"
                        );
                    }
                    DispatchResult::Failed {
                        reason: DELIVERY_FAILED_MESSAGE.to_string(),
                        retryable,
                    }
                }
            },
        }
    }
}
