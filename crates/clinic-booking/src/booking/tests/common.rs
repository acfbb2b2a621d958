use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use lettre::Message;
use serde_json::Value;
use tokio::sync::Notify;

use crate::booking::client::{SubmissionClient, SubmissionError};
use crate::booking::dispatcher::Dispatcher;
use crate::booking::domain::{AppointmentRequest, DispatchEnvelope, RawAppointmentForm};
use crate::booking::transport::{MailRelay, MailRelayError, Transport, TransportError};
use crate::booking::validation::RequestValidator;
use crate::config::EmailSettings;
use crate::secret::SecretString;

pub(super) const CLINIC: &str = "apex-dental";
pub(super) const SOURCE: &str = "website-booking-form";

pub(super) fn jane_form() -> RawAppointmentForm {
    RawAppointmentForm::new()
        .with("name", "Jane Doe")
        .with("email", "jane@x.com")
        .with("phone", "5551234567")
        .with("service", "Teeth Whitening")
        .with("notes", "")
}

pub(super) fn jane() -> AppointmentRequest {
    RequestValidator::default()
        .validate(&jane_form())
        .expect("fixture is valid")
}

pub(super) fn email_settings() -> EmailSettings {
    EmailSettings {
        relay_host: "smtp.example.com".to_string(),
        username: "bookings@example.com".to_string(),
        password: SecretString::from("app-password"),
        from_name: "Apex Dental Booking".to_string(),
        to: "frontdesk@example.com".to_string(),
        subject: "New Appointment Booking".to_string(),
        timeout: Duration::from_secs(5),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Behavior {
    Deliver,
    Unavailable,
    AuthenticationRejected,
}

/// Transport double that keeps every envelope it was handed.
#[derive(Debug)]
pub(super) struct RecordingTransport {
    behavior: Behavior,
    sent: Mutex<Vec<DispatchEnvelope>>,
}

impl RecordingTransport {
    pub(super) fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn sent(&self) -> Vec<DispatchEnvelope> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn kind(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, envelope: &DispatchEnvelope) -> Result<(), TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(envelope.clone());
        match self.behavior {
            Behavior::Deliver => Ok(()),
            Behavior::Unavailable => Err(TransportError::Unavailable {
                channel: "recording",
                detail: "connection reset by smtp.internal:587".to_string(),
            }),
            Behavior::AuthenticationRejected => Err(TransportError::Authentication {
                channel: "recording",
                detail: "535 5.7.8 credentials rejected for bookings@example.com".to_string(),
            }),
        }
    }
}

pub(super) fn dispatcher_with(transport: Arc<RecordingTransport>) -> Dispatcher {
    Dispatcher::with_transport(CLINIC, SOURCE, transport)
}

/// Mail relay double storing the formatted messages.
#[derive(Debug)]
pub(super) struct RecordingRelay {
    behavior: Behavior,
    messages: Mutex<Vec<String>>,
}

impl RecordingRelay {
    pub(super) fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            messages: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("relay mutex poisoned").clone()
    }
}

#[async_trait]
impl MailRelay for RecordingRelay {
    async fn relay(&self, message: Message) -> Result<(), MailRelayError> {
        let formatted = String::from_utf8_lossy(&message.formatted()).into_owned();
        self.messages
            .lock()
            .expect("relay mutex poisoned")
            .push(formatted);
        match self.behavior {
            Behavior::Deliver => Ok(()),
            Behavior::Unavailable => Err(MailRelayError::Unavailable("timed out".to_string())),
            Behavior::AuthenticationRejected => Err(MailRelayError::Authentication(
                "535 bad credentials".to_string(),
            )),
        }
    }
}

/// Submission client that blocks until released, to observe the in-flight window.
#[derive(Debug)]
pub(super) struct GatedClient {
    pub(super) calls: AtomicUsize,
    pub(super) entered: Notify,
    pub(super) release: Notify,
    succeed: bool,
}

impl GatedClient {
    pub(super) fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
            succeed,
        })
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionClient for GatedClient {
    async fn submit(&self, _request: &AppointmentRequest) -> Result<(), SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        if self.succeed {
            Ok(())
        } else {
            Err(SubmissionError::Status { status: 502 })
        }
    }
}

/// Submission client answering immediately and remembering what it sent.
#[derive(Debug, Default)]
pub(super) struct ScriptedClient {
    outcomes: Mutex<Vec<bool>>,
    pub(super) sent: Mutex<Vec<AppointmentRequest>>,
}

impl ScriptedClient {
    /// Outcomes are consumed front to back; `true` is a delivered submission.
    pub(super) fn new(outcomes: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.to_vec()),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn sent(&self) -> Vec<AppointmentRequest> {
        self.sent.lock().expect("client mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionClient for ScriptedClient {
    async fn submit(&self, request: &AppointmentRequest) -> Result<(), SubmissionError> {
        self.sent
            .lock()
            .expect("client mutex poisoned")
            .push(request.clone());
        let mut outcomes = self.outcomes.lock().expect("client mutex poisoned");
        let delivered = if outcomes.is_empty() {
            true
        } else {
            outcomes.remove(0)
        };
        if delivered {
            Ok(())
        } else {
            Err(SubmissionError::Status { status: 502 })
        }
    }
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
