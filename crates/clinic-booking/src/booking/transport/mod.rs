//! Notification channels that carry a dispatched appointment to clinic staff.

pub mod email;
pub mod webhook;

use std::fmt::Debug;

use async_trait::async_trait;

use super::domain::DispatchEnvelope;

pub use email::{render_email_html, EmailTransport, MailRelay, MailRelayError, SmtpRelay};
pub use webhook::{WebhookTransport, SECRET_HEADER};

/// A delivery channel. Each call owns its own session; implementations keep no
/// per-request state.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Short channel name used in logs (e.g. "email").
    fn kind(&self) -> &'static str;

    async fn send(&self, envelope: &DispatchEnvelope) -> Result<(), TransportError>;
}

/// Failure raised by [`Transport::send`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("authentication rejected by {channel}: {detail}")]
    Authentication {
        channel: &'static str,
        detail: String,
    },
    #[error("{channel} permanently rejected the message: {detail}")]
    Rejected {
        channel: &'static str,
        detail: String,
    },
    #[error("{channel} responded with HTTP {status}")]
    Status { channel: &'static str, status: u16 },
    #[error("{channel} unavailable: {detail}")]
    Unavailable {
        channel: &'static str,
        detail: String,
    },
}

impl TransportError {
    /// Transient failures may succeed when the same request is sent again.
    pub fn retryable(&self) -> bool {
        match self {
            TransportError::Authentication { .. } | TransportError::Rejected { .. } => false,
            TransportError::Status { .. } | TransportError::Unavailable { .. } => true,
        }
    }
}
