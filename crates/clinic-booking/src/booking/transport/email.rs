use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{Transport, TransportError};
use crate::booking::domain::DispatchEnvelope;
use crate::config::{ConfigError, EmailSettings};

const CHANNEL: &str = "email";

/// Hands a composed message to a mail server.
#[async_trait]
pub trait MailRelay: Send + Sync + fmt::Debug {
    async fn relay(&self, message: Message) -> Result<(), MailRelayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailRelayError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("relay unavailable: {0}")]
    Unavailable(String),
}

/// Authenticated SMTP relay. Built without connection pooling, so every
/// message opens and closes its own session.
pub struct SmtpRelay {
    host: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    pub fn new(settings: &EmailSettings) -> Result<Self, ConfigError> {
        let credentials = Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.relay_host)
            .map_err(|err| ConfigError::MailRelay {
                reason: err.to_string(),
            })?
            .credentials(credentials)
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            host: settings.relay_host.clone(),
            transport,
        })
    }
}

impl fmt::Debug for SmtpRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpRelay")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MailRelay for SmtpRelay {
    async fn relay(&self, message: Message) -> Result<(), MailRelayError> {
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(classify_smtp_error)
    }
}

fn classify_smtp_error(err: lettre::transport::smtp::Error) -> MailRelayError {
    let code = err
        .status()
        .and_then(|code| code.to_string().parse::<u16>().ok());
    classify_smtp_failure(code, err.is_permanent(), err.is_client(), err.to_string())
}

/// Maps an SMTP failure onto relay error kinds.
///
/// Client-side errors (no usable auth mechanism, missing credentials) are a
/// configuration mismatch and never succeed on resend, so they count as
/// authentication failures alongside the 53x replies.
fn classify_smtp_failure(
    code: Option<u16>,
    permanent: bool,
    client: bool,
    detail: String,
) -> MailRelayError {
    let auth_reply = matches!(code, Some(530..=539));
    let permanent_reply = matches!(code, Some(500..=599));

    if auth_reply || client {
        MailRelayError::Authentication(detail)
    } else if permanent || permanent_reply {
        MailRelayError::Rejected(detail)
    } else {
        MailRelayError::Unavailable(detail)
    }
}

/// Sends each appointment as one HTML email to the clinic inbox.
#[derive(Debug, Clone)]
pub struct EmailTransport {
    relay: Arc<dyn MailRelay>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl EmailTransport {
    pub fn new(settings: &EmailSettings) -> Result<Self, ConfigError> {
        let relay = SmtpRelay::new(settings)?;
        Self::with_relay(settings, Arc::new(relay))
    }

    pub fn with_relay(
        settings: &EmailSettings,
        relay: Arc<dyn MailRelay>,
    ) -> Result<Self, ConfigError> {
        let sender: Address = settings
            .username
            .parse()
            .map_err(|err| ConfigError::MailRelay {
                reason: format!("MAIL_USERNAME is not an address: {err}"),
            })?;
        let to: Mailbox = settings.to.parse().map_err(|err| ConfigError::MailRelay {
            reason: format!("MAIL_TO is not an address: {err}"),
        })?;

        Ok(Self {
            relay,
            from: Mailbox::new(Some(settings.from_name.clone()), sender),
            to,
            subject: settings.subject.clone(),
        })
    }

    fn compose(&self, envelope: &DispatchEnvelope) -> Result<Message, TransportError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(render_email_html(envelope))
            .map_err(|err| TransportError::Rejected {
                channel: CHANNEL,
                detail: err.to_string(),
            })
    }
}

#[async_trait]
impl Transport for EmailTransport {
    fn kind(&self) -> &'static str {
        CHANNEL
    }

    async fn send(&self, envelope: &DispatchEnvelope) -> Result<(), TransportError> {
        let message = self.compose(envelope)?;
        debug!(to = %self.to, "relaying appointment email");

        self.relay.relay(message).await.map_err(relay_failure)
    }
}

fn relay_failure(err: MailRelayError) -> TransportError {
    match err {
        MailRelayError::Authentication(detail) => TransportError::Authentication {
            channel: CHANNEL,
            detail,
        },
        MailRelayError::Rejected(detail) => TransportError::Rejected {
            channel: CHANNEL,
            detail,
        },
        MailRelayError::Unavailable(detail) => TransportError::Unavailable {
            channel: CHANNEL,
            detail,
        },
    }
}

/// Fixed-layout staff notification. Every value is escaped.
pub fn render_email_html(envelope: &DispatchEnvelope) -> String {
    let patient = &envelope.patient;
    let mut rows = vec![
        ("Name", patient.name().to_string()),
        ("Email", patient.email().to_string()),
        ("Phone", patient.phone().to_string()),
        ("Service", patient.service().label().to_string()),
        ("Urgency", patient.urgency().label().to_string()),
        ("Notes", patient.notes().to_string()),
    ];
    if let Some(consent) = patient.consent() {
        let answer = if consent { "Yes" } else { "No" };
        rows.push(("Consent", answer.to_string()));
    }
    rows.push((
        "Submitted",
        envelope.submitted_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    ));
    rows.push(("Clinic", envelope.clinic.clone()));

    let mut html = String::from("<h2>New Appointment Request</h2>\n");
    for (label, value) in rows {
        html.push_str(&format!(
            "<p><strong>{}:</strong> {}</p>\n",
            label,
            escape_html(&value)
        ));
    }
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(code: Option<u16>, permanent: bool, client: bool) -> MailRelayError {
        classify_smtp_failure(code, permanent, client, "smtp failure".to_string())
    }

    #[test]
    fn authentication_replies_are_authentication_failures() {
        for code in [530, 534, 535] {
            assert!(matches!(
                classify(Some(code), true, false),
                MailRelayError::Authentication(_)
            ));
        }
    }

    #[test]
    fn missing_auth_mechanism_is_not_transient() {
        let err = classify(None, false, true);
        assert!(matches!(err, MailRelayError::Authentication(_)));
    }

    #[test]
    fn transient_replies_and_network_errors_stay_unavailable() {
        for code in [Some(421), Some(451), None] {
            assert!(matches!(
                classify(code, false, false),
                MailRelayError::Unavailable(_)
            ));
        }
    }

    #[test]
    fn permanent_replies_are_rejections() {
        assert!(matches!(
            classify(Some(550), true, false),
            MailRelayError::Rejected(_)
        ));
        assert!(matches!(
            classify(Some(554), false, false),
            MailRelayError::Rejected(_)
        ));
    }

    #[test]
    fn classified_failures_carry_retryability_through_the_transport() {
        let cases = [
            (classify(Some(535), true, false), false),
            (classify(None, false, true), false),
            (classify(Some(550), true, false), false),
            (classify(Some(421), false, false), true),
        ];
        for (relay_error, retryable) in cases {
            assert_eq!(relay_failure(relay_error).retryable(), retryable);
        }
    }
}
