//! Appointment request dispatch: validation, transports, the dispatcher, the
//! HTTP entry point and the client-side submission controller.

pub mod client;
pub mod dispatcher;
pub mod domain;
pub mod router;
pub mod service;
pub mod submission;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod tests;

pub use client::{HttpBookingClient, SubmissionClient, SubmissionError};
pub use dispatcher::{DispatchResult, Dispatcher, DELIVERY_FAILED_MESSAGE};
pub use domain::{AppointmentRequest, DispatchEnvelope, RawAppointmentForm, ServiceKind, Urgency};
pub use router::{booking_router, SEND_PATH};
pub use service::BookingService;
pub use submission::{
    SubmissionController, SubmissionState, SubmitAttempt, ERROR_MESSAGE, SUCCESS_MESSAGE,
};
pub use transport::{
    EmailTransport, MailRelay, MailRelayError, Transport, TransportError, WebhookTransport,
};
pub use validation::{RequestValidator, ValidationError};
