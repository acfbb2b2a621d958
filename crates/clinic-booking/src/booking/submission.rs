use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use super::client::SubmissionClient;
use super::domain::{AppointmentRequest, RawAppointmentForm};
use super::validation::{RequestValidator, ValidationError};

pub const ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const SUCCESS_MESSAGE: &str =
    "Appointment Requested! Our team will contact you shortly to confirm.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionState {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Success => "success",
            SubmissionState::Error => "error",
        }
    }
}

/// What happened to a `submit` or `retry` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Validation failed before any state change.
    Rejected(ValidationError),
    /// A submission is already in flight, or the form already succeeded.
    Ignored,
    /// The dispatch call returned; carries the resulting state.
    Settled(SubmissionState),
}

#[derive(Debug)]
struct FormState {
    state: SubmissionState,
    held: Option<AppointmentRequest>,
    inline_error: Option<ValidationError>,
}

/// Client-side controller allowing at most one submission in flight.
///
/// `Idle -> Submitting -> Success | Error`. `Error` may submit again;
/// `Success` and `Error` return to `Idle` only through [`reset`](Self::reset).
/// The state lock is never held across the client call.
#[derive(Debug)]
pub struct SubmissionController<C> {
    client: C,
    validator: RequestValidator,
    form: Mutex<FormState>,
}

impl<C> SubmissionController<C>
where
    C: SubmissionClient,
{
    pub fn new(client: C, validator: RequestValidator) -> Self {
        Self {
            client,
            validator,
            form: Mutex::new(FormState {
                state: SubmissionState::Idle,
                held: None,
                inline_error: None,
            }),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().state
    }

    /// Validation message to render next to the offending input.
    pub fn inline_error(&self) -> Option<ValidationError> {
        self.lock().inline_error.clone()
    }

    pub fn can_submit(&self) -> bool {
        matches!(
            self.state(),
            SubmissionState::Idle | SubmissionState::Error
        )
    }

    pub fn submit_label(&self) -> &'static str {
        match self.state() {
            SubmissionState::Submitting => "Processing...",
            _ => "Request Appointment",
        }
    }

    pub fn status_message(&self) -> Option<&'static str> {
        match self.state() {
            SubmissionState::Success => Some(SUCCESS_MESSAGE),
            SubmissionState::Error => Some(ERROR_MESSAGE),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }

    pub async fn submit(&self, raw: &RawAppointmentForm) -> SubmitAttempt {
        let request = {
            let mut form = self.lock();
            if !matches!(form.state, SubmissionState::Idle | SubmissionState::Error) {
                return SubmitAttempt::Ignored;
            }

            match self.validator.validate(raw) {
                Ok(request) => {
                    form.inline_error = None;
                    form.held = Some(request.clone());
                    form.state = SubmissionState::Submitting;
                    request
                }
                Err(err) => {
                    form.inline_error = Some(err.clone());
                    return SubmitAttempt::Rejected(err);
                }
            }
        };

        self.send(request).await
    }

    /// Re-send the request held from the failed attempt.
    pub async fn retry(&self) -> SubmitAttempt {
        let request = {
            let mut form = self.lock();
            let held = match (form.state, form.held.clone()) {
                (SubmissionState::Error, Some(held)) => held,
                _ => return SubmitAttempt::Ignored,
            };
            form.state = SubmissionState::Submitting;
            held
        };

        self.send(request).await
    }

    /// "Book another": leave a settled state and forget the held request.
    pub fn reset(&self) -> bool {
        let mut form = self.lock();
        match form.state {
            SubmissionState::Success | SubmissionState::Error => {
                form.state = SubmissionState::Idle;
                form.held = None;
                form.inline_error = None;
                true
            }
            SubmissionState::Idle | SubmissionState::Submitting => false,
        }
    }

    async fn send(&self, request: AppointmentRequest) -> SubmitAttempt {
        let outcome = self.client.submit(&request).await;

        let mut form = self.lock();
        form.state = match outcome {
            Ok(()) => SubmissionState::Success,
            Err(err) => {
                // The wire detail is dropped; the form only shows ERROR_MESSAGE.
                debug!(error = %err, "appointment submission failed");
                SubmissionState::Error
            }
        };
        SubmitAttempt::Settled(form.state)
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.form.lock().expect("submission state mutex poisoned")
    }
}
