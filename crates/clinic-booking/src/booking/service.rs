use tracing::debug;

use super::dispatcher::{DispatchResult, Dispatcher};
use super::domain::RawAppointmentForm;
use super::validation::{RequestValidator, ValidationError};
use crate::config::{BookingConfig, ConfigError};

/// Server-side entry point composing validation and dispatch.
#[derive(Debug, Clone)]
pub struct BookingService {
    validator: RequestValidator,
    dispatcher: Dispatcher,
}

impl BookingService {
    pub fn new(validator: RequestValidator, dispatcher: Dispatcher) -> Self {
        Self {
            validator,
            dispatcher,
        }
    }

    pub fn from_config(config: &BookingConfig) -> Result<Self, ConfigError> {
        let dispatcher = Dispatcher::from_config(config)?;
        Ok(Self::new(
            RequestValidator::new(config.consent_required),
            dispatcher,
        ))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Validate the submitted fields and, when complete, dispatch them once.
    pub async fn book(&self, raw: &RawAppointmentForm) -> Result<DispatchResult, ValidationError> {
        let request = self.validator.validate(raw).map_err(|err| {
            debug!(field = err.field(), error = %err, "appointment request rejected");
            err
        })?;
        Ok(self.dispatcher.dispatch(request).await)
    }
}
