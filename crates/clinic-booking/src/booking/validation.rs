use super::domain::{AppointmentRequest, RawAppointmentForm, ServiceKind, Urgency};

/// Field-level rejection surfaced next to the form input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("consent is required before booking")]
    ConsentRequired,
}

impl ValidationError {
    /// Name of the form input the message belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field } => *field,
            ValidationError::InvalidEmail => "email",
            ValidationError::ConsentRequired => "consent",
        }
    }
}

/// Turns raw form values into an [`AppointmentRequest`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator {
    consent_required: bool,
}

impl RequestValidator {
    pub fn new(consent_required: bool) -> Self {
        Self { consent_required }
    }

    pub fn consent_required(&self) -> bool {
        self.consent_required
    }

    pub fn validate(
        &self,
        raw: &RawAppointmentForm,
    ) -> Result<AppointmentRequest, ValidationError> {
        let name = required(raw, "name")?;
        let email = required(raw, "email")?;
        let phone = required(raw, "phone")?;

        if !is_plausible_email(&email) {
            return Err(ValidationError::InvalidEmail);
        }

        let consent = trimmed(raw, "consent").map(|value| is_truthy(&value));
        if self.consent_required && consent != Some(true) {
            return Err(ValidationError::ConsentRequired);
        }

        // Unknown choices fall back to defaults; the form only offers a closed set.
        let service = trimmed(raw, "service")
            .and_then(|value| ServiceKind::from_label(&value))
            .unwrap_or_default();
        let urgency = trimmed(raw, "urgency")
            .and_then(|value| Urgency::from_label(&value))
            .unwrap_or_default();
        let notes = trimmed(raw, "notes").unwrap_or_default();

        Ok(AppointmentRequest::new(
            name, email, phone, service, urgency, notes, consent,
        ))
    }
}

fn trimmed(raw: &RawAppointmentForm, field: &str) -> Option<String> {
    raw.get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required(raw: &RawAppointmentForm, field: &'static str) -> Result<String, ValidationError> {
    trimmed(raw, field).ok_or(ValidationError::MissingField { field })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "on" | "yes" | "1"
    )
}

/// Syntactic check only: a local part, an `@`, and a dotted domain.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
