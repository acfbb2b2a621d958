use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Treatments offered on the booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceKind {
    #[default]
    #[serde(rename = "General Checkup")]
    GeneralCheckup,
    #[serde(rename = "Teeth Whitening")]
    TeethWhitening,
    #[serde(rename = "Emergency Pain")]
    EmergencyPain,
    #[serde(rename = "Invisalign/Ortho")]
    InvisalignOrtho,
    #[serde(rename = "Dental Implant")]
    DentalImplant,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::GeneralCheckup,
        ServiceKind::TeethWhitening,
        ServiceKind::EmergencyPain,
        ServiceKind::InvisalignOrtho,
        ServiceKind::DentalImplant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::GeneralCheckup => "General Checkup",
            ServiceKind::TeethWhitening => "Teeth Whitening",
            ServiceKind::EmergencyPain => "Emergency Pain",
            ServiceKind::InvisalignOrtho => "Invisalign/Ortho",
            ServiceKind::DentalImplant => "Dental Implant",
        }
    }

    /// Matches the display label or a slug of it (`teeth-whitening`, `dental_implant`).
    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = fold(raw);
        Self::ALL
            .into_iter()
            .find(|service| fold(service.label()) == wanted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Urgency {
    #[default]
    Routine,
    Urgent,
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Routine => "Routine",
            Urgency::Urgent => "Urgent",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match fold(raw).as_str() {
            "routine" => Some(Urgency::Routine),
            "urgent" => Some(Urgency::Urgent),
            _ => None,
        }
    }
}

fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// A complete, validated appointment request.
///
/// Only [`RequestValidator`](super::validation::RequestValidator) constructs
/// this type, so holders never need to re-check its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentRequest {
    name: String,
    email: String,
    phone: String,
    service: ServiceKind,
    urgency: Urgency,
    notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    consent: Option<bool>,
}

impl AppointmentRequest {
    pub(crate) fn new(
        name: String,
        email: String,
        phone: String,
        service: ServiceKind,
        urgency: Urgency,
        notes: String,
        consent: Option<bool>,
    ) -> Self {
        Self {
            name,
            email,
            phone,
            service,
            urgency,
            notes,
            consent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn consent(&self) -> Option<bool> {
        self.consent
    }
}

/// Untrusted field values as submitted by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct RawAppointmentForm {
    fields: BTreeMap<String, String>,
}

impl RawAppointmentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl From<BTreeMap<String, String>> for RawAppointmentForm {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }
}

impl From<Map<String, Value>> for RawAppointmentForm {
    fn from(object: Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(text) => text,
                    Value::Bool(flag) => flag.to_string(),
                    Value::Number(number) => number.to_string(),
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect();
        Self { fields }
    }
}

/// Wire payload handed to a transport: the request plus dispatch-time facts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchEnvelope {
    pub clinic: String,
    pub source: String,
    pub submitted_at: DateTime<Utc>,
    pub patient: AppointmentRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_labels_and_slugs_resolve() {
        assert_eq!(
            ServiceKind::from_label("Teeth Whitening"),
            Some(ServiceKind::TeethWhitening)
        );
        assert_eq!(
            ServiceKind::from_label("invisalign-ortho"),
            Some(ServiceKind::InvisalignOrtho)
        );
        assert_eq!(ServiceKind::from_label("Root Canal"), None);
        assert_eq!(Urgency::from_label(" URGENT "), Some(Urgency::Urgent));
    }

    #[test]
    fn raw_form_flattens_json_scalars() {
        let form: RawAppointmentForm = serde_json::from_value(json!({
            "name": "Jane Doe",
            "consent": true,
            "phone": 5551234567u64,
            "notes": null,
        }))
        .expect("object deserializes");

        assert_eq!(form.get("name"), Some("Jane Doe"));
        assert_eq!(form.get("consent"), Some("true"));
        assert_eq!(form.get("phone"), Some("5551234567"));
        assert_eq!(form.get("notes"), None);
    }

    #[test]
    fn envelope_uses_camel_case_keys_and_service_labels() {
        let patient = AppointmentRequest::new(
            "Jane Doe".to_string(),
            "jane@x.com".to_string(),
            "5551234567".to_string(),
            ServiceKind::EmergencyPain,
            Urgency::Urgent,
            String::new(),
            None,
        );
        let envelope = DispatchEnvelope {
            clinic: "apex-dental".to_string(),
            source: "website-booking-form".to_string(),
            submitted_at: DateTime::parse_from_rfc3339("2025-10-01T09:30:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
            patient,
        };

        let value = serde_json::to_value(&envelope).expect("serializes");
        assert_eq!(value["clinic"], "apex-dental");
        assert_eq!(value["submittedAt"], "2025-10-01T09:30:00Z");
        assert_eq!(value["patient"]["service"], "Emergency Pain");
        assert_eq!(value["patient"]["urgency"], "Urgent");
        assert!(value["patient"].get("consent").is_none());
    }
}
