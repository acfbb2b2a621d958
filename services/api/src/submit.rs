use clap::Args;
use clinic_booking::booking::{
    BookingService, HttpBookingClient, RawAppointmentForm, RequestValidator,
    SubmissionController, SubmissionState, SubmitAttempt,
};
use clinic_booking::config::AppConfig;
use clinic_booking::error::AppError;
use clinic_booking::telemetry;
use reqwest::Url;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Base URL of a running booking server
    #[arg(long)]
    pub(crate) server: Url,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) phone: String,
    /// Service label, e.g. "Teeth Whitening"
    #[arg(long)]
    pub(crate) service: Option<String>,
    /// Routine or Urgent
    #[arg(long)]
    pub(crate) urgency: Option<String>,
    #[arg(long)]
    pub(crate) notes: Option<String>,
    /// Tick the consent checkbox
    #[arg(long)]
    pub(crate) consent: bool,
    /// Reject locally unless consent is given
    #[arg(long)]
    pub(crate) require_consent: bool,
    /// Seconds to wait for the server before giving up
    #[arg(long, default_value_t = 10)]
    pub(crate) timeout_secs: u64,
}

impl SubmitArgs {
    fn form(&self) -> RawAppointmentForm {
        let mut form = RawAppointmentForm::new()
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("phone", self.phone.as_str());

        let optional = [
            ("service", &self.service),
            ("urgency", &self.urgency),
            ("notes", &self.notes),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                form = form.with(key, value.as_str());
            }
        }
        if self.consent {
            form = form.with("consent", "true");
        }
        form
    }
}

pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let client = HttpBookingClient::new(&args.server, Duration::from_secs(args.timeout_secs))?;
    println!("Submitting to {}", client.endpoint());

    let validator = RequestValidator::new(args.require_consent);
    let controller = SubmissionController::new(client, validator);
    let attempt = controller.submit(&args.form()).await;

    match attempt {
        SubmitAttempt::Rejected(err) => {
            println!("Rejected before sending ({}): {err}", err.field());
            Err(AppError::Rejected(err))
        }
        SubmitAttempt::Ignored => {
            let state = controller.state();
            println!("Submission ignored in state {}", state.label());
            Err(AppError::NotDelivered(state))
        }
        SubmitAttempt::Settled(state) => {
            println!("State: {}", state.label());
            if let Some(message) = controller.status_message() {
                println!("{message}");
            }
            match state {
                SubmissionState::Success => Ok(()),
                other => Err(AppError::NotDelivered(other)),
            }
        }
    }
}

pub(crate) fn run_check_config() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let service = BookingService::from_config(&config.booking)?;
    let dispatcher = service.dispatcher();

    println!("Environment: {:?}", config.environment);
    println!("Listen address: {}", config.server.socket_addr()?);
    println!("Clinic: {}", dispatcher.clinic_id());
    println!("Transport: {}", dispatcher.channel());
    println!(
        "Consent required: {}",
        if config.booking.consent_required { "yes" } else { "no" }
    );
    if dispatcher.is_simulated() {
        println!(
            "Simulation delay: {} ms (no request will leave this process)",
            config.booking.simulation_delay.as_millis()
        );
    }

    Ok(())
}
