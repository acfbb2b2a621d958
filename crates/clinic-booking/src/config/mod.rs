use crate::secret::SecretString;
use reqwest::Url;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_CLINIC_ID: &str = "apex-dental";
const DEFAULT_SOURCE: &str = "website-booking-form";
const DEFAULT_RELAY_HOST: &str = "smtp.gmail.com";
const DEFAULT_FROM_NAME: &str = "Apex Dental Booking";
const DEFAULT_SUBJECT: &str = "New Appointment Booking";
const DEFAULT_SIMULATION_DELAY_MS: u64 = 1500;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub booking: BookingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let booking = BookingConfig::from_env(environment)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            booking,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Everything the dispatch pipeline needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub clinic_id: String,
    pub source: String,
    pub consent_required: bool,
    pub simulation_delay: Duration,
    pub transport: TransportConfig,
}

impl BookingConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let clinic_id = non_empty_var("CLINIC_ID").unwrap_or_else(|| DEFAULT_CLINIC_ID.to_string());
        let source = non_empty_var("BOOKING_SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let consent_required = flag_var("BOOKING_CONSENT_REQUIRED", false)?;
        let simulation_delay = Duration::from_millis(number_var(
            "BOOKING_SIMULATION_DELAY_MS",
            DEFAULT_SIMULATION_DELAY_MS,
        )?);

        let transport = TransportConfig::from_env()?;
        if matches!(transport, TransportConfig::Disabled)
            && environment == AppEnvironment::Production
            && !flag_var("BOOKING_ALLOW_SIMULATION", false)?
        {
            return Err(ConfigError::SimulationInProduction);
        }

        Ok(Self {
            clinic_id,
            source,
            consent_required,
            simulation_delay,
            transport,
        })
    }
}

/// The single notification channel active for this deployment.
#[derive(Debug, Clone)]
pub enum TransportConfig {
    Email(EmailSettings),
    Webhook(WebhookSettings),
    /// No channel configured; dispatches are simulated.
    Disabled,
}

impl TransportConfig {
    pub fn label(&self) -> &'static str {
        match self {
            TransportConfig::Email(_) => "email",
            TransportConfig::Webhook(_) => "webhook",
            TransportConfig::Disabled => "simulation",
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = non_empty_var("WEBHOOK_URL");
        let mail_password = non_empty_var("MAIL_PASSWORD");

        let selection = match non_empty_var("BOOKING_TRANSPORT") {
            Some(value) => TransportSelection::parse(&value)?,
            None if webhook_url.is_some() => TransportSelection::Webhook,
            None if mail_password.is_some() => TransportSelection::Email,
            None => TransportSelection::Disabled,
        };

        match selection {
            TransportSelection::Email => {
                let password = mail_password.ok_or(ConfigError::MissingSecret {
                    variable: "MAIL_PASSWORD",
                })?;
                let username = non_empty_var("MAIL_USERNAME").ok_or(ConfigError::MissingSecret {
                    variable: "MAIL_USERNAME",
                })?;
                let to = non_empty_var("MAIL_TO").unwrap_or_else(|| username.clone());

                Ok(Self::Email(EmailSettings {
                    relay_host: non_empty_var("MAIL_RELAY_HOST")
                        .unwrap_or_else(|| DEFAULT_RELAY_HOST.to_string()),
                    username,
                    password: SecretString::new(password),
                    from_name: non_empty_var("MAIL_FROM_NAME")
                        .unwrap_or_else(|| DEFAULT_FROM_NAME.to_string()),
                    to,
                    subject: non_empty_var("MAIL_SUBJECT")
                        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
                    timeout: Duration::from_secs(number_var(
                        "MAIL_TIMEOUT_SECS",
                        DEFAULT_TIMEOUT_SECS,
                    )?),
                }))
            }
            TransportSelection::Webhook => {
                // An empty URL switches the channel off rather than failing.
                let Some(raw_url) = webhook_url else {
                    return Ok(Self::Disabled);
                };
                let url = Url::parse(&raw_url).map_err(|err| ConfigError::InvalidWebhookUrl {
                    reason: err.to_string(),
                })?;
                let secret = non_empty_var("WEBHOOK_SECRET").ok_or(ConfigError::MissingSecret {
                    variable: "WEBHOOK_SECRET",
                })?;

                Ok(Self::Webhook(WebhookSettings {
                    url,
                    secret: SecretString::new(secret),
                    timeout: Duration::from_secs(number_var(
                        "WEBHOOK_TIMEOUT_SECS",
                        DEFAULT_TIMEOUT_SECS,
                    )?),
                }))
            }
            TransportSelection::Disabled => Ok(Self::Disabled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportSelection {
    Email,
    Webhook,
    Disabled,
}

impl TransportSelection {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "email" | "smtp" => Ok(Self::Email),
            "webhook" => Ok(Self::Webhook),
            "disabled" | "none" | "simulate" | "simulation" => Ok(Self::Disabled),
            other => Err(ConfigError::UnknownTransport {
                value: other.to_string(),
            }),
        }
    }
}

/// Authenticated SMTP relay account and the fixed message envelope.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub relay_host: String,
    pub username: String,
    pub password: SecretString,
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub timeout: Duration,
}

/// Automation endpoint receiving the JSON envelope.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Url,
    pub secret: SecretString,
    pub timeout: Duration,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match non_empty_var(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { variable: key }),
        },
    }
}

fn number_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match non_empty_var(key) {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable: key }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { variable: &'static str },
    InvalidNumber { variable: &'static str },
    UnknownTransport { value: String },
    MissingSecret { variable: &'static str },
    InvalidWebhookUrl { reason: String },
    MailRelay { reason: String },
    SimulationInProduction,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { variable } => {
                write!(f, "{variable} must be one of true/false/1/0/yes/no/on/off")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::UnknownTransport { value } => write!(
                f,
                "BOOKING_TRANSPORT '{value}' is not one of email, webhook, disabled"
            ),
            ConfigError::MissingSecret { variable } => {
                write!(f, "{variable} is required by the selected transport")
            }
            ConfigError::InvalidWebhookUrl { reason } => {
                write!(f, "WEBHOOK_URL is not a valid URL: {reason}")
            }
            ConfigError::MailRelay { reason } => {
                write!(f, "mail relay could not be configured: {reason}")
            }
            ConfigError::SimulationInProduction => write!(
                f,
                "no transport configured in production; \
                 set BOOKING_ALLOW_SIMULATION=true to accept simulated deliveries"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
