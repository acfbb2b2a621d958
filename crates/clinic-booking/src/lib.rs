pub mod booking;
pub mod config;
pub mod error;
pub mod secret;
pub mod telemetry;
