mod cli;
mod infra;
mod routes;
mod server;
mod submit;

use clinic_booking::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
