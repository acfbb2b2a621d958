use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;

use super::dispatcher::DispatchResult;
use super::domain::RawAppointmentForm;
use super::service::BookingService;

/// Path the booking form posts to.
pub const SEND_PATH: &str = "/api/send";

#[derive(Debug, Serialize)]
pub(crate) struct BookingResponse {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) simulated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) field: Option<&'static str>,
}

/// Router exposing the appointment submission endpoint.
pub fn booking_router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route(SEND_PATH, post(send_handler))
        .with_state(service)
}

pub(crate) async fn send_handler(
    State(service): State<Arc<BookingService>>,
    axum::Json(form): axum::Json<RawAppointmentForm>,
) -> Response {
    match service.book(&form).await {
        Ok(DispatchResult::Delivered { simulated }) => {
            let body = BookingResponse {
                success: true,
                simulated,
                error: None,
                field: None,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        // Retryable or not, the caller sees the same generic failure.
        Ok(DispatchResult::Failed { reason, .. }) => {
            let body = BookingResponse {
                success: false,
                simulated: false,
                error: Some(reason),
                field: None,
            };
            (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response()
        }
        Err(err) => {
            let body = BookingResponse {
                success: false,
                simulated: false,
                error: Some(err.to_string()),
                field: Some(err.field()),
            };
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response()
        }
    }
}
