mod batch;
mod clean;
mod health;
mod home;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub use batch::batch_handler;
pub use clean::{CleanForm, clean_api_handler, clean_form_handler};
pub use health::{HealthResponse, health_handler};
pub use home::home_handler;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}
