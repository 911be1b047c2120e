use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;

use super::error_response;
use crate::normalizer;
use crate::server::page::{self, PageView};
use crate::server::state::AppState;
use crate::table::CellValue;

#[derive(Debug, Deserialize)]
pub struct CleanForm {
    #[serde(default)]
    pub html: String,
}

/// `POST /api/clean` with `{"html": ...}`. The field may hold any JSON value;
/// only strings produce text.
#[tracing::instrument(skip(payload))]
pub async fn clean_api_handler(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let Json(data) = match payload {
        Ok(p) => p,
        Err(JsonRejection::MissingJsonContentType(_)) => {
            tracing::warn!("Clean request without a JSON content type");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Content-Type must be application/json",
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "Clean request with an unreadable JSON body");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid JSON body: {}", e.body_text()),
            );
        }
    };

    let Some(html) = data.get("html") else {
        return error_response(StatusCode::BAD_REQUEST, "No HTML content provided");
    };

    let input = CellValue::from(html.clone());
    let result = normalizer::normalize(&input);

    tracing::debug!(
        cleaned_len = result.cleaned_text.len(),
        "Cleaned HTML from API request"
    );

    (StatusCode::OK, Json(result)).into_response()
}

/// `POST /clean` from the web form.
#[tracing::instrument(skip(state, form))]
pub async fn clean_form_handler(
    State(state): State<AppState>,
    Form(form): Form<CleanForm>,
) -> Html<String> {
    let default_column = state.settings.batch.default_column.as_str();

    if form.html.is_empty() {
        return Html(page::render(&PageView {
            error: Some("No HTML content provided"),
            default_column,
            ..Default::default()
        }));
    }

    let result = normalizer::normalize_str(&form.html);

    Html(page::render(&PageView {
        html_input: &form.html,
        result: Some(&result),
        default_column,
        ..Default::default()
    }))
}
