use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::error_response;
use crate::batch;
use crate::converter::{self, TableFormat};
use crate::server::state::AppState;

/// `POST /batch` with a multipart `file` and an optional `column`. Responds
/// with the processed file as a download in the uploaded format.
#[tracing::instrument(skip(state, multipart))]
pub async fn batch_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Bytes)> = None;
    let mut column: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(data) => upload = Some((file_name, data)),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read file bytes");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {}", e),
                        );
                    }
                }
            }
            Some("column") => match field.text().await {
                Ok(text) => column = Some(text),
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read column name: {}", e),
                    );
                }
            },
            _ => {}
        }
    }

    let Some((file_name, data)) = upload.filter(|(name, _)| !name.is_empty()) else {
        tracing::warn!("Batch request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let column = column
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.settings.batch.default_column.clone());

    let format = match TableFormat::from_file_name(&file_name) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(filename = %file_name, "Unsupported upload format");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    tracing::debug!(filename = %file_name, bytes = data.len(), column = %column, "Processing upload");

    let job_column = column.clone();
    let outcome =
        tokio::task::spawn_blocking(move || batch::process_file(&data, format, &job_column)).await;

    let (encoded, summary) = match outcome {
        Ok(Ok(processed)) => processed,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, filename = %file_name, "Batch conversion rejected");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "Batch conversion task failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Batch conversion failed",
            );
        }
    };

    let download_name = converter::processed_file_name(&file_name);

    tracing::info!(
        filename = %file_name,
        download = %download_name,
        column = %column,
        rows = summary.rows,
        degraded = summary.degraded,
        "Batch file processed"
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, attachment(&download_name)),
        ],
        encoded,
    )
        .into_response()
}

// header values must be visible ascii; quotes would end the filename early
fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
