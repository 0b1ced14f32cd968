use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use geoextract_core::LocationRecord;

use crate::state::AppState;

const TEXT_FIELD: &str = "text";
const MISSING_TEXT: &str = "Missing \"text\" parameter.";
const NOT_UTF8: &str = "Decoding error. Data must be encoded as UTF-8.";

pub fn router() -> Router<AppState> {
    Router::new().route("/extract", post(extract))
}

/// Runs the pipeline on the uploaded file field `text`.
async fn extract(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<LocationRecord>>, (StatusCode, String)> {
    let mut multipart = multipart.map_err(|_| bad_request(MISSING_TEXT))?;
    let bytes = read_text(&mut multipart)
        .await?
        .ok_or_else(|| bad_request(MISSING_TEXT))?;
    let text = String::from_utf8(bytes.to_vec()).map_err(|_| bad_request(NOT_UTF8))?;

    let pipeline = Arc::clone(&state.pipeline);
    let records = tokio::task::spawn_blocking(move || pipeline.extract(&text))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    tracing::debug!(records = records.len(), "Extracted locations");

    Ok(Json(records))
}

async fn read_text(multipart: &mut Multipart) -> Result<Option<Bytes>, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(TEXT_FIELD) {
            return field.bytes().await.map(Some).map_err(multipart_error);
        }
    }
    Ok(None)
}

fn bad_request(message: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.to_string())
}

fn multipart_error(err: MultipartError) -> (StatusCode, String) {
    (err.status(), err.body_text())
}
