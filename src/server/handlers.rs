use crate::batch::BatchOrchestrator;
use crate::server::response::{ApiError, Envelope};
use crate::server::URLS_FIELD;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Scrapes the uploaded address list as a new batch
pub async fn create_batch(
    State(orchestrator): State<Arc<BatchOrchestrator>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Rejected upload: {}", e);
        ApiError::bad_file()
    })?;

    let text = read_urls_file(&mut multipart).await?;
    let results = orchestrator.process_text(&text).await?;

    Ok(Json(Envelope::results(results)))
}

pub async fn get_batch(
    State(orchestrator): State<Arc<BatchOrchestrator>>,
    Path(batch_id): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let results = orchestrator.get_batch(&batch_id)?;
    Ok(Json(Envelope::results(results)))
}

/// Returns the text of the first `urlsFile` field
async fn read_urls_file(multipart: &mut Multipart) -> Result<String, ApiError> {
    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::debug!("Failed to read multipart field: {}", e);
            ApiError::bad_file()
        })?;

        let Some(field) = field else {
            return Err(ApiError::bad_file());
        };

        if field.name() == Some(URLS_FIELD) {
            return field.text().await.map_err(|e| {
                tracing::debug!("Failed to read {}: {}", URLS_FIELD, e);
                ApiError::bad_file()
            });
        }
    }
}
