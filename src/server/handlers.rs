//! Request handlers for the download API.

use super::error::AppError;
use super::types::{DownloadRequest, DownloadResponse, LookupQuery, LookupResponse};
use super::AppState;
use crate::request::SourceRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

/// `POST /api/download`: resolve the link and send the details to Telegram.
pub async fn create_download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<DownloadResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest {
        error: "Invalid request body".to_string(),
        details: Some(rejection.body_text()),
    })?;

    let request = SourceRequest::new(
        payload.url.as_deref(),
        payload.telegram_id.as_deref(),
        state.relay.pipeline().hosting_domain(),
    )?;
    info!(recipient = %request.recipient(), url = %request.source_url(), "Download request");

    let notice = state
        .relay
        .relay(&request)
        .await
        .map_err(|e| AppError::from_relay(e, state.bot_username.as_deref()))?;

    Ok(Json(DownloadResponse {
        success: true,
        message: "File details have been sent to your Telegram".to_string(),
        file_name: notice.name,
        file_size: notice.size.to_string(),
        telegram_id: request.recipient().to_string(),
    }))
}

/// `GET /api/download?url=...`: resolve the link without notifying anyone.
pub async fn lookup_download(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, AppError> {
    let url = query.url.as_deref().unwrap_or_default();
    let notice = state
        .relay
        .lookup(url)
        .await
        .map_err(|e| AppError::from_relay(e, state.bot_username.as_deref()))?;

    Ok(Json(LookupResponse {
        success: true,
        file_name: notice.name,
        file_size: notice.size.to_string(),
        download_url: notice.link,
    }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
