use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::extract::ExtractionMode;
use super::normalize::{ParseFailure, parse_model_reply};
use super::prompt::build_prompt;
use super::request::InvalidInput;
use super::types::{BreakdownRequest, BreakdownResponse, ErrorResponse};
use crate::llm::{TextGenerator, classify_error};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub extraction: ExtractionMode,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("failed to parse model response: {0}")]
    ModelResponse(#[from] ParseFailure),
    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelResponse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text shown to callers. Details stay in the log.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid input",
            ApiError::ModelResponse(_) => "failed to parse model response",
            ApiError::Internal(_) => "internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// `POST /breakdown`
pub async fn breakdown(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let span = info_span!("breakdown", request_id = %Uuid::now_v7());
    handle(&state, &body).instrument(span).await.map(Json)
}

async fn handle(state: &AppState, body: &[u8]) -> Result<Value, ApiError> {
    let body: Value = serde_json::from_slice(body).map_err(|e| {
        error!(error=%e, "unreadable request body");
        anyhow::Error::new(e).context("decode request body")
    })?;
    let req = BreakdownRequest::from_json(&body).inspect_err(|e| {
        warn!(reason=%e, "rejecting request");
    })?;
    info!(depth = %req.depth, focus_area = ?req.focus_area, "breakdown requested");

    let prompt = build_prompt(&req).map_err(|e| {
        error!(error=%e, "prompt rendering failed");
        anyhow::Error::new(e)
    })?;
    debug!(model = state.generator.model(), prompt_len = prompt.len(), "invoking model");

    let text = state.generator.generate(&prompt).await.map_err(|e| {
        error!(kind=?classify_error(&e), error=%format!("{e:#}"), "model call failed");
        e
    })?;

    match parse_model_reply(&text, state.extraction) {
        Ok(value) => {
            if let Err(e) = BreakdownResponse::deserialize(&value) {
                warn!(error=%e, "breakdown deviates from schema, returning as-is");
            }
            info!("breakdown generated");
            Ok(value)
        }
        Err(e) => {
            error!(error=%e, "parse error");
            error!(raw=%text, "raw model response");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests;
