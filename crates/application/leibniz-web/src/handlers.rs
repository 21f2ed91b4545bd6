//! Request handlers.
//!
//! Failures are logged with their cause; clients only see the generic
//! messages below.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use leibniz_core::{parse_index, Error, PiReport, Term};
use serde_json::json;

use crate::AppState;

pub const INVALID_INDEX: &str = "Term index is not an integer.";
pub const INDEX_OUT_OF_RANGE: &str = "Term index is out of range.";
pub const TERMS_FAILED: &str = "Error fetching terms";
pub const PI_FAILED: &str = "Couldn`t fetch data from database";

/// JSON error body: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub async fn list_terms(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Term>>, ApiError> {
    state.service.get_terms().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "listing terms failed");
        ApiError::internal(TERMS_FAILED)
    })
}

pub async fn get_term(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<Term>, ApiError> {
    let index = parse_index(&raw).map_err(|e| match e {
        Error::IndexOutOfRange(_) => ApiError::bad_request(INDEX_OUT_OF_RANGE),
        _ => ApiError::bad_request(INVALID_INDEX),
    })?;

    state
        .service
        .get_term_by_index(index)
        .await
        .map(Json)
        .map_err(|e| {
            if e.is_invalid_index() {
                return ApiError::bad_request(INVALID_INDEX);
            }
            tracing::error!(index, error = %e, "fetching term failed");
            ApiError::internal(format!("Error fetching term {index}"))
        })
}

pub async fn get_pi(State(state): State<Arc<AppState>>) -> Result<Json<PiReport>, ApiError> {
    state.service.get_pi().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "reading pi failed");
        ApiError::internal(PI_FAILED)
    })
}
