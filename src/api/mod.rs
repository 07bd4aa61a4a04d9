//! REST API endpoints.
//!
//! Axum-based HTTP API for standings, schedules, score entry
//! and bracket progress.

pub mod routes;
pub mod state;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::bracket::AdvanceError;
use crate::storage::StorageError;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::GameNotFound(id) => ApiError::NotFound(format!("game {}", id)),
            StorageError::InvalidId(id) => ApiError::BadRequest(format!("invalid id {:?}", id)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AdvanceError> for ApiError {
    fn from(err: AdvanceError) -> Self {
        match err {
            AdvanceError::GameNotFound(id) => ApiError::NotFound(format!("game {}", id)),
            AdvanceError::Storage(e) => e.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    use routes::{bracket, games, standings};

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tournaments/:tid/standings", get(standings::standings))
        .route(
            "/api/tournaments/:tid/tiebreakers",
            get(standings::tiebreakers),
        )
        .route("/api/tournaments/:tid/games", get(games::list_games))
        .route(
            "/api/tournaments/:tid/games/:gid/start",
            post(games::start_game),
        )
        .route(
            "/api/tournaments/:tid/games/:gid/score",
            post(games::submit_score),
        )
        .route(
            "/api/tournaments/:tid/games/:gid/advance",
            post(games::advance),
        )
        .route("/api/tournaments/:tid/bracket", get(bracket::bracket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
