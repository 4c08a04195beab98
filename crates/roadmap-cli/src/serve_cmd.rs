use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use roadmap_core::progress::{ProgressError, parse_milestone_number};
use roadmap_core::service::{self, ServiceError};
use roadmap_core::store::RoadmapStore;

use crate::decode_cmd::DecodeReport;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: msg.into(),
        }
    }

    pub fn internal(code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: msg.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: err.to_string(),
            },
            ServiceError::EmptyUserId => Self::bad_request("invalid_user_id", err.to_string()),
            ServiceError::InvalidMilestone(_) => {
                Self::bad_request("invalid_milestone", err.to_string())
            }
            ServiceError::CorruptProgress { user_id, source } => {
                tracing::error!(user_id = %user_id, error = %source, "stored progress is corrupt");
                Self::internal("corrupt_progress", format!("{err}: {source}"))
            }
            ServiceError::Store(source) => {
                tracing::error!(error = %format!("{source:#}"), "store failure");
                Self::internal("internal", format!("{source:#}"))
            }
        }
    }
}

impl From<ProgressError> for AppError {
    fn from(err: ProgressError) -> Self {
        Self::bad_request("invalid_milestone", err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": { "code": self.code, "message": self.message }
        });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoadmapStore>,
}

pub fn build_router(store: Arc<dyn RoadmapStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/roadmap/{user_id}", get(get_roadmap))
        .route("/api/roadmap/{user_id}/complete", post(complete_milestone))
        .route("/api/roadmap/{user_id}/plan", put(put_plan))
        .route("/api/decode", post(decode))
        .layer(CorsLayer::permissive())
        .with_state(AppState { store })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(store: Arc<dyn RoadmapStore>, bind: &str, port: u16) -> Result<()> {
    let app = build_router(store);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("roadmap serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("roadmap serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_roadmap(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let view = service::load_roadmap(state.store.as_ref(), &user_id).await?;
    Ok(Json(view).into_response())
}

/// Body: `{"milestoneNumber": n}`. Parsed by hand so that malformed bodies
/// get the same error envelope as invalid numbers.
async fn complete_milestone(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<axum::response::Response, AppError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request("invalid_body", format!("body is not JSON: {e}")))?;
    let milestone = parse_milestone_number(payload.get("milestoneNumber"))?;

    let progress =
        service::complete_milestone(state.store.as_ref(), &user_id, milestone, Utc::now()).await?;
    Ok(Json(progress).into_response())
}

async fn put_plan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: String,
) -> Result<StatusCode, AppError> {
    service::store_plan(state.store.as_ref(), &user_id, &body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn decode(body: String) -> Json<DecodeReport> {
    Json(DecodeReport::from_raw(&body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
