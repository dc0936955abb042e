// REST routes for task documents
// Presence checks only: no authentication, no payload validation beyond `date`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::store::DocumentStore;
use crate::error::StorageError;
use crate::models::{Snapshot, Task};

type SharedStore = Arc<DocumentStore>;

pub fn router(store: SharedStore, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api", get(index))
        .route("/api/health", get(health))
        .route("/api/test", get(connection_test))
        .route("/api/tasks/{user_id}", get(get_tasks).post(save_tasks))
        .route("/api/tasks/{user_id}/{date}", delete(delete_date))
        .route("/api/remind/{user_id}", post(remind))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(store)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================
// ERRORS
// ============================================

enum ApiError {
    BadRequest(&'static str),
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.to_string()),
            Self::Storage(e) => {
                tracing::error!(error = %e, "document store write failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ============================================
// HANDLERS
// ============================================

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Deadline Backend API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "OK", "timestamp": timestamp() }))
}

async fn connection_test(State(store): State<SharedStore>) -> Json<Value> {
    let status = if store.is_available() { "connected" } else { "disconnected" };
    Json(json!({
        "message": "Backend is working!",
        "store": status,
        "timestamp": timestamp(),
    }))
}

async fn get_tasks(State(store): State<SharedStore>, Path(user_id): Path<String>) -> Json<Snapshot> {
    let document = store.get(&user_id);
    tracing::debug!(%user_id, dates = document.len(), "serving tasks");
    Json(document)
}

#[derive(Debug, Deserialize)]
struct SaveRequest {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    tasks: Vec<Task>,
}

async fn save_tasks(
    State(store): State<SharedStore>,
    Path(user_id): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = request
        .date
        .filter(|d| !d.is_empty())
        .ok_or(ApiError::BadRequest("date is required"))?;
    tracing::debug!(%user_id, %date, count = request.tasks.len(), "saving tasks");
    store.put(&user_id, &date, request.tasks)?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_date(
    State(store): State<SharedStore>,
    Path((user_id, date)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    tracing::debug!(%user_id, %date, "deleting date");
    store.remove(&user_id, &date)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
struct RemindRequest {
    #[serde(default)]
    message: Option<String>,
}

/// Reminder delivery is not wired to any messaging service; the reminder is logged
async fn remind(Path(user_id): Path<String>, Json(request): Json<RemindRequest>) -> Json<Value> {
    tracing::info!(%user_id, message = request.message.as_deref().unwrap_or_default(), "reminder");
    Json(json!({ "success": true }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}
