//! REST API routes.

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::sessions;
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/sessions", post(sessions::create_session))
        .route(
            "/v1/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/v1/sessions/:id/settled", get(sessions::get_settled_session))
        .route("/v1/sessions/:id/edits", post(sessions::submit_edit))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "lad-server" }))
}
