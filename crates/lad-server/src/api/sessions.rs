//! Form session endpoints.
//!
//! Each session owns a derivation pipeline. Renderers post raw edits and read
//! back the derived state, the active map points and the designation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use lad_core::{DerivedState, Designation, Edit, PointId};

use crate::pipeline::{PipelineError, PipelineHandle};
use crate::state::AppState;

/// A point as drawn on the map.
#[derive(Debug, Clone, Serialize)]
pub struct ActivePoint {
    pub id: PointId,
    pub label: String,
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: DerivedState,
    pub active_points: Vec<ActivePoint>,
    pub designation: Option<Designation>,
}

impl SessionView {
    pub fn new(session_id: Uuid, state: DerivedState) -> Self {
        let active_points = state
            .active_point_ids()
            .into_iter()
            .map(|id| {
                let point = state.points.get(id);
                let (lat, lng) = point.decimal();
                ActivePoint {
                    id,
                    label: point.label.clone(),
                    lat,
                    lng,
                    elevation: point.elevation.clone(),
                }
            })
            .collect();
        let designation = state.designation();
        Self {
            session_id,
            state,
            active_points,
            designation,
        }
    }
}

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn find_session(state: &AppState, id: &Uuid) -> Result<PipelineHandle, ApiError> {
    state
        .get_session(id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("unknown session {}", id)))
}

/// Open a new form session.
pub async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let id = state.create_session();
    tracing::info!("Opened session {} ({} active)", id, state.session_count());
    (StatusCode::CREATED, Json(json!({ "session_id": id })))
}

/// Current snapshot, including work still in progress.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find_session(&state, &id)?;
    Ok(Json(SessionView::new(id, handle.snapshot())))
}

/// Wait for every edit received so far to be derived, then return the
/// committed snapshot.
pub async fn get_settled_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let handle = find_session(&state, &id)?;
    let settled = handle
        .settled()
        .await
        .map_err(|err| error(StatusCode::GONE, err.to_string()))?;
    Ok(Json(SessionView::new(id, settled)))
}

/// Apply one form edit.
pub async fn submit_edit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(edit): Json<Edit>,
) -> Result<StatusCode, ApiError> {
    let handle = find_session(&state, &id)?;
    match handle.submit(edit).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(PipelineError::Rejected(err)) => {
            Err(error(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
        }
        Err(err @ PipelineError::Closed) => Err(error(StatusCode::GONE, err.to_string())),
    }
}

/// Close a session.
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.remove_session(&id) {
        tracing::info!("Closed session {}", id);
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
