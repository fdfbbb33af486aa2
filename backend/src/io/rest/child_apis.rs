use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::info;

use super::errors::{map_error, ApiResult};
use super::extractors::GuardianId;
use super::mappers::ChildMapper;
use crate::AppState;
use shared::{ChildResponse, RegisterChildRequest};

/// Routes mounted under `/api/children`; children belong to the caller
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_child))
        .route("/:child_id", get(get_child).delete(remove_child))
}

/// POST /api/children
pub async fn register_child(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Json(request): Json<RegisterChildRequest>,
) -> ApiResult<Json<ChildResponse>> {
    info!("POST /api/children - guardian {}", guardian_id);

    let command = ChildMapper::to_register_command(guardian_id, request);
    let child = app_state
        .child_service
        .register_child(command)
        .await
        .map_err(|e| map_error("register child", e))?;

    let message = format!("Registered {}", child.display_name);
    Ok(Json(ChildMapper::to_response(child, message)))
}

/// GET /api/children/:child_id
pub async fn get_child(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
) -> ApiResult<Json<ChildResponse>> {
    info!("GET /api/children/{} - guardian {}", child_id, guardian_id);

    let child = app_state
        .child_service
        .get_child(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("load child", e))?;

    Ok(Json(ChildMapper::to_response(child, "Child found")))
}

/// DELETE /api/children/:child_id - also deletes the child's safety rule
pub async fn remove_child(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
) -> ApiResult<Json<ChildResponse>> {
    info!("DELETE /api/children/{} - guardian {}", child_id, guardian_id);

    let child = app_state
        .child_service
        .remove_child(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("remove child", e))?;

    let message = format!("Removed {}", child.display_name);
    Ok(Json(ChildMapper::to_response(child, message)))
}
