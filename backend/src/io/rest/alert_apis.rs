use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::errors::{map_error, parse_param, ApiResult};
use super::extractors::GuardianId;
use super::mappers::AlertMapper;
use crate::AppState;
use shared::{AlertListResponse, AlertStatus, MarkAllReadResponse, ParentAlert, UnreadCountResponse};

#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChildAlertQuery {
    pub limit: Option<u32>,
}

/// Routes mounted under `/api/alerts`; every route acts on the caller's alerts
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts))
        .route("/unread-count", get(get_unread_count))
        .route("/mark-all-read", patch(mark_all_read))
        .route("/child/:child_id", get(list_child_alerts))
        .route("/:alert_id/read", patch(mark_alert_read))
        .route("/:alert_id/dismiss", patch(dismiss_alert))
}

/// GET /api/alerts?status=&limit=
pub async fn list_alerts(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Query(query): Query<AlertListQuery>,
) -> ApiResult<Json<AlertListResponse>> {
    info!("GET /api/alerts - guardian {}", guardian_id);

    let status = parse_param(query.status.as_deref(), AlertStatus::parse)?;
    let alerts = app_state
        .alert_service
        .list(&guardian_id, status, query.limit)
        .await
        .map_err(|e| map_error("list alerts", e))?;

    Ok(Json(AlertMapper::to_list_dto(alerts)))
}

/// GET /api/alerts/child/:child_id?limit=
pub async fn list_child_alerts(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
    Query(query): Query<ChildAlertQuery>,
) -> ApiResult<Json<AlertListResponse>> {
    info!("GET /api/alerts/child/{} - guardian {}", child_id, guardian_id);

    let alerts = app_state
        .alert_service
        .list_by_child(&guardian_id, &child_id, query.limit)
        .await
        .map_err(|e| map_error("list alerts", e))?;

    Ok(Json(AlertMapper::to_list_dto(alerts)))
}

/// GET /api/alerts/unread-count
pub async fn get_unread_count(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
) -> ApiResult<Json<UnreadCountResponse>> {
    info!("GET /api/alerts/unread-count - guardian {}", guardian_id);

    let count = app_state
        .alert_service
        .unread_count(&guardian_id)
        .await
        .map_err(|e| map_error("count unread alerts", e))?;

    Ok(Json(UnreadCountResponse { count }))
}

/// PATCH /api/alerts/:alert_id/read
pub async fn mark_alert_read(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(alert_id): Path<String>,
) -> ApiResult<Json<ParentAlert>> {
    info!("PATCH /api/alerts/{}/read - guardian {}", alert_id, guardian_id);

    let alert = app_state
        .alert_service
        .mark_read(&alert_id, &guardian_id)
        .await
        .map_err(|e| map_error("mark alert read", e))?;

    Ok(Json(AlertMapper::to_dto(alert)))
}

/// PATCH /api/alerts/mark-all-read
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
) -> ApiResult<Json<MarkAllReadResponse>> {
    info!("PATCH /api/alerts/mark-all-read - guardian {}", guardian_id);

    let updated = app_state
        .alert_service
        .mark_all_read(&guardian_id)
        .await
        .map_err(|e| map_error("mark alerts read", e))?;

    Ok(Json(MarkAllReadResponse { updated }))
}

/// PATCH /api/alerts/:alert_id/dismiss
pub async fn dismiss_alert(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(alert_id): Path<String>,
) -> ApiResult<Json<ParentAlert>> {
    info!("PATCH /api/alerts/{}/dismiss - guardian {}", alert_id, guardian_id);

    let alert = app_state
        .alert_service
        .dismiss(&alert_id, &guardian_id)
        .await
        .map_err(|e| map_error("dismiss alert", e))?;

    Ok(Json(AlertMapper::to_dto(alert)))
}
