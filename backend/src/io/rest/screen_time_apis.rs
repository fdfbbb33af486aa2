use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::errors::{bad_request, map_error, ApiResult};
use super::extractors::GuardianId;
use super::mappers::ActivityMapper;
use crate::AppState;
use shared::{RecordActivityRequest, RecordActivityResponse, ScreenTimeStatus, UsageSummaryResponse};

const DEFAULT_SUMMARY_DAYS: u32 = 7;

#[derive(Debug, Deserialize)]
pub struct UsageSummaryQuery {
    pub days: Option<u32>,
}

/// Routes merged at the `/api` root: screen time and the activity log
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activity", post(record_activity))
        .route("/screen-time-status/:child_id", get(get_screen_time_status))
        .route("/usage-summary/:child_id", get(get_usage_summary))
}

/// POST /api/activity - log a completed activity, then check the daily limit
pub async fn record_activity(
    State(app_state): State<AppState>,
    Json(request): Json<RecordActivityRequest>,
) -> ApiResult<Json<RecordActivityResponse>> {
    info!(
        "POST /api/activity - child {} {} for {}s",
        request.child_id, request.activity_type, request.duration_seconds
    );

    let command = ActivityMapper::to_record_command(request).map_err(|e| bad_request(format!("{:#}", e)))?;
    let result = app_state
        .usage_monitor
        .record_activity(command)
        .await
        .map_err(|e| map_error("record activity", e))?;

    Ok(Json(RecordActivityResponse {
        activity: ActivityMapper::to_activity_dto(result.activity),
        screen_time: result.status.map(ActivityMapper::to_screen_time_dto),
    }))
}

/// GET /api/screen-time-status/:child_id - today's usage against the caller's child's limit
pub async fn get_screen_time_status(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
) -> ApiResult<Json<ScreenTimeStatus>> {
    info!("GET /api/screen-time-status/{} - guardian {}", child_id, guardian_id);

    app_state
        .child_service
        .get_child(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("check screen time", e))?;
    let status = app_state
        .usage_monitor
        .check_time_limit(&child_id)
        .await
        .map_err(|e| map_error("check screen time", e))?;

    Ok(Json(ActivityMapper::to_screen_time_dto(status)))
}

/// GET /api/usage-summary/:child_id?days=N - per-day usage for the caller's child
pub async fn get_usage_summary(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
    Query(query): Query<UsageSummaryQuery>,
) -> ApiResult<Json<UsageSummaryResponse>> {
    let days = query.days.unwrap_or(DEFAULT_SUMMARY_DAYS);
    info!("GET /api/usage-summary/{} - days {}", child_id, days);

    app_state
        .child_service
        .get_child(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("load usage summary", e))?;
    let summary = app_state
        .usage_monitor
        .usage_summary(&child_id, days)
        .await
        .map_err(|e| map_error("load usage summary", e))?;

    Ok(Json(ActivityMapper::to_summary_dto(child_id, summary)))
}
