use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use tracing::info;

use super::errors::{map_error, ApiResult};
use super::extractors::GuardianId;
use super::mappers::SafetyRuleMapper;
use crate::AppState;
use shared::{SafetyRuleResponse, TimeRestrictionStatus, UpsertSafetyRuleRequest};

/// Routes mounted under `/api/safety-rules`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", put(upsert_safety_rule))
        .route("/:child_id", get(get_safety_rule))
        .route("/:child_id/time-check", get(check_time_restriction))
}

/// PUT /api/safety-rules - create or merge the caller's child's rule set
pub async fn upsert_safety_rule(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Json(request): Json<UpsertSafetyRuleRequest>,
) -> ApiResult<Json<SafetyRuleResponse>> {
    info!("PUT /api/safety-rules - guardian {} child {}", guardian_id, request.child_id);

    let command = SafetyRuleMapper::to_upsert_command(guardian_id, request);
    let rule = app_state
        .safety_rule_service
        .upsert_rule(command)
        .await
        .map_err(|e| map_error("save safety rule", e))?;

    Ok(Json(SafetyRuleResponse {
        rule: SafetyRuleMapper::to_dto(rule),
        is_default: false,
    }))
}

/// GET /api/safety-rules/:child_id - stored rule, or the default placeholder
pub async fn get_safety_rule(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
) -> ApiResult<Json<SafetyRuleResponse>> {
    info!("GET /api/safety-rules/{} - guardian {}", child_id, guardian_id);

    let policy = app_state
        .safety_rule_service
        .get_rule(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("load safety rule", e))?;

    Ok(Json(SafetyRuleMapper::to_response(policy, &guardian_id)))
}

/// GET /api/safety-rules/:child_id/time-check - is the caller's child inside their allowed window
pub async fn check_time_restriction(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
) -> ApiResult<Json<TimeRestrictionStatus>> {
    info!("GET /api/safety-rules/{}/time-check - guardian {}", child_id, guardian_id);

    app_state
        .child_service
        .get_child(&guardian_id, &child_id)
        .await
        .map_err(|e| map_error("check time restriction", e))?;
    let check = app_state
        .safety_rule_service
        .check_time_restriction(&child_id)
        .await
        .map_err(|e| map_error("check time restriction", e))?;

    Ok(Json(SafetyRuleMapper::to_time_status(check)))
}
