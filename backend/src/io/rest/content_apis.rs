use axum::{extract::State, response::Json, routing::post, Router};
use tracing::info;

use super::errors::{map_error, ApiResult};
use crate::AppState;
use shared::{ContentCheckRequest, ContentCheckResponse};

/// Routes mounted under `/api/content`
pub fn router() -> Router<AppState> {
    Router::new().route("/check", post(check_content))
}

/// POST /api/content/check - advisory check of content (and an optional URL)
/// against the child's blocked keywords and URLs
pub async fn check_content(
    State(app_state): State<AppState>,
    Json(request): Json<ContentCheckRequest>,
) -> ApiResult<Json<ContentCheckResponse>> {
    info!("POST /api/content/check - child {}", request.child_id);

    let (decision, notification) = app_state
        .content_moderation
        .check_content(&request.child_id, &request.content, request.url.as_deref())
        .await
        .map_err(|e| map_error("check content", e))?;
    info!("Content check notification: {:?}", notification);

    Ok(Json(ContentCheckResponse {
        blocked: decision.blocked,
        reason: decision.reason,
    }))
}
