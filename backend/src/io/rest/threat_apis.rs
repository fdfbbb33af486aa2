use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::errors::{map_error, parse_param, ApiResult};
use super::extractors::{AdminId, GuardianId};
use super::mappers::IncidentMapper;
use crate::domain::commands::threats::ResolveIncidentCommand;
use crate::domain::models::incident::IncidentFilter;
use crate::AppState;
use shared::{
    IncidentListResponse, IncidentStatsResponse, IncidentStatus, ResolveIncidentRequest, ThreatIncident,
    ThreatSeverity,
};

#[derive(Debug, Default, Deserialize)]
pub struct ChildIncidentQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentListQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
    #[serde(alias = "threatType")]
    pub threat_type: Option<String>,
    #[serde(alias = "childId")]
    pub child_id: Option<String>,
    pub limit: Option<u32>,
}

/// Routes mounted under `/api/threats`. Everything except the per-child
/// listing is an administrator endpoint.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_incidents))
        .route("/stats", get(get_incident_stats))
        .route("/child/:child_id", get(list_child_incidents))
        .route("/:incident_id/resolve", patch(resolve_incident))
}

/// GET /api/threats/child/:child_id?status= - the caller's child's incidents
pub async fn list_child_incidents(
    State(app_state): State<AppState>,
    GuardianId(guardian_id): GuardianId,
    Path(child_id): Path<String>,
    Query(query): Query<ChildIncidentQuery>,
) -> ApiResult<Json<IncidentListResponse>> {
    info!("GET /api/threats/child/{} - guardian {}", child_id, guardian_id);

    let status = parse_param(query.status.as_deref(), IncidentStatus::parse)?;
    let incidents = app_state
        .incident_service
        .list_for_guardian(&guardian_id, &child_id, status)
        .await
        .map_err(|e| map_error("list incidents", e))?;

    Ok(Json(IncidentMapper::to_list_dto(incidents)))
}

/// GET /api/threats - filtered listing across all children
pub async fn list_incidents(
    State(app_state): State<AppState>,
    AdminId(admin_id): AdminId,
    Query(query): Query<IncidentListQuery>,
) -> ApiResult<Json<IncidentListResponse>> {
    info!("GET /api/threats - admin {} {:?}", admin_id, query);

    let filter = IncidentFilter {
        status: parse_param(query.status.as_deref(), IncidentStatus::parse)?,
        severity: parse_param(query.severity.as_deref(), ThreatSeverity::parse)?,
        threat_type: query.threat_type.filter(|t| !t.trim().is_empty()),
        child_id: query.child_id.filter(|c| !c.trim().is_empty()),
        limit: query.limit,
    };
    let incidents = app_state
        .incident_service
        .list_all(filter)
        .await
        .map_err(|e| map_error("list incidents", e))?;

    Ok(Json(IncidentMapper::to_list_dto(incidents)))
}

/// GET /api/threats/stats
pub async fn get_incident_stats(
    State(app_state): State<AppState>,
    AdminId(admin_id): AdminId,
) -> ApiResult<Json<IncidentStatsResponse>> {
    info!("GET /api/threats/stats - admin {}", admin_id);

    let stats = app_state
        .incident_service
        .stats()
        .await
        .map_err(|e| map_error("load incident statistics", e))?;

    Ok(Json(IncidentMapper::to_stats_dto(stats)))
}

/// PATCH /api/threats/:incident_id/resolve - close an incident
pub async fn resolve_incident(
    State(app_state): State<AppState>,
    AdminId(admin_id): AdminId,
    Path(incident_id): Path<String>,
    Json(request): Json<ResolveIncidentRequest>,
) -> ApiResult<Json<ThreatIncident>> {
    info!(
        "PATCH /api/threats/{}/resolve - admin {} resolution {}",
        incident_id, admin_id, request.resolution
    );

    let command = ResolveIncidentCommand {
        incident_id,
        resolved_by: admin_id,
        resolution: request.resolution,
        notes: request.notes,
    };
    let incident = app_state
        .incident_service
        .resolve(command)
        .await
        .map_err(|e| map_error("resolve incident", e))?;

    Ok(Json(IncidentMapper::to_dto(incident)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::messaging::SendMessageCommand;
    use crate::io::rest::test_support::{admin_request, guardian_request, read_json, setup_test_state, TestState};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    /// Two children exchange a harassing message; returns (sender, recipient)
    async fn flagged_exchange(test_state: &TestState) -> (String, String) {
        let sender = test_state.register_child("guardian1", "Ada", true).await;
        let recipient = test_state.register_child("guardian2", "Ben", true).await;
        test_state
            .state
            .messaging_service
            .send_message(SendMessageCommand {
                sender_id: sender.clone(),
                recipient_ids: vec![recipient.clone()],
                content: "stop being a bully".to_string(),
            })
            .await
            .unwrap();
        (sender, recipient)
    }

    #[tokio::test]
    async fn test_guardian_lists_own_child_incidents() {
        let test_state = setup_test_state().await;
        let (sender, _) = flagged_exchange(&test_state).await;
        let app = router().with_state(test_state.state.clone());

        let uri = format!("/child/{}", sender);
        let response = app
            .clone()
            .oneshot(guardian_request(Method::GET, &uri, "guardian1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: IncidentListResponse = read_json(response).await;
        assert_eq!(body.incidents.len(), 1);
        assert_eq!(body.incidents[0].threat_type, "harassment");
        assert_eq!(body.incidents[0].status, IncidentStatus::Open);

        let response = app
            .clone()
            .oneshot(guardian_request(Method::GET, &uri, "guardian2", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(guardian_request(Method::GET, &format!("{}?status=closed", uri), "guardian1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_listing_and_stats() {
        let test_state = setup_test_state().await;
        let (_, recipient) = flagged_exchange(&test_state).await;
        let app = router().with_state(test_state.state.clone());

        let response = app
            .clone()
            .oneshot(admin_request(Method::GET, "/?threat_type=harassment", "admin1", None))
            .await
            .unwrap();
        let body: IncidentListResponse = read_json(response).await;
        assert_eq!(body.incidents.len(), 2);

        let uri = format!("/?childId={}&severity=high&limit=10", recipient);
        let response = app
            .clone()
            .oneshot(admin_request(Method::GET, &uri, "admin1", None))
            .await
            .unwrap();
        let body: IncidentListResponse = read_json(response).await;
        assert_eq!(body.incidents.len(), 1);
        assert_eq!(body.incidents[0].child_id, recipient);

        let response = app
            .clone()
            .oneshot(admin_request(Method::GET, "/stats", "admin1", None))
            .await
            .unwrap();
        let stats: IncidentStatsResponse = read_json(response).await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.by_type.get("harassment"), Some(&2));

        let response = app
            .oneshot(guardian_request(Method::GET, "/stats", "guardian1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_resolve_incident_lifecycle() {
        let test_state = setup_test_state().await;
        let (sender, _) = flagged_exchange(&test_state).await;
        let incident_id = test_state.state.incident_service.list(&sender, None).await.unwrap()[0]
            .id
            .clone();
        let app = router().with_state(test_state.state.clone());
        let uri = format!("/{}/resolve", incident_id);

        let payload = json!({ "resolution": "false_positive", "notes": "friends joking" });
        let response = app
            .clone()
            .oneshot(admin_request(Method::PATCH, &uri, "admin1", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resolved: ThreatIncident = read_json(response).await;
        assert_eq!(resolved.status, IncidentStatus::FalsePositive);
        assert_eq!(resolved.resolved_by.as_deref(), Some("admin1"));
        assert_eq!(resolved.resolution_notes.as_deref(), Some("friends joking"));
        assert!(resolved.resolved_at.is_some());

        let payload = json!({ "resolution": "resolved" });
        let response = app
            .clone()
            .oneshot(admin_request(Method::PATCH, &uri, "admin1", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = read_json(response).await;
        assert_eq!(body["code"], "INVALID_TRANSITION");

        let payload = json!({ "resolution": "resolved" });
        let response = app
            .oneshot(admin_request(Method::PATCH, "/incident::missing/resolve", "admin1", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
