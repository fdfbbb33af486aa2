use axum::{extract::State, response::Json, routing::post, Router};
use tracing::info;

use super::errors::{map_error, ApiResult};
use super::mappers::MessageMapper;
use crate::AppState;
use shared::{SendMessageRequest, SendMessageResponse};

/// Routes mounted under `/api/messages`
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(send_message))
}

/// POST /api/messages - screen, persist and deliver a direct or group message
pub async fn send_message(
    State(app_state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    info!(
        "POST /api/messages - sender {} to {} recipient(s)",
        request.sender_id,
        request.recipient_ids.len()
    );

    let command = MessageMapper::to_send_command(request);
    let result = app_state
        .messaging_service
        .send_message(command)
        .await
        .map_err(|e| map_error("send message", e))?;

    Ok(Json(MessageMapper::to_send_response(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::rest::test_support::{anonymous_request, read_json, setup_test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use shared::AlertType;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_clean_message_is_delivered_unflagged() {
        let test_state = setup_test_state().await;
        let ada = test_state.register_child("guardian1", "Ada", true).await;
        let ben = test_state.register_child("guardian2", "Ben", true).await;
        let app = router().with_state(test_state.state.clone());

        let payload = json!({ "sender_id": ada, "recipient_ids": [ben], "content": "  see you at practice " });
        let response = app
            .oneshot(anonymous_request(Method::POST, "/", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: SendMessageResponse = read_json(response).await;
        assert_eq!(body.message.content, "see you at practice");
        assert!(!body.message.is_flagged);
        assert!(body.message.flagged_reason.is_none());
        assert!(body.intervention.is_none());
    }

    #[tokio::test]
    async fn test_flagged_message_returns_intervention_and_alerts_guardians() {
        let test_state = setup_test_state().await;
        let ada = test_state.register_child("guardian1", "Ada", true).await;
        let ben = test_state.register_child("guardian2", "Ben", true).await;
        let app = router().with_state(test_state.state.clone());

        let payload = json!({ "sender_id": ada, "recipient_ids": [ben], "content": "you are a bully" });
        let response = app
            .oneshot(anonymous_request(Method::POST, "/", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: SendMessageResponse = read_json(response).await;
        assert!(body.message.is_flagged);
        assert_eq!(body.message.flagged_reason.as_deref(), Some("Potential harassment detected"));
        let intervention = body.intervention.expect("sender should get an intervention");
        assert_eq!(intervention.options, vec!["Ignore", "Block", "Tell a Parent"]);

        for guardian in ["guardian1", "guardian2"] {
            let alerts = test_state.state.alert_service.list(guardian, None, None).await.unwrap();
            assert_eq!(alerts.len(), 1);
            assert_eq!(alerts[0].alert_type, AlertType::ThreatDetected);
        }
    }

    #[tokio::test]
    async fn test_unverified_recipient_is_rejected() {
        let test_state = setup_test_state().await;
        let ada = test_state.register_child("guardian1", "Ada", true).await;
        let ben = test_state.register_child("guardian2", "Ben", false).await;
        let app = router().with_state(test_state.state.clone());

        let payload = json!({ "sender_id": ada, "recipient_ids": [ben], "content": "hi" });
        let response = app
            .clone()
            .oneshot(anonymous_request(Method::POST, "/", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let payload = json!({ "sender_id": ada, "recipient_ids": ["child::ghost"], "content": "hi" });
        let response = app
            .clone()
            .oneshot(anonymous_request(Method::POST, "/", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let payload = json!({ "sender_id": ada, "recipient_ids": [ada], "content": "   " });
        let response = app
            .oneshot(anonymous_request(Method::POST, "/", Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_json(response).await;
        assert_eq!(body["code"], "INVALID_INPUT");
    }
}
