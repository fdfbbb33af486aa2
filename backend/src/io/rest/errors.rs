//! Translation of domain errors into JSON error responses.
//!
//! Every error body has the shape `{"error": <message>, "code": <CODE>}`.

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::domain::errors::SafetyError;
use shared::ParseEnumError;

pub type ApiError = (StatusCode, Json<Value>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(status: StatusCode, message: impl Into<String>, code: &str) -> ApiError {
    (status, Json(json!({ "error": message.into(), "code": code })))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, message, "INVALID_INPUT")
}

/// Parse an optional enum query parameter, rejecting unknown values with 400
pub fn parse_param<T>(value: Option<&str>, parse: fn(&str) -> Result<T, ParseEnumError>) -> ApiResult<Option<T>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| parse(v).map_err(|e| bad_request(e.to_string())))
        .transpose()
}

/// Map a service error. Unexpected failures are logged with `action` and
/// reported without their details.
pub fn map_error(action: &str, err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<SafetyError>() {
        Some(SafetyError::NotFound(_)) => {
            warn!("{}: {}", action, err);
            error_response(StatusCode::NOT_FOUND, err.to_string(), "NOT_FOUND")
        }
        Some(SafetyError::BadRequest(_)) => {
            warn!("{}: {}", action, err);
            bad_request(err.to_string())
        }
        Some(SafetyError::InvalidTransition { .. }) => {
            warn!("{}: {}", action, err);
            error_response(StatusCode::CONFLICT, err.to_string(), "INVALID_TRANSITION")
        }
        None => {
            error!("{}: {:#}", action, err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal server error while trying to {}", action),
                "INTERNAL_ERROR",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::IncidentStatus;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let (status, body) = map_error("load alert", SafetyError::not_found("Alert alert::1"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0["code"], "NOT_FOUND");
        assert_eq!(body.0["error"], "Alert alert::1 not found");

        let (status, _) = map_error("send message", SafetyError::bad_request("empty"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let transition = SafetyError::InvalidTransition {
            incident_id: "incident::1".to_string(),
            status: IncidentStatus::Resolved,
        };
        let (status, body) = map_error("resolve incident", transition.into());
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.0["code"], "INVALID_TRANSITION");
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param(None, IncidentStatus::parse).unwrap(), None);
        assert_eq!(parse_param(Some(" "), IncidentStatus::parse).unwrap(), None);
        assert_eq!(
            parse_param(Some("false_positive"), IncidentStatus::parse).unwrap(),
            Some(IncidentStatus::FalsePositive)
        );
        let (status, body) = parse_param(Some("closed"), IncidentStatus::parse).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["error"], "Invalid incident status value: 'closed'");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, body) = map_error("list alerts", anyhow::anyhow!("disk I/O error at page 7"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0["code"], "INTERNAL_ERROR");
        assert_eq!(body.0["error"], "Internal server error while trying to list alerts");
    }
}
