//! Errors the domain raises when callers need to tell failures apart.
//!
//! Services return `anyhow::Result`; these variants travel inside the
//! `anyhow::Error` and are recovered with `downcast_ref` at the REST edge.
//! Anything that is not a `SafetyError` is treated as an internal failure.

use shared::IncidentStatus;

#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// Unknown row, or a row owned by someone else. The two are deliberately
    /// indistinguishable to the caller.
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Incident {incident_id} is already {status} and cannot be resolved again")]
    InvalidTransition {
        incident_id: String,
        status: IncidentStatus,
    },
}

impl SafetyError {
    pub fn not_found(what: impl Into<String>) -> anyhow::Error {
        SafetyError::NotFound(what.into()).into()
    }

    pub fn bad_request(message: impl Into<String>) -> anyhow::Error {
        SafetyError::BadRequest(message.into()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_survives_anyhow_round_trip() {
        let err = SafetyError::not_found("Alert alert::1");
        assert_eq!(err.to_string(), "Alert alert::1 not found");
        assert!(matches!(
            err.downcast_ref::<SafetyError>(),
            Some(SafetyError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = SafetyError::InvalidTransition {
            incident_id: "incident::1".to_string(),
            status: IncidentStatus::FalsePositive,
        };
        assert_eq!(
            err.to_string(),
            "Incident incident::1 is already false_positive and cannot be resolved again"
        );
    }
}
