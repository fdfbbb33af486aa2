//! Caller identity extractors.
//!
//! Authentication happens upstream; the authenticated guardian or
//! administrator id arrives in a request header. A missing or blank header
//! is rejected with 401.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::StatusCode};

use super::errors::{error_response, ApiError};

pub const GUARDIAN_HEADER: &str = "x-guardian-id";
pub const ADMIN_HEADER: &str = "x-admin-id";

/// The authenticated guardian
#[derive(Debug, Clone, PartialEq)]
pub struct GuardianId(pub String);

/// The authenticated administrator, used as `resolved_by`
#[derive(Debug, Clone, PartialEq)]
pub struct AdminId(pub String);

fn header_identity(parts: &Parts, header: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                format!("Missing {} header", header),
                "UNAUTHENTICATED",
            )
        })
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for GuardianId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_identity(parts, GUARDIAN_HEADER).map(GuardianId)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_identity(parts, ADMIN_HEADER).map(AdminId)
    }
}
