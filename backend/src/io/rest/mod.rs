//! # REST API
//!
//! Axum handlers for the safety core, grouped by resource. Each `*_apis`
//! module exposes a `router()` that `api_router` nests under its path:
//!
//! - `/safety-rules` - rule upsert, lookup and the access-window check
//! - `/content` - advisory content check
//! - `/activity`, `/screen-time-status`, `/usage-summary` - screen time
//! - `/threats` - incident listing, statistics and resolution
//! - `/alerts` - guardian alert inbox
//! - `/messages` - the screened message send path
//! - `/children` - child registration
//!
//! Handlers stay thin: map the request DTO, call one service, map the result.
//! Service errors go through `errors::map_error`.

use axum::Router;

use crate::AppState;

pub mod alert_apis;
pub mod child_apis;
pub mod content_apis;
pub mod errors;
pub mod extractors;
pub mod mappers;
pub mod message_apis;
pub mod safety_rule_apis;
pub mod screen_time_apis;
pub mod threat_apis;

#[cfg(test)]
pub(crate) mod test_support;

/// Every API route, relative to the `/api` prefix
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/safety-rules", safety_rule_apis::router())
        .nest("/content", content_apis::router())
        .merge(screen_time_apis::router())
        .nest("/threats", threat_apis::router())
        .nest("/alerts", alert_apis::router())
        .nest("/messages", message_apis::router())
        .nest("/children", child_apis::router())
}
