//! Shared fixtures for the API tests: an in-memory `AppState` and request
//! builders carrying the identity headers.

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::extractors::{ADMIN_HEADER, GUARDIAN_HEADER};
use crate::config::MonitoringConfig;
use crate::domain::commands::children::RegisterChildCommand;
use crate::domain::ThreatLexicon;
use crate::storage::DbConnection;
use crate::AppState;

pub struct TestState {
    pub state: AppState,
}

impl TestState {
    pub async fn register_child(&self, guardian_id: &str, display_name: &str, age_verified: bool) -> String {
        self.state
            .child_service
            .register_child(RegisterChildCommand {
                guardian_id: guardian_id.to_string(),
                display_name: display_name.to_string(),
                age_verified,
            })
            .await
            .expect("Failed to register test child")
            .id
    }
}

pub async fn setup_test_state() -> TestState {
    let db = DbConnection::init_test().await.expect("Failed to init test DB");
    let state = AppState::new(db, Arc::new(ThreatLexicon::built_in()), MonitoringConfig::default());
    TestState { state }
}

fn json_request(method: Method, uri: &str, header: (&str, &str), body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header.0, header.1);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn guardian_request(method: Method, uri: &str, guardian_id: &str, body: Option<Value>) -> Request<Body> {
    json_request(method, uri, (GUARDIAN_HEADER, guardian_id), body)
}

pub fn admin_request(method: Method, uri: &str, admin_id: &str, body: Option<Value>) -> Request<Body> {
    json_request(method, uri, (ADMIN_HEADER, admin_id), body)
}

/// Request without identity headers
pub fn anonymous_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json<T: DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Response body is not the expected JSON")
}
