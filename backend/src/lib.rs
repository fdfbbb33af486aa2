//! Child-safety monitoring backend.
//!
//! Guardians configure a safety rule per child; outbound content is screened
//! against it, messages are scanned for threats, screen time is tracked
//! against the daily limit, and guardians are alerted when something needs
//! their attention.
//!
//! - [`storage`]: SQLite persistence behind async storage traits
//! - [`domain`]: the services holding the business rules
//! - [`io`]: the REST surface
//! - [`config`]: YAML configuration with environment overrides

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AppConfig, MonitoringConfig, ServerConfig};
use crate::domain::{
    AlertService, ChildService, ContentModerationGate, IncidentService, MessagingService, SafetyRuleService,
    ThreatDetector, ThreatLexicon, UsageMonitor,
};
use crate::storage::{
    ActivityLogStorage, ActivityRepository, AlertRepository, AlertStorage, ChildDirectory, ChildRepository,
    DbConnection, IncidentRepository, IncidentStorage, MessageRepository, MessageStorage, SafetyRuleRepository,
    SafetyRuleStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub safety_rule_service: SafetyRuleService,
    pub content_moderation: ContentModerationGate,
    pub usage_monitor: UsageMonitor,
    pub incident_service: IncidentService,
    pub alert_service: AlertService,
    pub messaging_service: MessagingService,
    pub child_service: ChildService,
}

impl AppState {
    /// Wire every service on top of one database connection
    pub fn new(db: DbConnection, lexicon: Arc<ThreatLexicon>, monitoring: MonitoringConfig) -> Self {
        let children: Arc<dyn ChildDirectory> = Arc::new(ChildRepository::new(db.clone()));
        let rules: Arc<dyn SafetyRuleStorage> = Arc::new(SafetyRuleRepository::new(db.clone()));
        let incidents: Arc<dyn IncidentStorage> = Arc::new(IncidentRepository::new(db.clone()));
        let alerts: Arc<dyn AlertStorage> = Arc::new(AlertRepository::new(db.clone()));
        let activity: Arc<dyn ActivityLogStorage> = Arc::new(ActivityRepository::new(db.clone()));
        let messages: Arc<dyn MessageStorage> = Arc::new(MessageRepository::new(db));

        let safety_rule_service = SafetyRuleService::new(rules, children.clone());
        let alert_service = AlertService::new(alerts);
        let content_moderation =
            ContentModerationGate::new(safety_rule_service.clone(), children.clone(), alert_service.clone());
        let threat_detector = ThreatDetector::new(
            lexicon,
            safety_rule_service.clone(),
            incidents.clone(),
            children.clone(),
            alert_service.clone(),
            monitoring.context_excerpt_chars,
        );
        let usage_monitor = UsageMonitor::new(
            activity,
            safety_rule_service.clone(),
            children.clone(),
            alert_service.clone(),
            monitoring,
        );
        let incident_service = IncidentService::new(incidents, children.clone());
        let messaging_service = MessagingService::new(
            messages,
            children.clone(),
            safety_rule_service.clone(),
            content_moderation.clone(),
            threat_detector,
        );
        let child_service = ChildService::new(children, safety_rule_service.clone());

        Self {
            safety_rule_service,
            content_moderation,
            usage_monitor,
            incident_service,
            alert_service,
            messaging_service,
            child_service,
        }
    }
}

/// Load the lexicon named in the config, or the built-in one
pub fn load_lexicon(config: &AppConfig) -> Result<ThreatLexicon> {
    match &config.lexicon_path {
        Some(path) => {
            info!("Loading threat lexicon from {}", path.display());
            ThreatLexicon::from_yaml_file(path)
        }
        None => Ok(ThreatLexicon::built_in()),
    }
}

pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db_conn = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    info!("Setting up domain model");
    let lexicon = load_lexicon(config)?;
    info!(
        "Threat lexicon has {} categories and {} terms",
        lexicon.categories().len(),
        lexicon.term_count()
    );

    Ok(AppState::new(db_conn, Arc::new(lexicon), config.monitoring.clone()))
}

pub fn create_router(app_state: AppState, server: &ServerConfig) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);
    let cors = match &server.cors_origin {
        Some(origin) => {
            let origin = origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", origin))?;
            cors.allow_origin(origin)
        }
        None => cors.allow_origin(Any),
    };

    Ok(Router::new()
        .nest("/api", io::rest::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::children::RegisterChildCommand;
    use axum::{body::Body, http::Request, http::StatusCode};
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tower::util::ServiceExt;

    async fn test_state() -> AppState {
        let db = DbConnection::init_test().await.unwrap();
        AppState::new(db, Arc::new(ThreatLexicon::built_in()), MonitoringConfig::default())
    }

    #[test]
    fn test_load_lexicon_from_config() {
        let config = AppConfig::default();
        assert_eq!(load_lexicon(&config).unwrap().term_count(), ThreatLexicon::built_in().term_count());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "categories:\n  - name: scams\n    severity: medium\n    terms: [\"free robux\", \"gift card\"]"
        )
        .unwrap();
        let config = AppConfig {
            lexicon_path: Some(file.path().to_path_buf()),
            ..AppConfig::default()
        };
        let lexicon = load_lexicon(&config).unwrap();
        assert_eq!(lexicon.term_count(), 2);
        assert_eq!(lexicon.scan("get FREE ROBUX now").unwrap().first_category, "scams");

        let config = AppConfig {
            lexicon_path: Some("/nonexistent/lexicon.yaml".into()),
            ..AppConfig::default()
        };
        assert!(load_lexicon(&config).is_err());
    }

    #[tokio::test]
    async fn test_router_serves_api_with_cors() {
        let state = test_state().await;
        let child = state
            .child_service
            .register_child(RegisterChildCommand {
                guardian_id: "guardian1".to_string(),
                display_name: "Ada".to_string(),
                age_verified: true,
            })
            .await
            .unwrap();
        let router = create_router(state, &ServerConfig::default()).unwrap();
        let request = Request::builder()
            .uri(format!("/api/safety-rules/{}/time-check", child.id))
            .header("origin", "http://localhost:8080")
            .header("x-guardian-id", "guardian1")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:8080"
        );
    }

    #[tokio::test]
    async fn test_router_rejects_invalid_cors_origin() {
        let server = ServerConfig {
            cors_origin: Some("http://bad\norigin".to_string()),
            ..ServerConfig::default()
        };
        assert!(create_router(test_state().await, &server).is_err());

        let open = ServerConfig {
            cors_origin: None,
            ..ServerConfig::default()
        };
        assert!(create_router(test_state().await, &open).is_ok());
    }
}
