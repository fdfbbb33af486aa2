//! # Incident Store
//!
//! Listing, resolution and statistics for `ThreatIncident`s. Incidents are
//! created by the threat detector; this service only moves them to a
//! terminal state. Resolution is allowed from `open` or `under_review` only.

use anyhow::Result;
use chrono::Utc;
use shared::IncidentStatus;
use std::sync::Arc;
use tracing::info;

use crate::domain::commands::threats::ResolveIncidentCommand;
use crate::domain::errors::SafetyError;
use crate::domain::models::incident::{IncidentFilter, IncidentStats, Resolution, ThreatIncident};
use crate::storage::traits::{ChildDirectory, IncidentStorage};

pub const MAX_INCIDENT_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct IncidentService {
    incidents: Arc<dyn IncidentStorage>,
    children: Arc<dyn ChildDirectory>,
}

impl IncidentService {
    pub fn new(incidents: Arc<dyn IncidentStorage>, children: Arc<dyn ChildDirectory>) -> Self {
        Self { incidents, children }
    }

    /// A child's incidents, most recent first
    pub async fn list(&self, child_id: &str, status: Option<IncidentStatus>) -> Result<Vec<ThreatIncident>> {
        self.incidents.list_incidents_for_child(child_id, status).await
    }

    /// Guardian-scoped `list`
    pub async fn list_for_guardian(
        &self,
        guardian_id: &str,
        child_id: &str,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<ThreatIncident>> {
        self.children.verify_child_ownership(guardian_id, child_id).await?;
        self.list(child_id, status).await
    }

    /// Administrative listing across children
    pub async fn list_all(&self, mut filter: IncidentFilter) -> Result<Vec<ThreatIncident>> {
        filter.limit = filter.limit.map(|l| l.clamp(1, MAX_INCIDENT_LIMIT));
        self.incidents.list_incidents(&filter).await
    }

    pub async fn resolve(&self, command: ResolveIncidentCommand) -> Result<ThreatIncident> {
        let resolution = Resolution::parse(command.resolution.trim()).ok_or_else(|| {
            SafetyError::bad_request(format!(
                "Invalid resolution '{}', expected 'resolved' or 'false_positive'",
                command.resolution
            ))
        })?;

        let mut incident = self
            .incidents
            .get_incident(&command.incident_id)
            .await?
            .ok_or_else(|| SafetyError::not_found(format!("Incident {}", command.incident_id)))?;

        if incident.status.is_terminal() {
            return Err(SafetyError::InvalidTransition {
                incident_id: incident.id,
                status: incident.status,
            }
            .into());
        }

        incident.status = resolution.status();
        incident.resolved_by = Some(command.resolved_by.clone());
        incident.resolved_at = Some(Utc::now());
        incident.resolution_notes = command.notes.filter(|n| !n.trim().is_empty());
        self.incidents.update_incident(&incident).await?;

        info!(
            "Incident {} marked {} by {}",
            incident.id, incident.status, command.resolved_by
        );
        Ok(incident)
    }

    pub async fn stats(&self) -> Result<IncidentStats> {
        let incidents = self.incidents.list_incidents(&IncidentFilter::default()).await?;
        Ok(IncidentStats::from_incidents(&incidents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::child::ChildProfile;
    use crate::storage::{ChildRepository, DbConnection, IncidentRepository};
    use shared::ThreatSeverity;
    use std::collections::BTreeMap;

    async fn setup() -> (IncidentService, Arc<IncidentRepository>) {
        let db = DbConnection::init_test().await.unwrap();
        let children = Arc::new(ChildRepository::new(db.clone()));
        children
            .store_child(&ChildProfile {
                id: "child1".to_string(),
                guardian_id: Some("guardian1".to_string()),
                display_name: "Ada".to_string(),
                age_verified: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let incidents = Arc::new(IncidentRepository::new(db));
        (IncidentService::new(incidents.clone(), children), incidents)
    }

    async fn stored_incident(repo: &IncidentRepository, threat_type: &str, severity: ThreatSeverity) -> ThreatIncident {
        let incident = ThreatIncident {
            id: ThreatIncident::generate_id(),
            child_id: "child1".to_string(),
            threat_type: threat_type.to_string(),
            severity,
            confidence: 52,
            detected_keywords: vec!["bully".to_string()],
            context: BTreeMap::new(),
            status: IncidentStatus::Open,
            parent_notified: false,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            created_at: Utc::now(),
        };
        repo.store_incident(&incident).await.unwrap();
        incident
    }

    fn resolve(incident_id: &str, resolution: &str) -> ResolveIncidentCommand {
        ResolveIncidentCommand {
            incident_id: incident_id.to_string(),
            resolved_by: "admin1".to_string(),
            resolution: resolution.to_string(),
            notes: Some("talked to both families".to_string()),
        }
    }

    #[tokio::test]
    async fn test_resolve_sets_resolution_fields() {
        let (service, repo) = setup().await;
        let incident = stored_incident(&repo, "harassment", ThreatSeverity::High).await;

        let resolved = service.resolve(resolve(&incident.id, "resolved")).await.unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resolved);
        assert_eq!(resolved.resolved_by.as_deref(), Some("admin1"));
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolution_notes.as_deref(), Some("talked to both families"));

        let stored = repo.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IncidentStatus::Resolved);
    }

    #[tokio::test]
    async fn test_terminal_incident_cannot_be_resolved_again() {
        let (service, repo) = setup().await;
        let incident = stored_incident(&repo, "harassment", ThreatSeverity::High).await;
        service.resolve(resolve(&incident.id, "false_positive")).await.unwrap();

        let err = service.resolve(resolve(&incident.id, "resolved")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SafetyError>(),
            Some(SafetyError::InvalidTransition {
                status: IncidentStatus::FalsePositive,
                ..
            })
        ));
        let stored = repo.get_incident(&incident.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IncidentStatus::FalsePositive);
    }

    #[tokio::test]
    async fn test_under_review_can_be_resolved() {
        let (service, repo) = setup().await;
        let mut incident = stored_incident(&repo, "violence", ThreatSeverity::High).await;
        incident.status = IncidentStatus::UnderReview;
        repo.update_incident(&incident).await.unwrap();

        let resolved = service.resolve(resolve(&incident.id, "resolved")).await.unwrap();
        assert_eq!(resolved.status, IncidentStatus::Resolved);
    }

    #[tokio::test]
    async fn test_resolve_errors() {
        let (service, repo) = setup().await;
        let missing = service.resolve(resolve("incident::missing", "resolved")).await.unwrap_err();
        assert!(matches!(missing.downcast_ref::<SafetyError>(), Some(SafetyError::NotFound(_))));

        let incident = stored_incident(&repo, "violence", ThreatSeverity::High).await;
        let bad = service.resolve(resolve(&incident.id, "open")).await.unwrap_err();
        assert!(matches!(bad.downcast_ref::<SafetyError>(), Some(SafetyError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_list_for_guardian_checks_ownership() {
        let (service, repo) = setup().await;
        stored_incident(&repo, "violence", ThreatSeverity::High).await;

        assert_eq!(service.list_for_guardian("guardian1", "child1", None).await.unwrap().len(), 1);
        assert!(service
            .list_for_guardian("guardian1", "child1", Some(IncidentStatus::Resolved))
            .await
            .unwrap()
            .is_empty());
        let err = service.list_for_guardian("guardian2", "child1", None).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SafetyError>(), Some(SafetyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_and_filtered_listing() {
        let (service, repo) = setup().await;
        let first = stored_incident(&repo, "violence", ThreatSeverity::High).await;
        stored_incident(&repo, "violence", ThreatSeverity::Critical).await;
        stored_incident(&repo, "personal_information", ThreatSeverity::Low).await;
        service.resolve(resolve(&first.id, "resolved")).await.unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.high, 1);
        assert_eq!(stats.by_type.get("violence"), Some(&2));

        let violence = service
            .list_all(IncidentFilter {
                threat_type: Some("violence".to_string()),
                status: Some(IncidentStatus::Open),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(violence.len(), 1);
        assert_eq!(violence[0].severity, ThreatSeverity::Critical);
    }
}
