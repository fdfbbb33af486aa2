//! # Alert Dispatcher
//!
//! Turns incidents, usage breaches and blocked content into guardian-facing
//! `ParentAlert`s and owns their unread → read → dismissed lifecycle.
//!
//! Every mutation is scoped by the guardian the alert targets. An alert that
//! exists but belongs to another guardian is reported as not found.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use shared::{AlertSeverity, AlertStatus, AlertType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::errors::SafetyError;
use crate::domain::models::activity::TimeLimitStatus;
use crate::domain::models::alert::{alert_severity_for, ParentAlert};
use crate::domain::models::incident::ThreatIncident;
use crate::storage::traits::AlertStorage;

pub const DEFAULT_ALERT_LIMIT: u32 = 50;
pub const MAX_ALERT_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertStorage>,
}

impl AlertService {
    pub fn new(alerts: Arc<dyn AlertStorage>) -> Self {
        Self { alerts }
    }

    /// Alert severity follows the incident: critical → critical, high → warning, else info
    pub async fn create_threat_alert(&self, incident: &ThreatIncident, parent_id: &str) -> Result<ParentAlert> {
        let label = incident.threat_type.replace('_', " ");
        let mut metadata = BTreeMap::new();
        metadata.insert("threatType".to_string(), json!(incident.threat_type));
        metadata.insert("severity".to_string(), json!(incident.severity));
        metadata.insert("confidence".to_string(), json!(incident.confidence));
        metadata.insert("detectedKeywords".to_string(), json!(incident.detected_keywords));
        if let Some(role) = incident.context.get("role") {
            metadata.insert("role".to_string(), role.clone());
        }

        let alert = self.build_alert(
            parent_id,
            &incident.child_id,
            AlertType::ThreatDetected,
            alert_severity_for(incident.severity),
            format!("Potential {} detected", label),
            format!(
                "A message involving your child was flagged for {} ({} severity, {}% confidence).",
                label, incident.severity, incident.confidence
            ),
            metadata,
            Some(incident.id.clone()),
        );
        self.store(alert).await
    }

    pub async fn create_time_limit_alert(&self, parent_id: &str, status: &TimeLimitStatus) -> Result<ParentAlert> {
        let mut metadata = BTreeMap::new();
        metadata.insert("currentMinutes".to_string(), json!(status.current_minutes));
        metadata.insert("limitMinutes".to_string(), json!(status.limit_minutes));

        let alert = self.build_alert(
            parent_id,
            &status.child_id,
            AlertType::TimeLimitExceeded,
            AlertSeverity::Warning,
            "Daily screen time limit reached".to_string(),
            format!(
                "Your child has used {} minutes today, reaching the daily limit of {} minutes.",
                status.current_minutes, status.limit_minutes
            ),
            metadata,
            None,
        );
        self.store(alert).await
    }

    pub async fn create_blocked_content_alert(
        &self,
        parent_id: &str,
        child_id: &str,
        reason: &str,
    ) -> Result<ParentAlert> {
        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), Value::String(reason.to_string()));

        let alert = self.build_alert(
            parent_id,
            child_id,
            AlertType::BlockedContent,
            AlertSeverity::Info,
            "Content blocked".to_string(),
            format!("Content from your child was blocked. {}", reason),
            metadata,
            None,
        );
        self.store(alert).await
    }

    /// Most recent first; `limit` defaults to 50 and is capped at 200
    pub async fn list(
        &self,
        parent_id: &str,
        status: Option<AlertStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<ParentAlert>> {
        let alerts = self
            .alerts
            .list_alerts(parent_id, status, effective_limit(limit))
            .await?;
        debug!("Listed {} alerts for guardian {}", alerts.len(), parent_id);
        Ok(alerts)
    }

    pub async fn list_by_child(
        &self,
        parent_id: &str,
        child_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ParentAlert>> {
        self.alerts
            .list_alerts_for_child(parent_id, child_id, effective_limit(limit))
            .await
    }

    pub async fn unread_count(&self, parent_id: &str) -> Result<u64> {
        self.alerts.count_unread(parent_id).await
    }

    /// Read and dismissed alerts are returned unchanged
    pub async fn mark_read(&self, alert_id: &str, parent_id: &str) -> Result<ParentAlert> {
        let mut alert = self.load_owned(alert_id, parent_id).await?;
        if alert.mark_read(Utc::now()) {
            self.alerts.update_alert(&alert).await?;
            info!("Alert {} marked read by guardian {}", alert_id, parent_id);
        }
        Ok(alert)
    }

    pub async fn mark_all_read(&self, parent_id: &str) -> Result<u64> {
        let updated = self.alerts.mark_all_read(parent_id, Utc::now()).await?;
        info!("Marked {} alerts read for guardian {}", updated, parent_id);
        Ok(updated)
    }

    /// Idempotent; dismissing skips `read` when the alert is still unread
    pub async fn dismiss(&self, alert_id: &str, parent_id: &str) -> Result<ParentAlert> {
        let mut alert = self.load_owned(alert_id, parent_id).await?;
        if alert.dismiss(Utc::now()) {
            self.alerts.update_alert(&alert).await?;
            info!("Alert {} dismissed by guardian {}", alert_id, parent_id);
        }
        Ok(alert)
    }

    pub async fn has_alert_since(
        &self,
        parent_id: &str,
        child_id: &str,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        self.alerts
            .has_alert_since(parent_id, child_id, alert_type, since)
            .await
    }

    async fn load_owned(&self, alert_id: &str, parent_id: &str) -> Result<ParentAlert> {
        self.alerts
            .get_alert(alert_id)
            .await?
            .filter(|alert| alert.parent_id == parent_id)
            .ok_or_else(|| SafetyError::not_found(format!("Alert {}", alert_id)))
    }

    #[allow(clippy::too_many_arguments)]
    fn build_alert(
        &self,
        parent_id: &str,
        child_id: &str,
        alert_type: AlertType,
        severity: AlertSeverity,
        title: String,
        message: String,
        metadata: BTreeMap<String, Value>,
        related_incident_id: Option<String>,
    ) -> ParentAlert {
        ParentAlert {
            id: ParentAlert::generate_id(),
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            alert_type,
            severity,
            status: AlertStatus::Unread,
            title,
            message,
            metadata,
            related_incident_id,
            read_at: None,
            dismissed_at: None,
            created_at: Utc::now(),
        }
    }

    async fn store(&self, alert: ParentAlert) -> Result<ParentAlert> {
        self.alerts.store_alert(&alert).await?;
        info!(
            "Created {} alert {} for guardian {} (child {})",
            alert.alert_type, alert.id, alert.parent_id, alert.child_id
        );
        Ok(alert)
    }
}

fn effective_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_ALERT_LIMIT).clamp(1, MAX_ALERT_LIMIT)
}
