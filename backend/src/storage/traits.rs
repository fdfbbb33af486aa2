//! # Storage Traits
//!
//! Storage abstractions the domain layer depends on. Every trait is object
//! safe so services can hold `Arc<dyn ...>` and tests can substitute
//! failing implementations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{AlertStatus, AlertType, IncidentStatus};

use crate::domain::models::activity::ActivityEvent;
use crate::domain::models::alert::ParentAlert;
use crate::domain::models::child::ChildProfile;
use crate::domain::models::incident::{IncidentFilter, ThreatIncident};
use crate::domain::models::message::ChatMessage;
use crate::domain::models::safety_rule::SafetyRule;

/// Per-child safety rules. At most one rule set per child.
#[async_trait]
pub trait SafetyRuleStorage: Send + Sync {
    async fn get_rule(&self, child_id: &str) -> Result<Option<SafetyRule>>;

    /// Insert or replace the rule set for `rule.child_id`. Last write wins.
    async fn upsert_rule(&self, rule: &SafetyRule) -> Result<()>;

    /// Returns true if a rule set existed
    async fn delete_rule(&self, child_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait IncidentStorage: Send + Sync {
    async fn store_incident(&self, incident: &ThreatIncident) -> Result<()>;

    async fn get_incident(&self, incident_id: &str) -> Result<Option<ThreatIncident>>;

    /// Most recent first
    async fn list_incidents_for_child(
        &self,
        child_id: &str,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<ThreatIncident>>;

    /// Most recent first
    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<ThreatIncident>>;

    /// Overwrite the mutable fields (status, resolution, parent_notified)
    async fn update_incident(&self, incident: &ThreatIncident) -> Result<()>;
}

#[async_trait]
pub trait AlertStorage: Send + Sync {
    async fn store_alert(&self, alert: &ParentAlert) -> Result<()>;

    async fn get_alert(&self, alert_id: &str) -> Result<Option<ParentAlert>>;

    /// Most recent first
    async fn list_alerts(
        &self,
        parent_id: &str,
        status: Option<AlertStatus>,
        limit: u32,
    ) -> Result<Vec<ParentAlert>>;

    /// Most recent first
    async fn list_alerts_for_child(
        &self,
        parent_id: &str,
        child_id: &str,
        limit: u32,
    ) -> Result<Vec<ParentAlert>>;

    async fn count_unread(&self, parent_id: &str) -> Result<u64>;

    /// Overwrite status, read_at and dismissed_at
    async fn update_alert(&self, alert: &ParentAlert) -> Result<()>;

    /// Move every unread alert of `parent_id` to read; returns the number moved
    async fn mark_all_read(&self, parent_id: &str, read_at: DateTime<Utc>) -> Result<u64>;

    /// Whether an alert of this type was raised for the child since `since`
    async fn has_alert_since(
        &self,
        parent_id: &str,
        child_id: &str,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Append-only usage events
#[async_trait]
pub trait ActivityLogStorage: Send + Sync {
    async fn record_activity(&self, event: &ActivityEvent) -> Result<()>;

    /// Events with `start <= timestamp <= end`, oldest first
    async fn list_activity(
        &self,
        child_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>>;
}

/// Child/guardian directory and ownership checks
#[async_trait]
pub trait ChildDirectory: Send + Sync {
    async fn store_child(&self, child: &ChildProfile) -> Result<()>;

    async fn get_child(&self, child_id: &str) -> Result<Option<ChildProfile>>;

    async fn get_guardian_id(&self, child_id: &str) -> Result<Option<String>>;

    /// Returns true if the child existed
    async fn delete_child(&self, child_id: &str) -> Result<bool>;

    /// Fails with `SafetyError::NotFound` when the child does not exist or
    /// belongs to another guardian.
    async fn verify_child_ownership(&self, guardian_id: &str, child_id: &str) -> Result<()>;
}

#[async_trait]
pub trait MessageStorage: Send + Sync {
    async fn store_message(&self, message: &ChatMessage) -> Result<()>;

    async fn get_message(&self, message_id: &str) -> Result<Option<ChatMessage>>;
}
