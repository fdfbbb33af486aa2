use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AlertSeverity, AlertStatus, AlertType, ThreatSeverity};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A guardian-facing notification derived from an incident, a usage breach
/// or blocked content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentAlert {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub related_incident_id: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ParentAlert {
    pub fn generate_id() -> String {
        format!("alert::{}", Uuid::new_v4())
    }

    /// `unread -> read`. Returns whether anything changed; read and
    /// dismissed alerts are left untouched.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != AlertStatus::Unread {
            return false;
        }
        self.status = AlertStatus::Read;
        self.read_at = Some(now);
        true
    }

    /// `unread | read -> dismissed`. Dismissed is terminal, so a second
    /// dismissal is a no-op.
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == AlertStatus::Dismissed {
            return false;
        }
        self.status = AlertStatus::Dismissed;
        self.dismissed_at = Some(now);
        true
    }
}

/// Alert severity for an incident of the given severity
pub fn alert_severity_for(severity: ThreatSeverity) -> AlertSeverity {
    match severity {
        ThreatSeverity::Critical => AlertSeverity::Critical,
        ThreatSeverity::High => AlertSeverity::Warning,
        ThreatSeverity::Medium | ThreatSeverity::Low => AlertSeverity::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unread_alert() -> ParentAlert {
        ParentAlert {
            id: ParentAlert::generate_id(),
            parent_id: "guardian1".to_string(),
            child_id: "child1".to_string(),
            alert_type: AlertType::ThreatDetected,
            severity: AlertSeverity::Warning,
            status: AlertStatus::Unread,
            title: "title".to_string(),
            message: "message".to_string(),
            metadata: BTreeMap::new(),
            related_incident_id: None,
            read_at: None,
            dismissed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(alert_severity_for(ThreatSeverity::Critical), AlertSeverity::Critical);
        assert_eq!(alert_severity_for(ThreatSeverity::High), AlertSeverity::Warning);
        assert_eq!(alert_severity_for(ThreatSeverity::Medium), AlertSeverity::Info);
        assert_eq!(alert_severity_for(ThreatSeverity::Low), AlertSeverity::Info);
    }

    #[test]
    fn test_mark_read_sets_timestamp_once() {
        let mut alert = unread_alert();
        let first = Utc::now();
        assert!(alert.mark_read(first));
        assert_eq!(alert.status, AlertStatus::Read);
        assert_eq!(alert.read_at, Some(first));

        assert!(!alert.mark_read(first + chrono::Duration::minutes(5)));
        assert_eq!(alert.read_at, Some(first));
    }

    #[test]
    fn test_dismiss_skips_read_and_is_terminal() {
        let mut alert = unread_alert();
        let now = Utc::now();
        assert!(alert.dismiss(now));
        assert_eq!(alert.status, AlertStatus::Dismissed);
        assert_eq!(alert.read_at, None);
        assert_eq!(alert.dismissed_at, Some(now));

        assert!(!alert.dismiss(now + chrono::Duration::minutes(1)));
        assert_eq!(alert.dismissed_at, Some(now));

        assert!(!alert.mark_read(now));
        assert_eq!(alert.status, AlertStatus::Dismissed);
    }

    #[test]
    fn test_read_alert_can_be_dismissed() {
        let mut alert = unread_alert();
        let now = Utc::now();
        alert.mark_read(now);
        assert!(alert.dismiss(now));
        assert_eq!(alert.status, AlertStatus::Dismissed);
        assert_eq!(alert.read_at, Some(now));
    }
}
