use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{IncidentStatus, ThreatSeverity};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single detected policy violation tied to one child.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatIncident {
    pub id: String,
    pub child_id: String,
    pub threat_type: String,
    pub severity: ThreatSeverity,
    pub confidence: u8,
    pub detected_keywords: Vec<String>,
    pub context: BTreeMap<String, serde_json::Value>,
    pub status: IncidentStatus,
    pub parent_notified: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ThreatIncident {
    pub fn generate_id() -> String {
        format!("incident::{}", Uuid::new_v4())
    }
}

/// Terminal outcome an administrator can assign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    FalsePositive,
}

impl Resolution {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "resolved" => Some(Resolution::Resolved),
            "false_positive" => Some(Resolution::FalsePositive),
            _ => None,
        }
    }

    pub fn status(&self) -> IncidentStatus {
        match self {
            Resolution::Resolved => IncidentStatus::Resolved,
            Resolution::FalsePositive => IncidentStatus::FalsePositive,
        }
    }
}

/// Filters for the administrative incident listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    pub child_id: Option<String>,
    pub status: Option<IncidentStatus>,
    pub severity: Option<ThreatSeverity>,
    pub threat_type: Option<String>,
    pub limit: Option<u32>,
}

/// Aggregate counts over all incidents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentStats {
    pub total: u64,
    pub open: u64,
    pub critical: u64,
    pub high: u64,
    pub by_type: BTreeMap<String, u64>,
}

impl IncidentStats {
    pub fn from_incidents(incidents: &[ThreatIncident]) -> Self {
        let mut stats = IncidentStats::default();
        for incident in incidents {
            stats.total += 1;
            if incident.status == IncidentStatus::Open {
                stats.open += 1;
            }
            match incident.severity {
                ThreatSeverity::Critical => stats.critical += 1,
                ThreatSeverity::High => stats.high += 1,
                _ => {}
            }
            *stats.by_type.entry(incident.threat_type.clone()).or_insert(0) += 1;
        }
        stats
    }
}
