use shared::{IncidentListResponse, IncidentStatsResponse, ThreatIncident as SharedIncident};

use crate::domain::models::format_timestamp;
use crate::domain::models::incident::{IncidentStats, ThreatIncident as DomainIncident};

pub struct IncidentMapper;

impl IncidentMapper {
    pub fn to_dto(domain: DomainIncident) -> SharedIncident {
        SharedIncident {
            id: domain.id,
            child_id: domain.child_id,
            threat_type: domain.threat_type,
            severity: domain.severity,
            confidence: domain.confidence,
            detected_keywords: domain.detected_keywords,
            context: domain.context,
            status: domain.status,
            parent_notified: domain.parent_notified,
            resolved_by: domain.resolved_by,
            resolved_at: domain.resolved_at.as_ref().map(format_timestamp),
            resolution_notes: domain.resolution_notes,
            created_at: format_timestamp(&domain.created_at),
        }
    }

    pub fn to_list_dto(incidents: Vec<DomainIncident>) -> IncidentListResponse {
        IncidentListResponse {
            incidents: incidents.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_stats_dto(stats: IncidentStats) -> IncidentStatsResponse {
        IncidentStatsResponse {
            total: stats.total,
            open: stats.open,
            critical: stats.critical,
            high: stats.high,
            by_type: stats.by_type,
        }
    }
}
