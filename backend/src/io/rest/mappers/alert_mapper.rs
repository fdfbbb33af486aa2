use shared::{AlertListResponse, ParentAlert as SharedAlert};

use crate::domain::models::alert::ParentAlert as DomainAlert;
use crate::domain::models::format_timestamp;

pub struct AlertMapper;

impl AlertMapper {
    pub fn to_dto(domain: DomainAlert) -> SharedAlert {
        SharedAlert {
            id: domain.id,
            parent_id: domain.parent_id,
            child_id: domain.child_id,
            alert_type: domain.alert_type,
            severity: domain.severity,
            status: domain.status,
            title: domain.title,
            message: domain.message,
            metadata: domain.metadata,
            related_incident_id: domain.related_incident_id,
            read_at: domain.read_at.as_ref().map(format_timestamp),
            dismissed_at: domain.dismissed_at.as_ref().map(format_timestamp),
            created_at: format_timestamp(&domain.created_at),
        }
    }

    pub fn to_list_dto(alerts: Vec<DomainAlert>) -> AlertListResponse {
        AlertListResponse {
            alerts: alerts.into_iter().map(Self::to_dto).collect(),
        }
    }
}
