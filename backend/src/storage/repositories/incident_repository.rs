use anyhow::Result;
use async_trait::async_trait;
use shared::{IncidentStatus, ThreatSeverity};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use crate::domain::models::incident::{IncidentFilter, ThreatIncident};
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::IncidentStorage;

const INCIDENT_COLUMNS: &str = "id, child_id, threat_type, severity, confidence, detected_keywords, \
     context, status, parent_notified, resolved_by, resolved_at, resolution_notes, created_at";

/// Repository for threat incidents
#[derive(Clone)]
pub struct IncidentRepository {
    db: DbConnection,
}

impl IncidentRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<ThreatIncident> {
        let resolved_at: Option<String> = row.get("resolved_at");
        Ok(ThreatIncident {
            id: row.get("id"),
            child_id: row.get("child_id"),
            threat_type: row.get("threat_type"),
            severity: ThreatSeverity::parse(row.get("severity"))?,
            confidence: row.get::<i64, _>("confidence").clamp(0, 100) as u8,
            detected_keywords: serde_json::from_str(row.get("detected_keywords"))?,
            context: serde_json::from_str(row.get("context"))?,
            status: IncidentStatus::parse(row.get("status"))?,
            parent_notified: row.get("parent_notified"),
            resolved_by: row.get("resolved_by"),
            resolved_at: resolved_at.as_deref().map(parse_timestamp).transpose()?,
            resolution_notes: row.get("resolution_notes"),
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

#[async_trait]
impl IncidentStorage for IncidentRepository {
    async fn store_incident(&self, incident: &ThreatIncident) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO threat_incidents (
                id, child_id, threat_type, severity, confidence, detected_keywords, context,
                status, parent_notified, resolved_by, resolved_at, resolution_notes, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&incident.id)
        .bind(&incident.child_id)
        .bind(&incident.threat_type)
        .bind(incident.severity.as_str())
        .bind(incident.confidence as i64)
        .bind(serde_json::to_string(&incident.detected_keywords)?)
        .bind(serde_json::to_string(&incident.context)?)
        .bind(incident.status.as_str())
        .bind(incident.parent_notified)
        .bind(&incident.resolved_by)
        .bind(incident.resolved_at.as_ref().map(format_timestamp))
        .bind(&incident.resolution_notes)
        .bind(format_timestamp(&incident.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_incident(&self, incident_id: &str) -> Result<Option<ThreatIncident>> {
        let sql = format!("SELECT {} FROM threat_incidents WHERE id = ?", INCIDENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(incident_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_incidents_for_child(
        &self,
        child_id: &str,
        status: Option<IncidentStatus>,
    ) -> Result<Vec<ThreatIncident>> {
        let filter = IncidentFilter {
            child_id: Some(child_id.to_string()),
            status,
            ..IncidentFilter::default()
        };
        self.list_incidents(&filter).await
    }

    async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<ThreatIncident>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM threat_incidents WHERE 1 = 1",
            INCIDENT_COLUMNS
        ));

        if let Some(child_id) = &filter.child_id {
            query.push(" AND child_id = ").push_bind(child_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(severity) = filter.severity {
            query.push(" AND severity = ").push_bind(severity.as_str());
        }
        if let Some(threat_type) = &filter.threat_type {
            query.push(" AND threat_type = ").push_bind(threat_type.clone());
        }
        query.push(" ORDER BY created_at DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            query.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = query.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::map_row).collect()
    }

    async fn update_incident(&self, incident: &ThreatIncident) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE threat_incidents
            SET status = ?, parent_notified = ?, resolved_by = ?, resolved_at = ?, resolution_notes = ?
            WHERE id = ?
            "#,
        )
        .bind(incident.status.as_str())
        .bind(incident.parent_notified)
        .bind(&incident.resolved_by)
        .bind(incident.resolved_at.as_ref().map(format_timestamp))
        .bind(&incident.resolution_notes)
        .bind(&incident.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
