use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{AlertSeverity, AlertStatus, AlertType};
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::alert::ParentAlert;
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::AlertStorage;

/// Repository for guardian alerts
#[derive(Clone)]
pub struct AlertRepository {
    db: DbConnection,
}

impl AlertRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<ParentAlert> {
        let read_at: Option<String> = row.get("read_at");
        let dismissed_at: Option<String> = row.get("dismissed_at");
        Ok(ParentAlert {
            id: row.get("id"),
            parent_id: row.get("parent_id"),
            child_id: row.get("child_id"),
            alert_type: AlertType::parse(row.get("alert_type"))?,
            severity: AlertSeverity::parse(row.get("severity"))?,
            status: AlertStatus::parse(row.get("status"))?,
            title: row.get("title"),
            message: row.get("message"),
            metadata: serde_json::from_str(row.get("metadata"))?,
            related_incident_id: row.get("related_incident_id"),
            read_at: read_at.as_deref().map(parse_timestamp).transpose()?,
            dismissed_at: dismissed_at.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

#[async_trait]
impl AlertStorage for AlertRepository {
    async fn store_alert(&self, alert: &ParentAlert) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO parent_alerts (
                id, parent_id, child_id, alert_type, severity, status, title, message,
                metadata, related_incident_id, read_at, dismissed_at, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.parent_id)
        .bind(&alert.child_id)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(alert.status.as_str())
        .bind(&alert.title)
        .bind(&alert.message)
        .bind(serde_json::to_string(&alert.metadata)?)
        .bind(&alert.related_incident_id)
        .bind(alert.read_at.as_ref().map(format_timestamp))
        .bind(alert.dismissed_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&alert.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_alert(&self, alert_id: &str) -> Result<Option<ParentAlert>> {
        let row = sqlx::query("SELECT * FROM parent_alerts WHERE id = ?")
            .bind(alert_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_alerts(
        &self,
        parent_id: &str,
        status: Option<AlertStatus>,
        limit: u32,
    ) -> Result<Vec<ParentAlert>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM parent_alerts
                    WHERE parent_id = ? AND status = ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(parent_id)
                .bind(status.as_str())
                .bind(limit as i64)
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT * FROM parent_alerts
                    WHERE parent_id = ?
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?
                    "#,
                )
                .bind(parent_id)
                .bind(limit as i64)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.iter().map(Self::map_row).collect()
    }

    async fn list_alerts_for_child(
        &self,
        parent_id: &str,
        child_id: &str,
        limit: u32,
    ) -> Result<Vec<ParentAlert>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM parent_alerts
            WHERE parent_id = ? AND child_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(limit as i64)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn count_unread(&self, parent_id: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM parent_alerts WHERE parent_id = ? AND status = 'unread'",
        )
        .bind(parent_id)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn update_alert(&self, alert: &ParentAlert) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE parent_alerts
            SET status = ?, read_at = ?, dismissed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(alert.status.as_str())
        .bind(alert.read_at.as_ref().map(format_timestamp))
        .bind(alert.dismissed_at.as_ref().map(format_timestamp))
        .bind(&alert.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn mark_all_read(&self, parent_id: &str, read_at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE parent_alerts
            SET status = 'read', read_at = ?
            WHERE parent_id = ? AND status = 'unread'
            "#,
        )
        .bind(format_timestamp(&read_at))
        .bind(parent_id)
        .execute(self.db.pool())
        .await?;
        Ok(result.rows_affected())
    }

    async fn has_alert_since(
        &self,
        parent_id: &str,
        child_id: &str,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let found = sqlx::query(
            r#"
            SELECT 1 FROM parent_alerts
            WHERE parent_id = ? AND child_id = ? AND alert_type = ? AND created_at >= ?
            LIMIT 1
            "#,
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(alert_type.as_str())
        .bind(format_timestamp(&since))
        .fetch_optional(self.db.pool())
        .await?
        .is_some();
        Ok(found)
    }
}
