use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::activity::ActivityEvent;
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::ActivityLogStorage;

/// Append-only activity log
#[derive(Clone)]
pub struct ActivityRepository {
    db: DbConnection,
}

impl ActivityRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<ActivityEvent> {
        Ok(ActivityEvent {
            id: row.get("id"),
            child_id: row.get("child_id"),
            activity_type: row.get("activity_type"),
            duration_seconds: row.get::<i64, _>("duration_seconds").max(0) as u32,
            timestamp: parse_timestamp(row.get("timestamp"))?,
        })
    }
}

#[async_trait]
impl ActivityLogStorage for ActivityRepository {
    async fn record_activity(&self, event: &ActivityEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, child_id, activity_type, duration_seconds, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.child_id)
        .bind(&event.activity_type)
        .bind(event.duration_seconds as i64)
        .bind(format_timestamp(&event.timestamp))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn list_activity(
        &self,
        child_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ActivityEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT id, child_id, activity_type, duration_seconds, timestamp
            FROM activity_log
            WHERE child_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC
            "#,
        )
        .bind(child_id)
        .bind(format_timestamp(&start))
        .bind(format_timestamp(&end))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(Self::map_row).collect()
    }
}
