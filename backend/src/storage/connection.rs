use anyhow::Result;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Sqlite,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Tables and indexes, applied idempotently on every start
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS children (
        id TEXT PRIMARY KEY,
        guardian_id TEXT,
        display_name TEXT NOT NULL,
        age_verified INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_children_guardian
    ON children(guardian_id);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS safety_rules (
        child_id TEXT PRIMARY KEY,
        guardian_id TEXT NOT NULL,
        time_restrictions TEXT NOT NULL,
        blocked_keywords TEXT NOT NULL,
        blocked_urls TEXT NOT NULL,
        content_filters TEXT NOT NULL,
        alert_settings TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS threat_incidents (
        id TEXT PRIMARY KEY,
        child_id TEXT NOT NULL,
        threat_type TEXT NOT NULL,
        severity TEXT NOT NULL,
        confidence INTEGER NOT NULL,
        detected_keywords TEXT NOT NULL,
        context TEXT NOT NULL,
        status TEXT NOT NULL,
        parent_notified INTEGER NOT NULL DEFAULT 0,
        resolved_by TEXT,
        resolved_at TEXT,
        resolution_notes TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_threat_incidents_child
    ON threat_incidents(child_id, created_at DESC);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS parent_alerts (
        id TEXT PRIMARY KEY,
        parent_id TEXT NOT NULL,
        child_id TEXT NOT NULL,
        alert_type TEXT NOT NULL,
        severity TEXT NOT NULL,
        status TEXT NOT NULL,
        title TEXT NOT NULL,
        message TEXT NOT NULL,
        metadata TEXT NOT NULL,
        related_incident_id TEXT,
        read_at TEXT,
        dismissed_at TEXT,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_parent_alerts_parent
    ON parent_alerts(parent_id, status, created_at DESC);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS activity_log (
        id TEXT PRIMARY KEY,
        child_id TEXT NOT NULL,
        activity_type TEXT NOT NULL,
        duration_seconds INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    );
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_activity_log_child_time
    ON activity_log(child_id, timestamp);
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        sender_id TEXT NOT NULL,
        recipient_ids TEXT NOT NULL,
        content TEXT NOT NULL,
        is_flagged INTEGER NOT NULL DEFAULT 0,
        flagged_reason TEXT,
        created_at TEXT NOT NULL
    );
    "#,
];

/// DbConnection owns the SQLite pool shared by every repository
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and apply the schema
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database at {}", url);
            Sqlite::create_database(url).await?
        }

        let pool = SqlitePoolOptions::new().connect(url).await?;
        Self::from_pool(pool).await
    }

    /// Each call gets its own private in-memory database
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        // A single long-lived connection keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::setup_schema(&pool).await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(pool).await?;
        }
        debug!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &*self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_schema_creates_all_tables() {
        let db = DbConnection::init_test().await.unwrap();
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let tables: Vec<String> = rows.iter().map(|r| r.get("name")).collect();
        for table in [
            "activity_log",
            "children",
            "messages",
            "parent_alerts",
            "safety_rules",
            "threat_incidents",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_schema_setup_is_idempotent() {
        let db = DbConnection::init_test().await.unwrap();
        DbConnection::setup_schema(db.pool()).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_is_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite:{}", dir.path().join("safety.db").display());
        let db = DbConnection::new(&url).await.unwrap();
        assert!(dir.path().join("safety.db").exists());
        db.pool().close().await;
    }
}
