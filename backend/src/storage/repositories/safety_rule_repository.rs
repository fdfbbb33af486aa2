use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::safety_rule::SafetyRule;
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::SafetyRuleStorage;

/// Repository for per-child safety rules. Option bundles and block lists are
/// stored as JSON text.
#[derive(Clone)]
pub struct SafetyRuleRepository {
    db: DbConnection,
}

impl SafetyRuleRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<SafetyRule> {
        Ok(SafetyRule {
            child_id: row.get("child_id"),
            guardian_id: row.get("guardian_id"),
            time_restrictions: serde_json::from_str(row.get("time_restrictions"))?,
            blocked_keywords: serde_json::from_str(row.get("blocked_keywords"))?,
            blocked_urls: serde_json::from_str(row.get("blocked_urls"))?,
            content_filters: serde_json::from_str(row.get("content_filters"))?,
            alert_settings: serde_json::from_str(row.get("alert_settings"))?,
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        })
    }
}

#[async_trait]
impl SafetyRuleStorage for SafetyRuleRepository {
    async fn get_rule(&self, child_id: &str) -> Result<Option<SafetyRule>> {
        let row = sqlx::query(
            r#"
            SELECT child_id, guardian_id, time_restrictions, blocked_keywords, blocked_urls,
                   content_filters, alert_settings, created_at, updated_at
            FROM safety_rules
            WHERE child_id = ?
            "#,
        )
        .bind(child_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn upsert_rule(&self, rule: &SafetyRule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO safety_rules (
                child_id, guardian_id, time_restrictions, blocked_keywords, blocked_urls,
                content_filters, alert_settings, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rule.child_id)
        .bind(&rule.guardian_id)
        .bind(serde_json::to_string(&rule.time_restrictions)?)
        .bind(serde_json::to_string(&rule.blocked_keywords)?)
        .bind(serde_json::to_string(&rule.blocked_urls)?)
        .bind(serde_json::to_string(&rule.content_filters)?)
        .bind(serde_json::to_string(&rule.alert_settings)?)
        .bind(format_timestamp(&rule.created_at))
        .bind(format_timestamp(&rule.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_rule(&self, child_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM safety_rules WHERE child_id = ?")
            .bind(child_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn setup_repo() -> SafetyRuleRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        SafetyRuleRepository::new(db)
    }

    #[tokio::test]
    async fn test_missing_rule_is_none() {
        let repo = setup_repo().await;
        assert!(repo.get_rule("child1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_rule() {
        let repo = setup_repo().await;
        let mut rule = SafetyRule::new("child1", "guardian1", Utc::now());
        rule.blocked_keywords.insert("bully".to_string());
        rule.blocked_urls.insert("badsite.example".to_string());
        rule.time_restrictions.enabled = true;
        rule.time_restrictions.max_daily_minutes = Some(90);
        repo.upsert_rule(&rule).await.unwrap();

        let loaded = repo.get_rule("child1").await.unwrap().unwrap();
        assert!(loaded.blocked_keywords.contains("bully"));
        assert!(loaded.blocked_urls.contains("badsite.example"));
        assert!(loaded.time_restrictions.enabled);
        assert_eq!(loaded.time_restrictions.max_daily_minutes, Some(90));

        rule.blocked_keywords.clear();
        rule.alert_settings.time_limit_alerts = false;
        repo.upsert_rule(&rule).await.unwrap();

        let reloaded = repo.get_rule("child1").await.unwrap().unwrap();
        assert!(reloaded.blocked_keywords.is_empty());
        assert!(!reloaded.alert_settings.time_limit_alerts);
    }

    #[tokio::test]
    async fn test_delete_rule() {
        let repo = setup_repo().await;
        repo.upsert_rule(&SafetyRule::new("child1", "guardian1", Utc::now()))
            .await
            .unwrap();

        assert!(repo.delete_rule("child1").await.unwrap());
        assert!(!repo.delete_rule("child1").await.unwrap());
        assert!(repo.get_rule("child1").await.unwrap().is_none());
    }
}
