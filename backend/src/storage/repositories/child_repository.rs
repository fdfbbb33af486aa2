use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::errors::SafetyError;
use crate::domain::models::child::ChildProfile;
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::ChildDirectory;

/// Repository for the child/guardian directory
#[derive(Clone)]
pub struct ChildRepository {
    db: DbConnection,
}

impl ChildRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<ChildProfile> {
        Ok(ChildProfile {
            id: row.get("id"),
            guardian_id: row.get("guardian_id"),
            display_name: row.get("display_name"),
            age_verified: row.get("age_verified"),
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

#[async_trait]
impl ChildDirectory for ChildRepository {
    async fn store_child(&self, child: &ChildProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO children (id, guardian_id, display_name, age_verified, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&child.id)
        .bind(&child.guardian_id)
        .bind(&child.display_name)
        .bind(child.age_verified)
        .bind(format_timestamp(&child.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_child(&self, child_id: &str) -> Result<Option<ChildProfile>> {
        let row = sqlx::query(
            r#"
            SELECT id, guardian_id, display_name, age_verified, created_at
            FROM children
            WHERE id = ?
            "#,
        )
        .bind(child_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn get_guardian_id(&self, child_id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT guardian_id FROM children WHERE id = ?")
            .bind(child_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.and_then(|r| r.get::<Option<String>, _>("guardian_id")))
    }

    async fn delete_child(&self, child_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM children WHERE id = ?")
            .bind(child_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn verify_child_ownership(&self, guardian_id: &str, child_id: &str) -> Result<()> {
        let owned = sqlx::query("SELECT 1 FROM children WHERE id = ? AND guardian_id = ?")
            .bind(child_id)
            .bind(guardian_id)
            .fetch_optional(self.db.pool())
            .await?
            .is_some();

        if !owned {
            return Err(SafetyError::not_found(format!("Child {}", child_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn setup_repo() -> ChildRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        ChildRepository::new(db)
    }

    fn child(id: &str, guardian_id: Option<&str>) -> ChildProfile {
        ChildProfile {
            id: id.to_string(),
            guardian_id: guardian_id.map(str::to_string),
            display_name: format!("Child {}", id),
            age_verified: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_store_and_get_child() {
        let repo = setup_repo().await;
        let stored = child("child1", Some("guardian1"));
        repo.store_child(&stored).await.unwrap();

        let loaded = repo.get_child("child1").await.unwrap().unwrap();
        assert_eq!(loaded.display_name, "Child child1");
        assert_eq!(loaded.guardian_id.as_deref(), Some("guardian1"));
        assert!(loaded.age_verified);
        assert_eq!(
            format_timestamp(&loaded.created_at),
            format_timestamp(&stored.created_at)
        );
    }

    #[tokio::test]
    async fn test_guardian_lookup() {
        let repo = setup_repo().await;
        repo.store_child(&child("child1", Some("guardian1"))).await.unwrap();
        repo.store_child(&child("orphan", None)).await.unwrap();

        assert_eq!(repo.get_guardian_id("child1").await.unwrap().as_deref(), Some("guardian1"));
        assert_eq!(repo.get_guardian_id("orphan").await.unwrap(), None);
        assert_eq!(repo.get_guardian_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ownership_mismatch_is_not_found() {
        let repo = setup_repo().await;
        repo.store_child(&child("child1", Some("guardian1"))).await.unwrap();

        assert!(repo.verify_child_ownership("guardian1", "child1").await.is_ok());

        let wrong_guardian = repo.verify_child_ownership("guardian2", "child1").await.unwrap_err();
        let missing_child = repo.verify_child_ownership("guardian1", "nobody").await.unwrap_err();
        for err in [wrong_guardian, missing_child] {
            assert!(matches!(
                err.downcast_ref::<SafetyError>(),
                Some(SafetyError::NotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_delete_child() {
        let repo = setup_repo().await;
        repo.store_child(&child("child1", Some("guardian1"))).await.unwrap();

        assert!(repo.delete_child("child1").await.unwrap());
        assert!(!repo.delete_child("child1").await.unwrap());
        assert!(repo.get_child("child1").await.unwrap().is_none());
    }
}
