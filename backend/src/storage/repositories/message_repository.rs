use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use crate::domain::models::message::ChatMessage;
use crate::domain::models::{format_timestamp, parse_timestamp};
use crate::storage::connection::DbConnection;
use crate::storage::traits::MessageStorage;

/// Repository for persisted chat messages
#[derive(Clone)]
pub struct MessageRepository {
    db: DbConnection,
}

impl MessageRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn map_row(row: &SqliteRow) -> Result<ChatMessage> {
        Ok(ChatMessage {
            id: row.get("id"),
            sender_id: row.get("sender_id"),
            recipient_ids: serde_json::from_str(row.get("recipient_ids"))?,
            content: row.get("content"),
            is_flagged: row.get("is_flagged"),
            flagged_reason: row.get("flagged_reason"),
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

#[async_trait]
impl MessageStorage for MessageRepository {
    async fn store_message(&self, message: &ChatMessage) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, recipient_ids, content, is_flagged, flagged_reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.sender_id)
        .bind(serde_json::to_string(&message.recipient_ids)?)
        .bind(&message.content)
        .bind(message.is_flagged)
        .bind(&message.flagged_reason)
        .bind(format_timestamp(&message.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_message(&self, message_id: &str) -> Result<Option<ChatMessage>> {
        let row = sqlx::query(
            r#"
            SELECT id, sender_id, recipient_ids, content, is_flagged, flagged_reason, created_at
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_store_and_get_message() {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        let repo = MessageRepository::new(db);

        let message = ChatMessage {
            id: ChatMessage::generate_id(),
            sender_id: "child1".to_string(),
            recipient_ids: vec!["child2".to_string(), "child3".to_string()],
            content: "hello".to_string(),
            is_flagged: true,
            flagged_reason: Some("Blocked keyword detected: hello".to_string()),
            created_at: Utc::now(),
        };
        repo.store_message(&message).await.unwrap();

        let loaded = repo.get_message(&message.id).await.unwrap().unwrap();
        assert_eq!(loaded.recipient_ids, vec!["child2", "child3"]);
        assert!(loaded.is_flagged);
        assert_eq!(loaded.flagged_reason, message.flagged_reason);
        assert!(repo.get_message("message::missing").await.unwrap().is_none());
    }
}
