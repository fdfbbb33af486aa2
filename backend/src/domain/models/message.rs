use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted direct or group message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub recipient_ids: Vec<String>,
    pub content: String,
    pub is_flagged: bool,
    pub flagged_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn generate_id() -> String {
        format!("message::{}", Uuid::new_v4())
    }

    /// Sender first, then recipients in request order
    pub fn participants(&self) -> Vec<&str> {
        std::iter::once(self.sender_id.as_str())
            .chain(self.recipient_ids.iter().map(String::as_str))
            .collect()
    }
}
