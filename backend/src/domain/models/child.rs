use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The slice of a child's profile the safety core needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildProfile {
    pub id: String,
    pub guardian_id: Option<String>,
    pub display_name: String,
    pub age_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl ChildProfile {
    pub fn generate_id() -> String {
        format!("child::{}", Uuid::new_v4())
    }
}
