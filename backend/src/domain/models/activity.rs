use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One append-only usage event from the activity log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEvent {
    pub id: String,
    pub child_id: String,
    pub activity_type: String,
    pub duration_seconds: u32,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn generate_id() -> String {
        format!("activity::{}", Uuid::new_v4())
    }
}

/// Usage for one calendar day. Derived on every query, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub total_minutes: u32,
    pub session_count: u32,
}

/// Result of checking a child's usage against the daily limit
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLimitStatus {
    pub child_id: String,
    pub is_exceeded: bool,
    pub current_minutes: u32,
    pub limit_minutes: u32,
    pub remaining_minutes: u32,
    pub should_warn: bool,
}
