pub mod activity;
pub mod alert;
pub mod child;
pub mod incident;
pub mod message;
pub mod safety_rule;

use chrono::{DateTime, SecondsFormat, Utc};

/// RFC 3339 in UTC with fixed millisecond precision, so stored timestamps
/// sort lexically in chronological order.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}
