use anyhow::{Context, Result};
use shared::{
    ActivityEvent as SharedActivity, DailyUsage as SharedDailyUsage, RecordActivityRequest, ScreenTimeStatus,
    UsageSummaryResponse,
};

use crate::domain::commands::activity::RecordActivityCommand;
use crate::domain::models::activity::{ActivityEvent as DomainActivity, DailyUsage as DomainDailyUsage, TimeLimitStatus};
use crate::domain::models::{format_timestamp, parse_timestamp};

pub struct ActivityMapper;

impl ActivityMapper {
    pub fn to_record_command(request: RecordActivityRequest) -> Result<RecordActivityCommand> {
        let timestamp = request
            .timestamp
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("timestamp must be an RFC 3339 date-time")?;

        Ok(RecordActivityCommand {
            child_id: request.child_id,
            activity_type: request.activity_type,
            duration_seconds: request.duration_seconds,
            timestamp,
        })
    }

    pub fn to_activity_dto(domain: DomainActivity) -> SharedActivity {
        SharedActivity {
            id: domain.id,
            child_id: domain.child_id,
            activity_type: domain.activity_type,
            duration_seconds: domain.duration_seconds,
            timestamp: format_timestamp(&domain.timestamp),
        }
    }

    pub fn to_screen_time_dto(status: TimeLimitStatus) -> ScreenTimeStatus {
        ScreenTimeStatus {
            child_id: status.child_id,
            is_exceeded: status.is_exceeded,
            current_minutes: status.current_minutes,
            limit_minutes: status.limit_minutes,
            remaining_minutes: status.remaining_minutes,
            should_warn: status.should_warn,
        }
    }

    pub fn to_summary_dto(child_id: String, days: Vec<DomainDailyUsage>) -> UsageSummaryResponse {
        UsageSummaryResponse {
            child_id,
            days: days
                .into_iter()
                .map(|day| SharedDailyUsage {
                    date: day.date.format("%Y-%m-%d").to_string(),
                    total_minutes: day.total_minutes,
                    session_count: day.session_count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(timestamp: Option<&str>) -> RecordActivityRequest {
        RecordActivityRequest {
            child_id: "child1".to_string(),
            activity_type: "reading".to_string(),
            duration_seconds: 300,
            timestamp: timestamp.map(str::to_string),
        }
    }

    #[test]
    fn test_record_command_parses_timestamp() {
        let command = ActivityMapper::to_record_command(request(Some("2025-03-09T07:05:00Z"))).unwrap();
        assert_eq!(
            command.timestamp.map(|t| format_timestamp(&t)).as_deref(),
            Some("2025-03-09T07:05:00.000Z")
        );
        assert!(ActivityMapper::to_record_command(request(None)).unwrap().timestamp.is_none());
        assert!(ActivityMapper::to_record_command(request(Some("yesterday"))).is_err());
    }
}
