//! # Usage Monitor
//!
//! Derives daily screen time from the activity log and checks it against the
//! child's daily limit. Nothing here is cached; every query re-sums the log.
//!
//! Days are local calendar days. `day_bounds` converts a local date to the
//! inclusive UTC range the activity log is queried with.

use anyhow::Result;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::MonitoringConfig;
use crate::domain::alert_service::AlertService;
use crate::domain::commands::activity::{RecordActivityCommand, RecordActivityResult};
use crate::domain::errors::SafetyError;
use crate::domain::models::activity::{ActivityEvent, DailyUsage, TimeLimitStatus};
use crate::domain::notification::{notify_best_effort, NotificationOutcome};
use crate::domain::safety_rule_service::SafetyRuleService;
use crate::storage::traits::{ActivityLogStorage, ChildDirectory};
use shared::AlertType;

/// Longest single activity the log accepts
const MAX_ACTIVITY_SECONDS: u32 = 24 * 60 * 60;

#[derive(Clone)]
pub struct UsageMonitor {
    activity: Arc<dyn ActivityLogStorage>,
    safety_rules: SafetyRuleService,
    children: Arc<dyn ChildDirectory>,
    alerts: AlertService,
    config: MonitoringConfig,
}

impl UsageMonitor {
    pub fn new(
        activity: Arc<dyn ActivityLogStorage>,
        safety_rules: SafetyRuleService,
        children: Arc<dyn ChildDirectory>,
        alerts: AlertService,
        config: MonitoringConfig,
    ) -> Self {
        Self {
            activity,
            safety_rules,
            children,
            alerts,
            config,
        }
    }

    /// Whole minutes of activity on `date` (floor of total seconds / 60)
    pub async fn daily_minutes(&self, child_id: &str, date: NaiveDate) -> Result<u32> {
        let (start, end) = day_bounds(date);
        let events = self.activity.list_activity(child_id, start, end).await?;
        let seconds: u64 = events.iter().map(|e| u64::from(e.duration_seconds)).sum();
        Ok(u32::try_from(seconds / 60).unwrap_or(u32::MAX))
    }

    /// Today's usage against the child's limit
    pub async fn check_time_limit(&self, child_id: &str) -> Result<TimeLimitStatus> {
        let policy = self.safety_rules.effective_policy(child_id).await?;
        let limit_minutes = policy.daily_limit_minutes(self.config.default_daily_limit_minutes);
        let current_minutes = self.daily_minutes(child_id, Local::now().date_naive()).await?;

        let status = evaluate_limit(
            child_id,
            current_minutes,
            limit_minutes,
            self.config.warning_threshold_minutes,
        );
        debug!("Time limit status for {}: {:?}", child_id, status);
        Ok(status)
    }

    /// Per-day usage over the trailing `days` days (today included), most
    /// recent first. Days without activity are omitted.
    pub async fn usage_summary(&self, child_id: &str, days: u32) -> Result<Vec<DailyUsage>> {
        let days = days.clamp(1, self.config.usage_summary_max_days.max(1));
        let today = Local::now().date_naive();
        let first_day = today - Duration::days(i64::from(days) - 1);

        let (start, _) = day_bounds(first_day);
        let (_, end) = day_bounds(today);
        let events = self.activity.list_activity(child_id, start, end).await?;
        Ok(bucket_by_local_day(&events))
    }

    /// Append an activity event, then check the daily limit. When the limit
    /// is exceeded, the child's guardian gets at most one time-limit alert
    /// per day, best-effort. `status` is `None` when the check itself failed.
    pub async fn record_activity(&self, command: RecordActivityCommand) -> Result<RecordActivityResult> {
        if command.activity_type.trim().is_empty() {
            return Err(SafetyError::bad_request("activityType is required"));
        }
        if command.duration_seconds > MAX_ACTIVITY_SECONDS {
            return Err(SafetyError::bad_request(format!(
                "durationSeconds cannot exceed {}",
                MAX_ACTIVITY_SECONDS
            )));
        }
        if self.children.get_child(&command.child_id).await?.is_none() {
            return Err(SafetyError::not_found(format!("Child {}", command.child_id)));
        }

        let event = ActivityEvent {
            id: ActivityEvent::generate_id(),
            child_id: command.child_id,
            activity_type: command.activity_type.trim().to_string(),
            duration_seconds: command.duration_seconds,
            timestamp: command.timestamp.unwrap_or_else(Utc::now),
        };
        self.activity.record_activity(&event).await?;
        info!(
            "Recorded {}s of {} for child {}",
            event.duration_seconds, event.activity_type, event.child_id
        );

        // The event is committed; a failed limit check only degrades the result
        let (status, notification) = match self.check_time_limit(&event.child_id).await {
            Ok(status) if status.is_exceeded => {
                let notification = self.notify_limit_exceeded(&status).await;
                (Some(status), notification)
            }
            Ok(status) => (Some(status), NotificationOutcome::skipped("limit not exceeded")),
            Err(e) => {
                warn!(
                    "Recorded activity {} but could not check the daily limit for {}: {:#}",
                    event.id, event.child_id, e
                );
                (None, NotificationOutcome::skipped("limit check unavailable"))
            }
        };

        Ok(RecordActivityResult {
            activity: event,
            status,
            notification,
        })
    }

    async fn notify_limit_exceeded(&self, status: &TimeLimitStatus) -> NotificationOutcome {
        notify_best_effort("time limit", || async move {
            let policy = self.safety_rules.effective_policy(&status.child_id).await?;
            if !policy.alert_settings().time_limit_alerts {
                return Ok(NotificationOutcome::skipped("time limit alerts disabled"));
            }
            let Some(guardian_id) = self.children.get_guardian_id(&status.child_id).await? else {
                return Ok(NotificationOutcome::skipped("child has no guardian"));
            };

            let (start_of_today, _) = day_bounds(Local::now().date_naive());
            if self
                .alerts
                .has_alert_since(&guardian_id, &status.child_id, AlertType::TimeLimitExceeded, start_of_today)
                .await?
            {
                return Ok(NotificationOutcome::skipped("already alerted today"));
            }

            let alert = self.alerts.create_time_limit_alert(&guardian_id, status).await?;
            Ok(NotificationOutcome::Sent { alert_id: alert.id })
        })
        .await
    }
}

/// `remaining = max(0, limit - current)`, `exceeded = current >= limit`,
/// warn only while not exceeded and `remaining <= warning_threshold`
pub fn evaluate_limit(
    child_id: &str,
    current_minutes: u32,
    limit_minutes: u32,
    warning_threshold: u32,
) -> TimeLimitStatus {
    let remaining_minutes = limit_minutes.saturating_sub(current_minutes);
    let is_exceeded = current_minutes >= limit_minutes;
    TimeLimitStatus {
        child_id: child_id.to_string(),
        is_exceeded,
        current_minutes,
        limit_minutes,
        remaining_minutes,
        should_warn: !is_exceeded && remaining_minutes <= warning_threshold,
    }
}

/// Inclusive UTC bounds of the local calendar day `date`
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date);
    let next = local_midnight(date + Duration::days(1));
    (start, next - Duration::milliseconds(1))
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // midnight skipped by a DST jump
        None => Utc.from_utc_datetime(&naive),
    }
}

fn bucket_by_local_day(events: &[ActivityEvent]) -> Vec<DailyUsage> {
    let mut seconds_by_day: BTreeMap<NaiveDate, (u64, u32)> = BTreeMap::new();
    for event in events {
        let day = event.timestamp.with_timezone(&Local).date_naive();
        let entry = seconds_by_day.entry(day).or_insert((0, 0));
        entry.0 += u64::from(event.duration_seconds);
        entry.1 += 1;
    }

    seconds_by_day
        .into_iter()
        .rev()
        .map(|(date, (seconds, sessions))| DailyUsage {
            date,
            total_minutes: u32::try_from(seconds / 60).unwrap_or(u32::MAX),
            session_count: sessions,
        })
        .collect()
}
