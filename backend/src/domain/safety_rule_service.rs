//! Policy store operations and time-of-day window evaluation.

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDateTime, NaiveTime, Utc, Weekday};
use shared::TimeRestrictions;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::commands::safety_rules::{TimeRestrictionCheck, UpsertSafetyRuleCommand};
use crate::domain::errors::SafetyError;
use crate::domain::models::safety_rule::{EffectivePolicy, SafetyRule};
use crate::storage::traits::{ChildDirectory, SafetyRuleStorage};

const MAX_DAILY_MINUTES: u32 = 24 * 60;

#[derive(Clone)]
pub struct SafetyRuleService {
    rules: Arc<dyn SafetyRuleStorage>,
    children: Arc<dyn ChildDirectory>,
}

impl SafetyRuleService {
    pub fn new(rules: Arc<dyn SafetyRuleStorage>, children: Arc<dyn ChildDirectory>) -> Self {
        Self { rules, children }
    }

    /// The policy in force for a child; unrestricted when no rule is stored
    pub async fn effective_policy(&self, child_id: &str) -> Result<EffectivePolicy> {
        let rule = self.rules.get_rule(child_id).await?;
        Ok(EffectivePolicy::from_optional(child_id, rule))
    }

    /// Guardian-scoped read
    pub async fn get_rule(&self, guardian_id: &str, child_id: &str) -> Result<EffectivePolicy> {
        self.children.verify_child_ownership(guardian_id, child_id).await?;
        self.effective_policy(child_id).await
    }

    /// Create the rule set if absent, otherwise merge the supplied fields into it
    pub async fn upsert_rule(&self, command: UpsertSafetyRuleCommand) -> Result<SafetyRule> {
        info!(
            "Upserting safety rule for child {} by guardian {}",
            command.child_id, command.guardian_id
        );
        if command.child_id.trim().is_empty() {
            return Err(SafetyError::bad_request("childId is required"));
        }
        self.children
            .verify_child_ownership(&command.guardian_id, &command.child_id)
            .await?;
        if let Some(restrictions) = &command.time_restrictions {
            validate_time_restrictions(restrictions)?;
        }

        let now = Utc::now();
        let mut rule = match self.rules.get_rule(&command.child_id).await? {
            Some(existing) => existing,
            None => SafetyRule::new(&command.child_id, &command.guardian_id, now),
        };

        if let Some(time_restrictions) = command.time_restrictions {
            rule.time_restrictions = time_restrictions;
        }
        if let Some(keywords) = command.blocked_keywords {
            rule.blocked_keywords = SafetyRule::normalize_terms(keywords);
        }
        if let Some(urls) = command.blocked_urls {
            rule.blocked_urls = SafetyRule::normalize_terms(urls);
        }
        if let Some(content_filters) = command.content_filters {
            rule.content_filters = content_filters;
        }
        if let Some(alert_settings) = command.alert_settings {
            rule.alert_settings = alert_settings;
        }
        rule.updated_at = now;

        self.rules.upsert_rule(&rule).await?;
        debug!(
            "Stored rule for child {}: {} keywords, {} urls",
            rule.child_id,
            rule.blocked_keywords.len(),
            rule.blocked_urls.len()
        );
        Ok(rule)
    }

    /// Remove a child's rule set, returning the child to the unrestricted default
    pub async fn delete_rule(&self, child_id: &str) -> Result<bool> {
        let deleted = self.rules.delete_rule(child_id).await?;
        if deleted {
            info!("Deleted safety rule for child {}", child_id);
        }
        Ok(deleted)
    }

    /// Whether the child may use the product right now
    pub async fn check_time_restriction(&self, child_id: &str) -> Result<TimeRestrictionCheck> {
        let policy = self.effective_policy(child_id).await?;
        let check = evaluate_time_window(&policy, Local::now().naive_local());
        debug!("Time restriction check for {}: {:?}", child_id, check);
        Ok(check)
    }
}

/// Evaluate the policy's time window at local time `now`. Saturday and
/// Sunday use the weekend window.
pub fn evaluate_time_window(policy: &EffectivePolicy, now: NaiveDateTime) -> TimeRestrictionCheck {
    let Some(restrictions) = policy.active_time_restrictions() else {
        return TimeRestrictionCheck::allowed();
    };

    let is_weekend = matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
    let (start, end, day_kind) = if is_weekend {
        (&restrictions.weekend_start, &restrictions.weekend_end, "weekends")
    } else {
        (&restrictions.weekday_start, &restrictions.weekday_end, "weekdays")
    };

    // zero-padded 24h strings order the same way as the times they encode
    let current = now.format("%H:%M").to_string();
    if current.as_str() >= start.as_str() && current.as_str() <= end.as_str() {
        TimeRestrictionCheck::allowed()
    } else {
        TimeRestrictionCheck {
            allowed: false,
            reason: Some(format!(
                "Access is only allowed between {} and {} on {}",
                start, end, day_kind
            )),
        }
    }
}

fn validate_time_restrictions(restrictions: &TimeRestrictions) -> Result<()> {
    for (label, start, end) in [
        ("weekday", &restrictions.weekday_start, &restrictions.weekday_end),
        ("weekend", &restrictions.weekend_start, &restrictions.weekend_end),
    ] {
        validate_clock_time(start)?;
        validate_clock_time(end)?;
        if start > end {
            return Err(SafetyError::bad_request(format!(
                "The {} window starts ({}) after it ends ({})",
                label, start, end
            )));
        }
    }

    if let Some(minutes) = restrictions.max_daily_minutes {
        if minutes > MAX_DAILY_MINUTES {
            return Err(SafetyError::bad_request(format!(
                "maxDailyMinutes cannot exceed {}",
                MAX_DAILY_MINUTES
            )));
        }
    }
    Ok(())
}

/// Times must be zero-padded "HH:MM"
fn validate_clock_time(value: &str) -> Result<()> {
    if value.len() != 5 || NaiveTime::parse_from_str(value, "%H:%M").is_err() {
        return Err(SafetyError::bad_request(format!(
            "Invalid time '{}', expected HH:MM",
            value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::child::ChildProfile;
    use crate::storage::{ChildRepository, DbConnection, SafetyRuleRepository};
    use chrono::NaiveDate;
    use shared::AlertSettings;

    async fn setup() -> (SafetyRuleService, Arc<ChildRepository>) {
        let db = DbConnection::init_test().await.unwrap();
        let children = Arc::new(ChildRepository::new(db.clone()));
        children
            .store_child(&ChildProfile {
                id: "child1".to_string(),
                guardian_id: Some("guardian1".to_string()),
                display_name: "Ada".to_string(),
                age_verified: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = SafetyRuleService::new(Arc::new(SafetyRuleRepository::new(db)), children.clone());
        (service, children)
    }

    fn command(child_id: &str) -> UpsertSafetyRuleCommand {
        UpsertSafetyRuleCommand {
            guardian_id: "guardian1".to_string(),
            child_id: child_id.to_string(),
            ..Default::default()
        }
    }

    fn restricted_policy() -> EffectivePolicy {
        let mut rule = SafetyRule::new("child1", "guardian1", Utc::now());
        rule.time_restrictions = TimeRestrictions {
            enabled: true,
            weekday_start: "07:00".to_string(),
            weekday_end: "20:00".to_string(),
            weekend_start: "09:00".to_string(),
            weekend_end: "21:30".to_string(),
            max_daily_minutes: None,
        };
        EffectivePolicy::configured(rule)
    }

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_rule_is_unrestricted_default() {
        let (service, _) = setup().await;
        let policy = service.get_rule("guardian1", "child1").await.unwrap();
        assert!(policy.is_default());
        assert!(service.check_time_restriction("child1").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_get_rule_for_foreign_child_is_not_found() {
        let (service, _) = setup().await;
        let err = service.get_rule("guardian2", "child1").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<SafetyError>(), Some(SafetyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let (service, _) = setup().await;

        let created = service
            .upsert_rule(UpsertSafetyRuleCommand {
                blocked_keywords: Some(vec![" bully ".to_string(), "".to_string()]),
                ..command("child1")
            })
            .await
            .unwrap();
        assert_eq!(created.blocked_keywords.iter().collect::<Vec<_>>(), vec!["bully"]);
        assert!(created.alert_settings.threat_alerts);

        let merged = service
            .upsert_rule(UpsertSafetyRuleCommand {
                alert_settings: Some(AlertSettings {
                    threat_alerts: true,
                    time_limit_alerts: false,
                    blocked_content_alerts: true,
                }),
                ..command("child1")
            })
            .await
            .unwrap();
        // untouched fields survive the merge
        assert_eq!(merged.blocked_keywords.len(), 1);
        assert!(!merged.alert_settings.time_limit_alerts);
        assert_eq!(merged.created_at, created.created_at);

        let policy = service.effective_policy("child1").await.unwrap();
        assert!(!policy.is_default());
        assert_eq!(policy.rule(), Some(&merged));
    }

    #[tokio::test]
    async fn test_upsert_rejects_malformed_times() {
        let (service, _) = setup().await;
        for (start, end) in [("7:00", "20:00"), ("07:00", "25:00"), ("21:00", "07:00")] {
            let mut restrictions = TimeRestrictions::default();
            restrictions.weekday_start = start.to_string();
            restrictions.weekday_end = end.to_string();
            let err = service
                .upsert_rule(UpsertSafetyRuleCommand {
                    time_restrictions: Some(restrictions),
                    ..command("child1")
                })
                .await
                .unwrap_err();
            assert!(
                matches!(err.downcast_ref::<SafetyError>(), Some(SafetyError::BadRequest(_))),
                "{} - {} should be rejected",
                start,
                end
            );
        }
    }

    #[tokio::test]
    async fn test_upsert_for_foreign_child_is_not_found() {
        let (service, _) = setup().await;
        let err = service
            .upsert_rule(UpsertSafetyRuleCommand {
                guardian_id: "guardian2".to_string(),
                ..command("child1")
            })
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<SafetyError>(), Some(SafetyError::NotFound(_))));
        assert!(service.effective_policy("child1").await.unwrap().is_default());
    }

    #[tokio::test]
    async fn test_delete_rule_restores_default() {
        let (service, _) = setup().await;
        service.upsert_rule(command("child1")).await.unwrap();
        assert!(service.delete_rule("child1").await.unwrap());
        assert!(!service.delete_rule("child1").await.unwrap());
        assert!(service.effective_policy("child1").await.unwrap().is_default());
    }

    #[test]
    fn test_weekday_window_is_inclusive() {
        let policy = restricted_policy();
        // 2025-03-12 is a Wednesday
        assert!(evaluate_time_window(&policy, at(2025, 3, 12, 7, 0)).allowed);
        assert!(evaluate_time_window(&policy, at(2025, 3, 12, 20, 0)).allowed);

        let late = evaluate_time_window(&policy, at(2025, 3, 12, 20, 1));
        assert!(!late.allowed);
        assert_eq!(
            late.reason.as_deref(),
            Some("Access is only allowed between 07:00 and 20:00 on weekdays")
        );
        assert!(!evaluate_time_window(&policy, at(2025, 3, 12, 6, 59)).allowed);
    }

    #[test]
    fn test_weekend_uses_weekend_window() {
        let policy = restricted_policy();
        // 2025-03-15 is a Saturday, 2025-03-16 a Sunday
        assert!(!evaluate_time_window(&policy, at(2025, 3, 15, 8, 0)).allowed);
        assert!(evaluate_time_window(&policy, at(2025, 3, 16, 21, 15)).allowed);
        let reason = evaluate_time_window(&policy, at(2025, 3, 16, 22, 0)).reason.unwrap();
        assert!(reason.contains("weekends"));
    }

    #[test]
    fn test_disabled_or_missing_restrictions_always_allow() {
        let unrestricted = EffectivePolicy::unrestricted("child1");
        assert!(evaluate_time_window(&unrestricted, at(2025, 3, 12, 3, 0)).allowed);

        let mut rule = SafetyRule::new("child1", "guardian1", Utc::now());
        rule.time_restrictions.enabled = false;
        let disabled = EffectivePolicy::configured(rule);
        assert!(evaluate_time_window(&disabled, at(2025, 3, 12, 3, 0)).allowed);
    }
}
