use chrono::Utc;
use shared::{
    SafetyRule as SharedSafetyRule, SafetyRuleResponse, TimeRestrictionStatus, UpsertSafetyRuleRequest,
};

use crate::domain::commands::safety_rules::{TimeRestrictionCheck, UpsertSafetyRuleCommand};
use crate::domain::models::format_timestamp;
use crate::domain::models::safety_rule::{EffectivePolicy, SafetyRule as DomainSafetyRule};

pub struct SafetyRuleMapper;

impl SafetyRuleMapper {
    pub fn to_upsert_command(guardian_id: String, request: UpsertSafetyRuleRequest) -> UpsertSafetyRuleCommand {
        UpsertSafetyRuleCommand {
            guardian_id,
            child_id: request.child_id,
            time_restrictions: request.time_restrictions,
            blocked_keywords: request.blocked_keywords,
            blocked_urls: request.blocked_urls,
            content_filters: request.content_filters,
            alert_settings: request.alert_settings,
        }
    }

    pub fn to_dto(domain: DomainSafetyRule) -> SharedSafetyRule {
        SharedSafetyRule {
            child_id: domain.child_id,
            guardian_id: domain.guardian_id,
            time_restrictions: domain.time_restrictions,
            blocked_keywords: domain.blocked_keywords.into_iter().collect(),
            blocked_urls: domain.blocked_urls.into_iter().collect(),
            content_filters: domain.content_filters,
            alert_settings: domain.alert_settings,
            created_at: format_timestamp(&domain.created_at),
            updated_at: format_timestamp(&domain.updated_at),
        }
    }

    /// A child without a stored rule is answered with a default-valued rule
    /// and `is_default = true`
    pub fn to_response(policy: EffectivePolicy, guardian_id: &str) -> SafetyRuleResponse {
        let is_default = policy.is_default();
        let rule = match policy.rule() {
            Some(rule) => rule.clone(),
            None => DomainSafetyRule::new(policy.child_id(), guardian_id, Utc::now()),
        };
        SafetyRuleResponse {
            rule: Self::to_dto(rule),
            is_default,
        }
    }

    pub fn to_time_status(check: TimeRestrictionCheck) -> TimeRestrictionStatus {
        TimeRestrictionStatus {
            allowed: check.allowed,
            reason: check.reason,
        }
    }
}
