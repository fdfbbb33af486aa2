use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AlertSettings, ContentFilters, TimeRestrictions};
use std::collections::BTreeSet;

/// Per-child safety configuration, owned by the child's guardian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyRule {
    pub child_id: String,
    pub guardian_id: String,
    pub time_restrictions: TimeRestrictions,
    pub blocked_keywords: BTreeSet<String>,
    pub blocked_urls: BTreeSet<String>,
    /// Stored and returned for clients to apply; no backend check reads it
    pub content_filters: ContentFilters,
    pub alert_settings: AlertSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SafetyRule {
    /// A fresh rule set with default bundles and empty block lists
    pub fn new(child_id: &str, guardian_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            child_id: child_id.to_string(),
            guardian_id: guardian_id.to_string(),
            time_restrictions: TimeRestrictions::default(),
            blocked_keywords: BTreeSet::new(),
            blocked_urls: BTreeSet::new(),
            content_filters: ContentFilters::default(),
            alert_settings: AlertSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Trim entries and drop blanks
    pub fn normalize_terms<I: IntoIterator<Item = String>>(terms: I) -> BTreeSet<String> {
        terms
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// The policy in force for a child. A child without a stored rule is
/// unrestricted: every accessor below answers as if nothing were configured.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectivePolicy {
    child_id: String,
    rule: Option<SafetyRule>,
}

impl EffectivePolicy {
    pub fn configured(rule: SafetyRule) -> Self {
        Self {
            child_id: rule.child_id.clone(),
            rule: Some(rule),
        }
    }

    pub fn unrestricted(child_id: &str) -> Self {
        Self {
            child_id: child_id.to_string(),
            rule: None,
        }
    }

    pub fn from_optional(child_id: &str, rule: Option<SafetyRule>) -> Self {
        match rule {
            Some(rule) => Self::configured(rule),
            None => Self::unrestricted(child_id),
        }
    }

    pub fn child_id(&self) -> &str {
        &self.child_id
    }

    pub fn is_default(&self) -> bool {
        self.rule.is_none()
    }

    pub fn rule(&self) -> Option<&SafetyRule> {
        self.rule.as_ref()
    }

    pub fn blocked_keywords(&self) -> impl Iterator<Item = &str> {
        self.rule
            .iter()
            .flat_map(|r| r.blocked_keywords.iter().map(String::as_str))
    }

    pub fn blocked_urls(&self) -> impl Iterator<Item = &str> {
        self.rule
            .iter()
            .flat_map(|r| r.blocked_urls.iter().map(String::as_str))
    }

    pub fn custom_keyword_count(&self) -> usize {
        self.rule.as_ref().map_or(0, |r| r.blocked_keywords.len())
    }

    /// Time windows, only when configured and enabled
    pub fn active_time_restrictions(&self) -> Option<&TimeRestrictions> {
        self.rule
            .as_ref()
            .map(|r| &r.time_restrictions)
            .filter(|t| t.enabled)
    }

    /// Daily limit, falling back to `default_minutes` when unset
    pub fn daily_limit_minutes(&self, default_minutes: u32) -> u32 {
        self.rule
            .as_ref()
            .and_then(|r| r.time_restrictions.max_daily_minutes)
            .unwrap_or(default_minutes)
    }

    pub fn alert_settings(&self) -> AlertSettings {
        self.rule
            .as_ref()
            .map(|r| r.alert_settings.clone())
            .unwrap_or_default()
    }
}
