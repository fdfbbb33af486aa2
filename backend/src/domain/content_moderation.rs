//! # Content Moderation Gate
//!
//! Fast keyword and URL check of outbound content against a child's own
//! block lists. `evaluate` is advisory and side-effect free; callers decide
//! whether to reject, flag or report.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::alert_service::AlertService;
use crate::domain::commands::moderation::ModerationDecision;
use crate::domain::models::safety_rule::EffectivePolicy;
use crate::domain::notification::{notify_best_effort, NotificationOutcome};
use crate::domain::safety_rule_service::SafetyRuleService;
use crate::storage::traits::ChildDirectory;

#[derive(Clone)]
pub struct ContentModerationGate {
    safety_rules: SafetyRuleService,
    children: Arc<dyn ChildDirectory>,
    alerts: AlertService,
}

impl ContentModerationGate {
    pub fn new(safety_rules: SafetyRuleService, children: Arc<dyn ChildDirectory>, alerts: AlertService) -> Self {
        Self {
            safety_rules,
            children,
            alerts,
        }
    }

    /// Evaluate content (and optionally a URL) against the child's policy
    pub async fn evaluate(&self, child_id: &str, content: &str, url: Option<&str>) -> Result<ModerationDecision> {
        let policy = self.safety_rules.effective_policy(child_id).await?;
        let decision = evaluate_policy(&policy, content, url);
        debug!("Moderation decision for {}: {:?}", child_id, decision);
        Ok(decision)
    }

    /// `evaluate`, then tell the child's guardian when content was blocked
    /// and their alert settings ask for it.
    pub async fn check_content(
        &self,
        child_id: &str,
        content: &str,
        url: Option<&str>,
    ) -> Result<(ModerationDecision, NotificationOutcome)> {
        let policy = self.safety_rules.effective_policy(child_id).await?;
        let decision = evaluate_policy(&policy, content, url);

        let Some(reason) = decision.reason.clone().filter(|_| decision.blocked) else {
            return Ok((decision, NotificationOutcome::skipped("content allowed")));
        };
        info!("Blocked content for child {}: {}", child_id, reason);

        if !policy.alert_settings().blocked_content_alerts {
            return Ok((decision, NotificationOutcome::skipped("blocked content alerts disabled")));
        }

        let outcome = self.report_blocked_content(child_id, &reason).await;
        Ok((decision, outcome))
    }

    /// Best-effort `blocked_content` alert to the child's guardian
    pub async fn report_blocked_content(&self, child_id: &str, reason: &str) -> NotificationOutcome {
        notify_best_effort("blocked content", || async move {
            match self.children.get_guardian_id(child_id).await? {
                Some(guardian_id) => {
                    let alert = self
                        .alerts
                        .create_blocked_content_alert(&guardian_id, child_id, reason)
                        .await?;
                    Ok(NotificationOutcome::Sent { alert_id: alert.id })
                }
                None => Ok(NotificationOutcome::skipped("child has no guardian")),
            }
        })
        .await
    }
}

/// Keywords match case-insensitively, URLs case-sensitively; URLs are only
/// checked when no keyword blocked. First match wins in both passes.
pub fn evaluate_policy(policy: &EffectivePolicy, content: &str, url: Option<&str>) -> ModerationDecision {
    let haystack = content.to_lowercase();
    if let Some(keyword) = policy
        .blocked_keywords()
        .find(|keyword| haystack.contains(&keyword.to_lowercase()))
    {
        return ModerationDecision::blocked(format!("Blocked keyword detected: {}", keyword));
    }

    if let Some(url) = url {
        if let Some(blocked) = policy.blocked_urls().find(|blocked| url.contains(*blocked)) {
            return ModerationDecision::blocked(format!("Blocked URL detected: {}", blocked));
        }
    }

    ModerationDecision::allowed()
}
