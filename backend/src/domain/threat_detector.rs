//! # Threat Detector
//!
//! Classifies content against the categorised lexicon unioned with the
//! child's own blocked keywords. A hit records one `ThreatIncident` for the
//! child, returns an educational intervention for immediate display, and
//! then notifies the child's guardian.
//!
//! ## Two phases
//!
//! 1. **Commit**: the incident is persisted. A failure here is the caller's
//!    error.
//! 2. **Notify**: the `threat_alerts` setting, guardian lookup, alert creation and the `parent_notified`
//!    flag update run through `notify_best_effort`. A failure here is logged
//!    and reported in the returned `NotificationOutcome`; the incident stays.
//!
//! Confidence is `min(100, floor(matched / total * 100 + 50))` where `total`
//! counts every built-in term plus the child's custom keywords, so any match
//! scores at least 50.

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Value};
use shared::{IncidentStatus, ThreatSeverity};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::alert_service::AlertService;
use crate::domain::commands::threats::ThreatAnalysis;
use crate::domain::lexicon::{ThreatLexicon, CUSTOM_KEYWORD_CATEGORY};
use crate::domain::models::incident::ThreatIncident;
use crate::domain::models::safety_rule::EffectivePolicy;
use crate::domain::notification::{notify_best_effort, NotificationOutcome};
use crate::domain::safety_rule_service::SafetyRuleService;
use crate::storage::traits::{ChildDirectory, IncidentStorage};

/// What a scan found, before anything is persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatScan {
    pub threat_type: String,
    pub severity: ThreatSeverity,
    pub confidence: u8,
    pub detected_keywords: Vec<String>,
}

#[derive(Clone)]
pub struct ThreatDetector {
    lexicon: Arc<ThreatLexicon>,
    safety_rules: SafetyRuleService,
    incidents: Arc<dyn IncidentStorage>,
    children: Arc<dyn ChildDirectory>,
    alerts: AlertService,
    excerpt_chars: usize,
}

impl ThreatDetector {
    pub fn new(
        lexicon: Arc<ThreatLexicon>,
        safety_rules: SafetyRuleService,
        incidents: Arc<dyn IncidentStorage>,
        children: Arc<dyn ChildDirectory>,
        alerts: AlertService,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            lexicon,
            safety_rules,
            incidents,
            children,
            alerts,
            excerpt_chars,
        }
    }

    pub fn lexicon(&self) -> &ThreatLexicon {
        &self.lexicon
    }

    /// Side-effect free classification of `content` under `policy`
    pub fn scan(&self, content: &str, policy: &EffectivePolicy) -> Option<ThreatScan> {
        self.scan_with_keywords(content, policy, &[])
    }

    /// Like [`scan`](Self::scan), with `extra_keywords` unioned into the
    /// policy's blocked keywords (case-insensitively) for this call only
    pub fn scan_with_keywords(
        &self,
        content: &str,
        policy: &EffectivePolicy,
        extra_keywords: &[String],
    ) -> Option<ThreatScan> {
        let built_in = self.lexicon.scan(content);

        let mut keywords: Vec<&str> = policy.blocked_keywords().collect();
        for extra in extra_keywords {
            if !keywords.iter().any(|k| k.eq_ignore_ascii_case(extra)) {
                keywords.push(extra.as_str());
            }
        }

        let haystack = content.to_lowercase();
        let custom: Vec<&str> = keywords
            .iter()
            .copied()
            .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
            .collect();

        if built_in.is_none() && custom.is_empty() {
            return None;
        }

        let (threat_type, severity, mut detected_keywords) = match built_in {
            Some(found) => (found.first_category, found.severity, found.terms),
            None => (CUSTOM_KEYWORD_CATEGORY.to_string(), ThreatSeverity::Low, Vec::new()),
        };
        for keyword in custom {
            if !detected_keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
                detected_keywords.push(keyword.to_string());
            }
        }

        let total_terms = self.lexicon.term_count() + keywords.len();
        Some(ThreatScan {
            threat_type,
            severity,
            confidence: compute_confidence(detected_keywords.len(), total_terms),
            detected_keywords,
        })
    }

    /// Analyze content attributed to `child_id`. `context` is copied into the
    /// incident alongside the truncated original content. Returns `None`
    /// (and does nothing) when nothing matched.
    pub async fn analyze(
        &self,
        child_id: &str,
        content: &str,
        context: BTreeMap<String, Value>,
    ) -> Result<Option<ThreatAnalysis>> {
        self.analyze_exchange(child_id, content, context, &[]).await
    }

    /// Analyze one participant's side of an exchange. `extra_keywords` are
    /// the keywords that flagged the exchange elsewhere (the sender's), so
    /// every participant is checked against the same trigger as well as
    /// their own rule.
    pub async fn analyze_exchange(
        &self,
        child_id: &str,
        content: &str,
        context: BTreeMap<String, Value>,
        extra_keywords: &[String],
    ) -> Result<Option<ThreatAnalysis>> {
        let policy = self.safety_rules.effective_policy(child_id).await?;
        let Some(scan) = self.scan_with_keywords(content, &policy, extra_keywords) else {
            debug!("No threat detected for child {}", child_id);
            return Ok(None);
        };

        let mut incident = ThreatIncident {
            id: ThreatIncident::generate_id(),
            child_id: child_id.to_string(),
            threat_type: scan.threat_type,
            severity: scan.severity,
            confidence: scan.confidence,
            detected_keywords: scan.detected_keywords,
            context,
            status: IncidentStatus::Open,
            parent_notified: false,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            created_at: Utc::now(),
        };
        incident
            .context
            .insert("originalContent".to_string(), json!(truncate_chars(content, self.excerpt_chars)));

        self.incidents.store_incident(&incident).await?;
        info!(
            "Recorded {} incident {} for child {} ({} severity, {}% confidence)",
            incident.threat_type, incident.id, child_id, incident.severity, incident.confidence
        );

        let intervention = self.lexicon.intervention_for(&incident.threat_type);
        let notification = self.notify_guardian(&mut incident).await;

        Ok(Some(ThreatAnalysis {
            incident,
            intervention,
            notification,
        }))
    }

    async fn notify_guardian(&self, incident: &mut ThreatIncident) -> NotificationOutcome {
        let committed: &ThreatIncident = incident;
        let outcome = notify_best_effort("threat", || async move {
            let policy = self.safety_rules.effective_policy(&committed.child_id).await?;
            if !policy.alert_settings().threat_alerts {
                return Ok(NotificationOutcome::skipped("threat alerts disabled"));
            }
            let Some(guardian_id) = self.children.get_guardian_id(&committed.child_id).await? else {
                return Ok(NotificationOutcome::skipped("child has no guardian"));
            };
            let alert = self.alerts.create_threat_alert(committed, &guardian_id).await?;
            Ok(NotificationOutcome::Sent { alert_id: alert.id })
        })
        .await;

        if outcome.is_sent() {
            incident.parent_notified = true;
            if let Err(e) = self.incidents.update_incident(incident).await {
                warn!(
                    "Alert sent but failed to mark incident {} as notified: {:#}",
                    incident.id, e
                );
            }
        }
        outcome
    }
}

/// Any match scores at least 50; saturates at 100
pub fn compute_confidence(matched: usize, total_terms: usize) -> u8 {
    if matched == 0 {
        return 0;
    }
    let total = total_terms.max(matched) as f64;
    let score = (matched as f64 / total * 100.0 + 50.0).floor();
    score.min(100.0) as u8
}

fn truncate_chars(content: &str, max_chars: usize) -> String {
    content.chars().take(max_chars).collect()
}
