//! # Messaging Service
//!
//! The send path for direct and group messages:
//!
//! 1. Validate content and participants (every participant must exist and be
//!    age verified).
//! 2. Screen the content with the moderation gate (sender's block lists) and
//!    a lexicon pre-scan. Screening failures degrade to "not flagged".
//! 3. Persist the message with its flag. This is the only step whose failure
//!    reaches the sender.
//! 4. If flagged, run the threat detector once per participant so every child
//!    gets their own incident and their own guardian notification. Each
//!    participant is checked against their own rule plus the sender's
//!    blocked keywords, since those are what flagged the exchange.
//! 5. If the gate blocked the content and the sender's guardian was not
//!    already alerted about it, send a best-effort blocked-content alert.

use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use shared::EducationalIntervention;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::commands::messaging::{SendMessageCommand, SendMessageResult};
use crate::domain::content_moderation::{evaluate_policy, ContentModerationGate};
use crate::domain::errors::SafetyError;
use crate::domain::models::message::ChatMessage;
use crate::domain::models::safety_rule::EffectivePolicy;
use crate::domain::safety_rule_service::SafetyRuleService;
use crate::domain::threat_detector::ThreatDetector;
use crate::storage::traits::{ChildDirectory, MessageStorage};

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Outcome of screening, before the message is stored
struct Screening {
    policy: EffectivePolicy,
    blocked_reason: Option<String>,
    flagged_reason: Option<String>,
}

#[derive(Clone)]
pub struct MessagingService {
    messages: Arc<dyn MessageStorage>,
    children: Arc<dyn ChildDirectory>,
    safety_rules: SafetyRuleService,
    moderation: ContentModerationGate,
    detector: ThreatDetector,
}

impl MessagingService {
    pub fn new(
        messages: Arc<dyn MessageStorage>,
        children: Arc<dyn ChildDirectory>,
        safety_rules: SafetyRuleService,
        moderation: ContentModerationGate,
        detector: ThreatDetector,
    ) -> Self {
        Self {
            messages,
            children,
            safety_rules,
            moderation,
            detector,
        }
    }

    pub async fn send_message(&self, command: SendMessageCommand) -> Result<SendMessageResult> {
        let content = command.content.trim().to_string();
        if content.is_empty() {
            return Err(SafetyError::bad_request("Message content cannot be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(SafetyError::bad_request(format!(
                "Message content cannot exceed {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let sender_id = command.sender_id.trim().to_string();
        let recipient_ids = normalize_recipients(&sender_id, command.recipient_ids)?;
        for participant in std::iter::once(&sender_id).chain(recipient_ids.iter()) {
            self.verify_participant(participant).await?;
        }

        let screening = self.screen(&sender_id, &content).await;
        let message = ChatMessage {
            id: ChatMessage::generate_id(),
            sender_id,
            recipient_ids,
            content,
            is_flagged: screening.flagged_reason.is_some(),
            flagged_reason: screening.flagged_reason.clone(),
            created_at: Utc::now(),
        };
        self.messages.store_message(&message).await?;
        info!(
            "Stored message {} from {} to {} recipient(s), flagged: {}",
            message.id,
            message.sender_id,
            message.recipient_ids.len(),
            message.is_flagged
        );

        if !message.is_flagged {
            return Ok(SendMessageResult {
                message,
                intervention: None,
                incident_ids: Vec::new(),
            });
        }

        let exchange_keywords: Vec<String> = screening.policy.blocked_keywords().map(str::to_string).collect();
        let (intervention, incident_ids, sender_alerted) =
            self.analyze_participants(&message, &exchange_keywords).await;

        if let Some(reason) = &screening.blocked_reason {
            if !sender_alerted && screening.policy.alert_settings().blocked_content_alerts {
                self.moderation
                    .report_blocked_content(&message.sender_id, reason)
                    .await;
            }
        }

        Ok(SendMessageResult {
            message,
            intervention,
            incident_ids,
        })
    }

    async fn verify_participant(&self, child_id: &str) -> Result<()> {
        let child = self
            .children
            .get_child(child_id)
            .await?
            .ok_or_else(|| SafetyError::not_found(format!("Child {}", child_id)))?;
        if !child.age_verified {
            return Err(SafetyError::bad_request(format!(
                "Child {} has not completed age verification",
                child_id
            )));
        }
        Ok(())
    }

    async fn screen(&self, sender_id: &str, content: &str) -> Screening {
        let policy = match self.safety_rules.effective_policy(sender_id).await {
            Ok(policy) => policy,
            Err(e) => {
                warn!("Could not load policy for {}, screening without it: {:#}", sender_id, e);
                EffectivePolicy::unrestricted(sender_id)
            }
        };

        let decision = evaluate_policy(&policy, content, None);
        let blocked_reason = decision.reason.filter(|_| decision.blocked);
        let flagged_reason = blocked_reason.clone().or_else(|| {
            self.detector
                .scan(content, &policy)
                .map(|scan| format!("Potential {} detected", scan.threat_type.replace('_', " ")))
        });

        Screening {
            policy,
            blocked_reason,
            flagged_reason,
        }
    }

    /// One analysis per participant. Returns the sender's intervention, the
    /// recorded incident ids and whether the sender's guardian was alerted.
    async fn analyze_participants(
        &self,
        message: &ChatMessage,
        exchange_keywords: &[String],
    ) -> (Option<EducationalIntervention>, Vec<String>, bool) {
        let participants = message.participants();
        let mut intervention = None;
        let mut incident_ids = Vec::new();
        let mut sender_alerted = false;

        for (index, participant) in participants.iter().enumerate() {
            let is_sender = index == 0;
            let counterparts: Vec<&str> = participants
                .iter()
                .filter(|other| *other != participant)
                .copied()
                .collect();

            let mut context = BTreeMap::new();
            context.insert("source".to_string(), json!("chat_message"));
            context.insert("messageId".to_string(), json!(message.id));
            context.insert("role".to_string(), json!(if is_sender { "sender" } else { "recipient" }));
            context.insert("counterpartIds".to_string(), json!(counterparts));

            match self
                .detector
                .analyze_exchange(participant, &message.content, context, exchange_keywords)
                .await
            {
                Ok(Some(analysis)) => {
                    incident_ids.push(analysis.incident.id.clone());
                    if is_sender {
                        sender_alerted = analysis.notification.is_sent();
                        intervention = Some(analysis.intervention);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(
                        "Threat analysis failed for {} on message {}: {:#}",
                        participant, message.id, e
                    );
                }
            }
        }

        (intervention, incident_ids, sender_alerted)
    }
}

/// Trim, drop blanks and duplicates (keeping first occurrence), and reject
/// empty lists or self-addressed messages
fn normalize_recipients(sender_id: &str, recipient_ids: Vec<String>) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(recipient_ids.len());
    for id in recipient_ids {
        let id = id.trim().to_string();
        if !id.is_empty() && !normalized.contains(&id) {
            normalized.push(id);
        }
    }

    if normalized.is_empty() {
        return Err(SafetyError::bad_request("At least one recipient is required"));
    }
    if normalized.iter().any(|id| id == sender_id) {
        return Err(SafetyError::bad_request("A child cannot message themselves"));
    }
    Ok(normalized)
}
