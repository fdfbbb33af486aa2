//! Domain-level command and result types.
//!
//! Services accept and return these; the REST layer maps the public DTOs in
//! the `shared` crate to and from them.

pub mod safety_rules {
    use shared::{AlertSettings, ContentFilters, TimeRestrictions};

    /// Partial update of a child's rule set. `None` fields keep their
    /// current value (or the default when the rule is being created).
    #[derive(Debug, Clone, Default)]
    pub struct UpsertSafetyRuleCommand {
        pub guardian_id: String,
        pub child_id: String,
        pub time_restrictions: Option<TimeRestrictions>,
        pub blocked_keywords: Option<Vec<String>>,
        pub blocked_urls: Option<Vec<String>>,
        pub content_filters: Option<ContentFilters>,
        pub alert_settings: Option<AlertSettings>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct TimeRestrictionCheck {
        pub allowed: bool,
        pub reason: Option<String>,
    }

    impl TimeRestrictionCheck {
        pub fn allowed() -> Self {
            Self {
                allowed: true,
                reason: None,
            }
        }
    }
}

pub mod moderation {
    /// Outcome of evaluating content against a child's policy. Advisory only.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ModerationDecision {
        pub blocked: bool,
        pub reason: Option<String>,
    }

    impl ModerationDecision {
        pub fn allowed() -> Self {
            Self {
                blocked: false,
                reason: None,
            }
        }

        pub fn blocked(reason: String) -> Self {
            Self {
                blocked: true,
                reason: Some(reason),
            }
        }
    }
}

pub mod threats {
    use crate::domain::models::incident::ThreatIncident;
    use crate::domain::notification::NotificationOutcome;
    use shared::EducationalIntervention;

    /// Result of an analysis that found something
    #[derive(Debug, Clone)]
    pub struct ThreatAnalysis {
        pub incident: ThreatIncident,
        pub intervention: EducationalIntervention,
        pub notification: NotificationOutcome,
    }

    #[derive(Debug, Clone)]
    pub struct ResolveIncidentCommand {
        pub incident_id: String,
        pub resolved_by: String,
        pub resolution: String,
        pub notes: Option<String>,
    }
}

pub mod activity {
    use crate::domain::models::activity::{ActivityEvent, TimeLimitStatus};
    use crate::domain::notification::NotificationOutcome;
    use chrono::{DateTime, Utc};

    #[derive(Debug, Clone)]
    pub struct RecordActivityCommand {
        pub child_id: String,
        pub activity_type: String,
        pub duration_seconds: u32,
        /// Defaults to now
        pub timestamp: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone)]
    pub struct RecordActivityResult {
        pub activity: ActivityEvent,
        /// `None` when the limit could not be checked after the write
        pub status: Option<TimeLimitStatus>,
        pub notification: NotificationOutcome,
    }
}

pub mod messaging {
    use crate::domain::models::message::ChatMessage;
    use shared::EducationalIntervention;

    #[derive(Debug, Clone)]
    pub struct SendMessageCommand {
        pub sender_id: String,
        pub recipient_ids: Vec<String>,
        pub content: String,
    }

    #[derive(Debug, Clone)]
    pub struct SendMessageResult {
        pub message: ChatMessage,
        /// Guidance for the sender when their message was flagged
        pub intervention: Option<EducationalIntervention>,
        /// Ids of incidents recorded for the participants
        pub incident_ids: Vec<String>,
    }
}

pub mod children {
    #[derive(Debug, Clone)]
    pub struct RegisterChildCommand {
        pub guardian_id: String,
        pub display_name: String,
        pub age_verified: bool,
    }
}
