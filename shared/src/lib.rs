use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Shared enums
// ---------------------------------------------------------------------------

/// Severity assigned to a threat incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle state of a threat incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    /// Reserved for an external triage step; nothing in the core moves an incident here.
    UnderReview,
    Resolved,
    FalsePositive,
}

/// What caused a parent alert to be raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ThreatDetected,
    TimeLimitExceeded,
    BlockedContent,
    ConsentRequest,
}

/// Guardian-facing urgency of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Read state of an alert. `Dismissed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Unread,
    Read,
    Dismissed,
}

/// Error returned when a stored or requested enum value is not recognised
#[derive(Debug, Clone, PartialEq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Storage / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }

            /// Parse from the storage / wire representation
            pub fn parse(value: &str) -> Result<Self, ParseEnumError> {
                match value {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(ThreatSeverity, "severity", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

string_enum!(IncidentStatus, "incident status", {
    Open => "open",
    UnderReview => "under_review",
    Resolved => "resolved",
    FalsePositive => "false_positive",
});

string_enum!(AlertType, "alert type", {
    ThreatDetected => "threat_detected",
    TimeLimitExceeded => "time_limit_exceeded",
    BlockedContent => "blocked_content",
    ConsentRequest => "consent_request",
});

string_enum!(AlertSeverity, "alert severity", {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

string_enum!(AlertStatus, "alert status", {
    Unread => "unread",
    Read => "read",
    Dismissed => "dismissed",
});

impl IncidentStatus {
    /// Terminal states cannot be left once entered
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::FalsePositive)
    }
}

// ---------------------------------------------------------------------------
// Safety rules
// ---------------------------------------------------------------------------

/// Time-of-day windows and daily limit. Times are zero-padded 24h "HH:MM" strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRestrictions {
    pub enabled: bool,
    pub weekday_start: String,
    pub weekday_end: String,
    pub weekend_start: String,
    pub weekend_end: String,
    /// Daily usage limit in minutes; None falls back to the server default
    pub max_daily_minutes: Option<u32>,
}

impl Default for TimeRestrictions {
    fn default() -> Self {
        Self {
            enabled: false,
            weekday_start: "07:00".to_string(),
            weekday_end: "20:00".to_string(),
            weekend_start: "08:00".to_string(),
            weekend_end: "21:00".to_string(),
            max_daily_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFilters {
    pub filter_profanity: bool,
    pub filter_violence: bool,
    pub filter_personal_info: bool,
    pub safe_search: bool,
}

impl Default for ContentFilters {
    fn default() -> Self {
        Self {
            filter_profanity: true,
            filter_violence: true,
            filter_personal_info: true,
            safe_search: true,
        }
    }
}

/// Which events should notify the guardian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    pub threat_alerts: bool,
    pub time_limit_alerts: bool,
    pub blocked_content_alerts: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            threat_alerts: true,
            time_limit_alerts: true,
            blocked_content_alerts: true,
        }
    }
}

/// A child's safety rule set as exposed over the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRule {
    pub child_id: String,
    pub guardian_id: String,
    pub time_restrictions: TimeRestrictions,
    pub blocked_keywords: Vec<String>,
    pub blocked_urls: Vec<String>,
    pub content_filters: ContentFilters,
    pub alert_settings: AlertSettings,
    pub created_at: String, // RFC 3339 timestamp
    pub updated_at: String, // RFC 3339 timestamp
}

/// Upsert request. Absent fields keep their current (or default) value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertSafetyRuleRequest {
    pub child_id: String,
    #[serde(default)]
    pub time_restrictions: Option<TimeRestrictions>,
    #[serde(default)]
    pub blocked_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub blocked_urls: Option<Vec<String>>,
    #[serde(default)]
    pub content_filters: Option<ContentFilters>,
    #[serde(default)]
    pub alert_settings: Option<AlertSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRuleResponse {
    pub rule: SafetyRule,
    /// True when no rule is stored and the unrestricted default is returned
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRestrictionStatus {
    pub allowed: bool,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Content moderation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCheckRequest {
    pub child_id: String,
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCheckResponse {
    pub blocked: bool,
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Screen time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTimeStatus {
    pub child_id: String,
    pub is_exceeded: bool,
    pub current_minutes: u32,
    pub limit_minutes: u32,
    pub remaining_minutes: u32,
    pub should_warn: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: String, // ISO 8601 date (YYYY-MM-DD)
    pub total_minutes: u32,
    pub session_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummaryResponse {
    pub child_id: String,
    pub days: Vec<DailyUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordActivityRequest {
    pub child_id: String,
    pub activity_type: String,
    pub duration_seconds: u32,
    /// Optional completion time (RFC 3339); defaults to now
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: String,
    pub child_id: String,
    pub activity_type: String,
    pub duration_seconds: u32,
    pub timestamp: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordActivityResponse {
    pub activity: ActivityEvent,
    /// Absent when the activity was stored but the limit check failed
    #[serde(default)]
    pub screen_time: Option<ScreenTimeStatus>,
}

// ---------------------------------------------------------------------------
// Threat incidents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatIncident {
    pub id: String,
    pub child_id: String,
    pub threat_type: String,
    pub severity: ThreatSeverity,
    pub confidence: u8,
    pub detected_keywords: Vec<String>,
    pub context: BTreeMap<String, serde_json::Value>,
    pub status: IncidentStatus,
    pub parent_notified: bool,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<String>,
    pub resolution_notes: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentListResponse {
    pub incidents: Vec<ThreatIncident>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveIncidentRequest {
    /// "resolved" or "false_positive"
    pub resolution: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentStatsResponse {
    pub total: u64,
    pub open: u64,
    pub critical: u64,
    pub high: u64,
    pub by_type: BTreeMap<String, u64>,
}

/// Immediate guidance shown to a child whose own content was flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationalIntervention {
    pub message: String,
    pub options: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parent alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentAlert {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub related_incident_id: Option<String>,
    pub read_at: Option<String>,
    pub dismissed_at: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertListResponse {
    pub alerts: Vec<ParentAlert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: String,
    /// One recipient for a direct message, several for a group message
    pub recipient_ids: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub recipient_ids: Vec<String>,
    pub content: String,
    pub is_flagged: bool,
    pub flagged_reason: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub message: ChatMessage,
    pub intervention: Option<EducationalIntervention>,
}

// ---------------------------------------------------------------------------
// Child directory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: String,
    pub guardian_id: Option<String>,
    pub display_name: String,
    pub age_verified: bool,
    pub created_at: String, // RFC 3339 timestamp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterChildRequest {
    pub display_name: String,
    #[serde(default)]
    pub age_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildResponse {
    pub child: ChildProfile,
    pub success_message: String,
}
