//! # Domain Module
//!
//! Business rules of the child-safety core: policy evaluation, threat
//! detection, usage monitoring, incident resolution and guardian alerting.
//! Services depend only on the storage traits, never on SQLite directly.
//!
//! ## Module Organization
//!
//! - **safety_rule_service**: per-child policy store and time-window evaluation
//! - **content_moderation**: keyword/URL gate for outbound content
//! - **lexicon**: categorised trigger terms, built-in or loaded from YAML
//! - **threat_detector**: classification, incident creation and interventions
//! - **usage_monitor**: daily screen time against the daily limit
//! - **incident_service**: incident listing, resolution and statistics
//! - **alert_service**: guardian alerts and their read/dismiss lifecycle
//! - **messaging_service**: the message send path tying the above together
//! - **child_service**: child registration and removal
//! - **notification**: best-effort execution of secondary effects
//!
//! ## Business Rules
//!
//! - A child without a stored rule is unrestricted (fail-open)
//! - Every participant in a flagged exchange gets their own incident
//! - Notification failures never undo a stored message or incident
//! - Alerts and rules are only visible to the guardian who owns the child

pub mod alert_service;
pub mod child_service;
pub mod commands;
pub mod content_moderation;
pub mod errors;
pub mod incident_service;
pub mod lexicon;
pub mod messaging_service;
pub mod models;
pub mod notification;
pub mod safety_rule_service;
pub mod threat_detector;
pub mod usage_monitor;

pub use alert_service::AlertService;
pub use child_service::ChildService;
pub use content_moderation::ContentModerationGate;
pub use errors::SafetyError;
pub use incident_service::IncidentService;
pub use lexicon::ThreatLexicon;
pub use messaging_service::MessagingService;
pub use safety_rule_service::SafetyRuleService;
pub use threat_detector::ThreatDetector;
pub use usage_monitor::UsageMonitor;
