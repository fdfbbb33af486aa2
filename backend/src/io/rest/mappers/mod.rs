//! Conversions between the `shared` DTOs and domain models.

pub mod activity_mapper;
pub mod alert_mapper;
pub mod child_mapper;
pub mod incident_mapper;
pub mod message_mapper;
pub mod safety_rule_mapper;

pub use activity_mapper::ActivityMapper;
pub use alert_mapper::AlertMapper;
pub use child_mapper::ChildMapper;
pub use incident_mapper::IncidentMapper;
pub use message_mapper::MessageMapper;
pub use safety_rule_mapper::SafetyRuleMapper;
