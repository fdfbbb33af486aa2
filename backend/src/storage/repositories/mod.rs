pub mod activity_repository;
pub mod alert_repository;
pub mod child_repository;
pub mod incident_repository;
pub mod message_repository;
pub mod safety_rule_repository;

pub use activity_repository::ActivityRepository;
pub use alert_repository::AlertRepository;
pub use child_repository::ChildRepository;
pub use incident_repository::IncidentRepository;
pub use message_repository::MessageRepository;
pub use safety_rule_repository::SafetyRuleRepository;
