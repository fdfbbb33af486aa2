use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::commands::children::RegisterChildCommand;
use crate::domain::errors::SafetyError;
use crate::domain::models::child::ChildProfile;
use crate::domain::safety_rule_service::SafetyRuleService;
use crate::storage::traits::ChildDirectory;

/// Registers children under a guardian and removes them again. Removing a
/// child also deletes its safety rule.
#[derive(Clone)]
pub struct ChildService {
    children: Arc<dyn ChildDirectory>,
    safety_rules: SafetyRuleService,
}

impl ChildService {
    pub fn new(children: Arc<dyn ChildDirectory>, safety_rules: SafetyRuleService) -> Self {
        Self { children, safety_rules }
    }

    pub async fn register_child(&self, command: RegisterChildCommand) -> Result<ChildProfile> {
        let display_name = command.display_name.trim();
        if display_name.is_empty() {
            return Err(SafetyError::bad_request("Child display name cannot be empty"));
        }

        let child = ChildProfile {
            id: ChildProfile::generate_id(),
            guardian_id: Some(command.guardian_id.clone()),
            display_name: display_name.to_string(),
            age_verified: command.age_verified,
            created_at: Utc::now(),
        };
        self.children.store_child(&child).await?;
        info!("Registered child {} for guardian {}", child.id, command.guardian_id);
        Ok(child)
    }

    pub async fn get_child(&self, guardian_id: &str, child_id: &str) -> Result<ChildProfile> {
        self.children.verify_child_ownership(guardian_id, child_id).await?;
        self.children
            .get_child(child_id)
            .await?
            .ok_or_else(|| SafetyError::not_found(format!("Child {}", child_id)))
    }

    pub async fn remove_child(&self, guardian_id: &str, child_id: &str) -> Result<ChildProfile> {
        let child = self.get_child(guardian_id, child_id).await?;
        self.safety_rules.delete_rule(child_id).await?;
        self.children.delete_child(child_id).await?;
        info!("Removed child {} for guardian {}", child_id, guardian_id);
        Ok(child)
    }
}
