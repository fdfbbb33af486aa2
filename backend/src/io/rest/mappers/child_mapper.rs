use shared::{ChildProfile as SharedChild, ChildResponse, RegisterChildRequest};

use crate::domain::commands::children::RegisterChildCommand;
use crate::domain::models::child::ChildProfile as DomainChild;
use crate::domain::models::format_timestamp;

pub struct ChildMapper;

impl ChildMapper {
    pub fn to_register_command(guardian_id: String, request: RegisterChildRequest) -> RegisterChildCommand {
        RegisterChildCommand {
            guardian_id,
            display_name: request.display_name,
            age_verified: request.age_verified,
        }
    }

    pub fn to_dto(domain: DomainChild) -> SharedChild {
        SharedChild {
            id: domain.id,
            guardian_id: domain.guardian_id,
            display_name: domain.display_name,
            age_verified: domain.age_verified,
            created_at: format_timestamp(&domain.created_at),
        }
    }

    pub fn to_response(domain: DomainChild, success_message: impl Into<String>) -> ChildResponse {
        ChildResponse {
            child: Self::to_dto(domain),
            success_message: success_message.into(),
        }
    }
}
