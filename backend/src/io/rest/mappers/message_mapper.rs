use shared::{ChatMessage as SharedMessage, SendMessageRequest, SendMessageResponse};

use crate::domain::commands::messaging::{SendMessageCommand, SendMessageResult};
use crate::domain::models::format_timestamp;
use crate::domain::models::message::ChatMessage as DomainMessage;

pub struct MessageMapper;

impl MessageMapper {
    pub fn to_send_command(request: SendMessageRequest) -> SendMessageCommand {
        SendMessageCommand {
            sender_id: request.sender_id,
            recipient_ids: request.recipient_ids,
            content: request.content,
        }
    }

    pub fn to_dto(domain: DomainMessage) -> SharedMessage {
        SharedMessage {
            id: domain.id,
            sender_id: domain.sender_id,
            recipient_ids: domain.recipient_ids,
            content: domain.content,
            is_flagged: domain.is_flagged,
            flagged_reason: domain.flagged_reason,
            created_at: format_timestamp(&domain.created_at),
        }
    }

    pub fn to_send_response(result: SendMessageResult) -> SendMessageResponse {
        SendMessageResponse {
            message: Self::to_dto(result.message),
            intervention: result.intervention,
        }
    }
}
