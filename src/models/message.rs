use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for ChatMessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender: message.sender_id,
            receiver: message.receiver_id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}
