use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::message::{Message, MessageRequest};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait MessageRepository {
    async fn create_message(&self, sender_id: &Uuid, request: &MessageRequest) -> Result<Message, AppError>;
    /// Messages exchanged between `a` and `b` in either direction, oldest
    /// first. With `since`, only messages created strictly after it.
    async fn list_conversation(&self, a: &Uuid, b: &Uuid, since: Option<DateTime<Utc>>) -> Result<Vec<Message>, AppError>;
}

#[async_trait::async_trait]
impl MessageRepository for PostgresRepository {
    async fn create_message(&self, sender_id: &Uuid, request: &MessageRequest) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, receiver_id, content, created_at
            "#,
        )
        .bind(sender_id)
        .bind(request.receiver_id)
        .bind(&request.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn list_conversation(&self, a: &Uuid, b: &Uuid, since: Option<DateTime<Utc>>) -> Result<Vec<Message>, AppError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, receiver_id, content, created_at
            FROM messages
            WHERE ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
              AND ($3::timestamptz IS NULL OR created_at > $3)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
