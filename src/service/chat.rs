use crate::database::message::MessageRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::message::{Message, MessageRequest};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

pub struct ChatService<'a, R> {
    repository: &'a R,
}

impl<'a, R> ChatService<'a, R>
where
    R: MessageRepository + UserRepository,
{
    pub fn new(repository: &'a R) -> Self {
        ChatService { repository }
    }

    pub async fn send(&self, sender_id: &Uuid, request: &MessageRequest) -> Result<Message, AppError> {
        if request.receiver_id == *sender_id {
            return Err(AppError::BadRequest("Cannot send a message to yourself".to_string()));
        }

        if request.content.trim().is_empty() {
            return Err(AppError::BadRequest("Message content is required".to_string()));
        }

        if self.repository.get_user_by_id(&request.receiver_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        let message = self.repository.create_message(sender_id, request).await?;
        debug!(message_id = %message.id, sender_id = %sender_id, receiver_id = %request.receiver_id, "message sent");
        Ok(message)
    }

    /// Full conversation between the two users, oldest first.
    pub async fn conversation(&self, user_id: &Uuid, other_id: &Uuid) -> Result<Vec<Message>, AppError> {
        self.repository.list_conversation(user_id, other_id, None).await
    }

    /// Polling endpoint: messages created strictly after `since`, oldest first.
    pub async fn fetch_new_messages(&self, user_id: &Uuid, other_id: &Uuid, since: DateTime<Utc>) -> Result<Vec<Message>, AppError> {
        self.repository.list_conversation(user_id, other_id, Some(since)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRepository, sample_user};
    use chrono::Duration;

    fn to(receiver_id: Uuid, content: &str) -> MessageRequest {
        MessageRequest {
            receiver_id,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn new_messages_are_strictly_after_the_cursor() {
        let repo = MockRepository::default();
        let renter = repo.insert_user(sample_user("renter@example.com"));
        let owner = repo.insert_user(sample_user("owner@example.com"));
        let outsider = repo.insert_user(sample_user("outsider@example.com"));
        let service = ChatService::new(&repo);

        let first = service.send(&renter.id, &to(owner.id, "Hi, is the car free?")).await.unwrap();
        service.send(&outsider.id, &to(owner.id, "Unrelated")).await.unwrap();
        let second = service.send(&owner.id, &to(renter.id, "Yes it is")).await.unwrap();
        let third = service.send(&renter.id, &to(owner.id, "Great")).await.unwrap();

        let all = service.conversation(&renter.id, &owner.id).await.unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![first.id, second.id, third.id]);

        let fresh = service.fetch_new_messages(&owner.id, &renter.id, first.created_at).await.unwrap();
        assert_eq!(fresh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second.id, third.id]);
        assert!(fresh.iter().all(|m| m.created_at > first.created_at));

        let none = service
            .fetch_new_messages(&renter.id, &owner.id, third.created_at + Duration::seconds(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn send_checks_the_receiver() {
        let repo = MockRepository::default();
        let sender = repo.insert_user(sample_user("a@example.com"));
        let service = ChatService::new(&repo);

        assert!(matches!(service.send(&sender.id, &to(Uuid::new_v4(), "hello")).await, Err(AppError::UserNotFound)));
        assert!(matches!(service.send(&sender.id, &to(sender.id, "hello")).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let repo = MockRepository::default();
        let a = repo.insert_user(sample_user("a@example.com"));
        let b = repo.insert_user(sample_user("b@example.com"));

        let result = ChatService::new(&repo).send(&a.id, &to(b.id, "   ")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
