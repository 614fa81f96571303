use crate::database::car::CarRepository;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::user::{ProfileUpdateRequest, User};
use tracing::info;
use uuid::Uuid;

pub struct UserService<'a, R> {
    repository: &'a R,
}

impl<'a, R> UserService<'a, R>
where
    R: UserRepository + CarRepository,
{
    pub fn new(repository: &'a R) -> Self {
        UserService { repository }
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<User, AppError> {
        self.repository.get_user_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn update_profile(&self, id: &Uuid, request: &ProfileUpdateRequest) -> Result<User, AppError> {
        self.repository.update_profile(id, request).await
    }

    /// Admin removal of a user together with every car they own.
    pub async fn delete_user_with_cars(&self, admin_id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        if admin_id == user_id {
            return Err(AppError::BadRequest("Admins cannot delete their own account".to_string()));
        }

        self.get_user(user_id).await?;
        let cars_deleted = self.repository.delete_cars_by_owner(user_id).await?;
        self.repository.delete_user(user_id).await?;

        info!(user_id = %user_id, admin_id = %admin_id, cars_deleted, "user deleted");
        Ok(())
    }
}
