use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{ProfileUpdateRequest, RegisterRequest, User};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;
use uuid::Uuid;

/// A real Argon2 hash generated once, used as a timing decoy so that logins
/// for unknown emails take as long as logins for existing accounts.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("dummy-never-matches").ok());

const USER_COLUMNS: &str = "id, username, email, phone, role, password_hash, created_at";

#[async_trait::async_trait]
pub trait UserRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    async fn update_profile(&self, id: &Uuid, request: &ProfileUpdateRequest) -> Result<User, AppError>;
    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError>;
    async fn count_users(&self) -> Result<i64, AppError>;
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let password_hash = hash_password(&request.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, phone, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&request.username)
        .bind(request.email.to_lowercase())
        .bind(&request.phone)
        .bind(request.role.as_str())
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_profile(&self, id: &Uuid, request: &ProfileUpdateRequest) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $1, phone = $2
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&request.username)
        .bind(&request.phone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(AppError::UserNotFound)
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&self.pool).await?;
        Ok(total)
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
    let password_hash = PasswordHash::new(&user.password_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &password_hash)
        .map_err(|_| AppError::InvalidCredentials)
}

/// Throwaway verification used when the email is unknown.
pub(crate) fn dummy_verify(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref()
        && let Ok(hash) = PasswordHash::new(hash)
    {
        let _ = Argon2::default().verify_password(password.as_bytes(), &hash);
    }
}
