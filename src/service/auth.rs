use crate::database::session::SessionRepository;
use crate::database::user::{UserRepository, dummy_verify, verify_password};
use crate::error::app_error::AppError;
use crate::models::session::Session;
use crate::models::user::{LoginRequest, RegisterRequest, Role, User};
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Minimum zxcvbn score accepted for new passwords.
const MIN_PASSWORD_SCORE: u8 = 3;

pub struct AuthService<'a, R> {
    repository: &'a R,
    session_ttl: Duration,
}

impl<'a, R> AuthService<'a, R>
where
    R: UserRepository + SessionRepository,
{
    pub fn new(repository: &'a R, session_ttl_seconds: i64) -> Self {
        AuthService {
            repository,
            session_ttl: Duration::seconds(session_ttl_seconds.max(1)),
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        if request.role == Role::Admin {
            return Err(AppError::Forbidden("Admin accounts cannot be self-registered".to_string()));
        }

        check_password_strength(&request.password, &[&request.username, &request.email])?;

        if self.repository.get_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(request.email.clone()));
        }

        let user = self.repository.create_user(request).await?;
        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Verifies credentials and opens a session. Unknown emails run a decoy
    /// hash so both failure paths cost the same.
    pub async fn login(&self, request: &LoginRequest) -> Result<(Session, User), AppError> {
        let Some(user) = self.repository.get_user_by_email(&request.email).await? else {
            dummy_verify(&request.password);
            warn!("login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if let Err(err) = verify_password(&user, &request.password) {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(err);
        }

        let session = self.repository.create_session(&user.id, Utc::now() + self.session_ttl).await?;
        info!(user_id = %session.user_id, session_id = %session.id, expires_at = %session.expires_at, "user logged in");
        Ok((session, user))
    }

    pub async fn logout(&self, session_id: &Uuid) -> Result<(), AppError> {
        self.repository.delete_session(session_id).await
    }
}

pub fn check_password_strength(password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
    let estimate = zxcvbn::zxcvbn(password, user_inputs);
    if u8::from(estimate.score()) < MIN_PASSWORD_SCORE {
        return Err(AppError::BadRequest("Password is too weak".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockRepository;

    const STRONG: &str = "violet-harbor-lantern-92";

    fn register_request(email: &str, password: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            username: "sahan".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            phone: None,
            role,
        }
    }

    #[test]
    fn weak_passwords_are_rejected() {
        assert!(check_password_strength("password123", &[]).is_err());
        assert!(check_password_strength(STRONG, &[]).is_ok());
    }

    #[tokio::test]
    async fn register_then_login() {
        let repo = MockRepository::default();
        let service = AuthService::new(&repo, 3600);

        let user = service.register(&register_request("sahan@example.com", STRONG, Role::Owner)).await.unwrap();
        assert_eq!(user.role(), Role::Owner);

        let (session, logged_in) = service
            .login(&LoginRequest {
                email: "sahan@example.com".to_string(),
                password: STRONG.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(logged_in.id, user.id);
        assert_eq!(session.user_id, user.id);
        assert!(session.expires_at > Utc::now());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = MockRepository::default();
        let service = AuthService::new(&repo, 3600);
        service.register(&register_request("dup@example.com", STRONG, Role::Renter)).await.unwrap();

        let again = service.register(&register_request("dup@example.com", STRONG, Role::Renter)).await;
        assert!(matches!(again, Err(AppError::UserAlreadyExists(_))));
    }

    #[tokio::test]
    async fn admin_cannot_be_self_registered() {
        let repo = MockRepository::default();
        let result = AuthService::new(&repo, 3600)
            .register(&register_request("root@example.com", STRONG, Role::Admin))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn bad_credentials_look_the_same() {
        let repo = MockRepository::default();
        let service = AuthService::new(&repo, 3600);
        service.register(&register_request("known@example.com", STRONG, Role::Renter)).await.unwrap();

        let wrong_password = service
            .login(&LoginRequest {
                email: "known@example.com".to_string(),
                password: "not-the-password".to_string(),
            })
            .await;
        let unknown_email = service
            .login(&LoginRequest {
                email: "nobody@example.com".to_string(),
                password: STRONG.to_string(),
            })
            .await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AppError::InvalidCredentials)));
    }
}
