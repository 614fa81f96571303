use crate::models::reference::Identified;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Renter,
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Renter => "renter",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        role_from_db(&self.role)
    }
}

/// Unknown role strings fall back to the least privileged role.
pub fn role_from_db(value: &str) -> Role {
    match value {
        "owner" => Role::Owner,
        "admin" => Role::Admin,
        _ => Role::Renter,
    }
}

/// Public projection of a user, used when a reference is populated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Identified for UserSummary {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role(),
        }
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: Some(user.email.clone()),
            phone: user.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_db_text() {
        for role in [Role::Renter, Role::Owner, Role::Admin] {
            assert_eq!(role_from_db(role.as_str()), role);
        }
        assert_eq!(role_from_db("superuser"), Role::Renter);
    }

    #[test]
    fn register_request_defaults_to_renter() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"username":"dana","email":"dana@example.com","password":"correct horse battery"}"#).unwrap();
        assert_eq!(request.role, Role::Renter);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn register_request_rejects_bad_email() {
        let request = RegisterRequest {
            username: "dana".to_string(),
            email: "not-an-email".to_string(),
            password: "correct horse battery".to_string(),
            phone: None,
            role: Role::Owner,
        };
        assert!(request.validate().is_err());
    }
}
