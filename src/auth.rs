use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SessionRepository;
use crate::error::app_error::AppError;
use crate::models::session::Session;
use crate::models::user::{Role, role_from_db};
use chrono::{DateTime, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, RefOr, Response, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

pub(crate) const SESSION_COOKIE: &str = "user";

#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub session_id: Uuid,
}

/// A signed-in user whose role is admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

/// Splits the private cookie value `session_id:user_id`.
pub(crate) fn parse_user_cookie_value(value: &str) -> Option<(Uuid, Uuid)> {
    let (session_id, user_id) = value.split_once(':')?;
    Some((Uuid::parse_str(session_id).ok()?, Uuid::parse_str(user_id).ok()?))
}

/// The cookie lives no longer than the session row it points at.
fn session_cookie(session: &Session, secure: bool, now: DateTime<Utc>) -> Cookie<'static> {
    let remaining = (session.expires_at - now).num_seconds().max(0);
    Cookie::build((SESSION_COOKIE, format!("{}:{}", session.id, session.user_id)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(rocket::time::Duration::seconds(remaining))
        .build()
}

pub(crate) fn set_session_cookie(cookies: &CookieJar<'_>, session: &Session, secure: bool) {
    cookies.add_private(session_cookie(session, secure, Utc::now()));
}

pub(crate) fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::build(SESSION_COOKIE).path("/").build());
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some((session_id, user_id)) = req
            .cookies()
            .get_private(SESSION_COOKIE)
            .and_then(|cookie| parse_user_cookie_value(cookie.value()))
        else {
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        let Some(pool) = req.rocket().state::<PgPool>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthorized));
        };
        let repo = PostgresRepository { pool: pool.clone() };

        match repo.get_active_session_user(&session_id, &user_id).await {
            Ok(Some(user)) => {
                let current_user = CurrentUser {
                    id: user.id,
                    email: user.email,
                    role: role_from_db(&user.role),
                    session_id,
                };
                req.local_cache(|| Some(current_user.clone()));
                Outcome::Success(current_user)
            }
            Ok(None) => {
                let _ = repo.delete_session_if_expired(&session_id).await;
                Outcome::Error((Status::Unauthorized, AppError::Unauthorized))
            }
            Err(err) => Outcome::Error((Status::InternalServerError, err)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        match CurrentUser::from_request(req).await {
            Outcome::Success(user) if user.role == Role::Admin => Outcome::Success(AdminUser(user)),
            Outcome::Success(user) => {
                warn!(user_id = %user.id, uri = %req.uri(), "non-admin hit an admin route");
                Outcome::Error((Status::Forbidden, AppError::Forbidden("Admin access required".to_string())))
            }
            Outcome::Error(error) => Outcome::Error(error),
            Outcome::Forward(status) => Outcome::Forward(status),
        }
    }
}

fn cookie_security() -> RequestHeaderInput {
    let security_scheme = SecurityScheme {
        description: Some("Session cookie. Log in via POST /api/users/login to obtain it.".to_string()),
        data: SecuritySchemeData::ApiKey {
            name: SESSION_COOKIE.to_string(),
            location: "cookie".to_string(),
        },
        extensions: Object::default(),
    };

    let mut security_req = SecurityRequirement::new();
    security_req.insert("cookieAuth".to_string(), Vec::new());

    RequestHeaderInput::Security("cookieAuth".to_string(), security_scheme, security_req)
}

fn auth_responses(codes: &[(&str, &str)]) -> Responses {
    let mut responses = Responses::default();
    for (code, description) in codes {
        responses.responses.insert(
            code.to_string(),
            RefOr::Object(Response {
                description: description.to_string(),
                ..Default::default()
            }),
        );
    }
    responses
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security())
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(auth_responses(&[("401", "Unauthorized - Authentication required")]))
    }
}

impl<'a> OpenApiFromRequest<'a> for AdminUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(cookie_security())
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        Ok(auth_responses(&[
            ("401", "Unauthorized - Authentication required"),
            ("403", "Forbidden - Admin role required"),
        ]))
    }
}
