use crate::Config;
use crate::auth::{CurrentUser, clear_session_cookie, set_session_cookie};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::{AuthRateLimit, RateLimit};
use crate::models::user::{LoginRequest, ProfileUpdateRequest, RegisterRequest, UserResponse};
use crate::service::auth::AuthService;
use crate::service::user::UserService;
use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use validator::Validate;

/// Create an account. `role` is `renter` (default) or `owner`; admin accounts
/// cannot be self-registered.
#[openapi(tag = "Users")]
#[post("/register", data = "<payload>")]
pub async fn register(
    pool: &State<PgPool>,
    config: &State<Config>,
    _rate_limit: AuthRateLimit,
    payload: JsonBody<RegisterRequest>,
) -> Result<(Status, Json<UserResponse>), AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = AuthService::new(&repo, config.session.ttl_seconds).register(&payload).await?;
    Ok((Status::Created, Json(UserResponse::from(&user))))
}

/// Sign in and receive the session cookie.
#[openapi(tag = "Users")]
#[post("/login", data = "<payload>")]
pub async fn login(
    pool: &State<PgPool>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    _rate_limit: AuthRateLimit,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let (session, user) = AuthService::new(&repo, config.session.ttl_seconds).login(&payload).await?;
    set_session_cookie(cookies, &session, config.session.cookie_secure);
    Ok(Json(UserResponse::from(&user)))
}

/// End the current session and clear the cookie.
#[openapi(tag = "Users")]
#[post("/logout")]
pub async fn logout(
    pool: &State<PgPool>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
) -> Result<Status, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    AuthService::new(&repo, config.session.ttl_seconds).logout(&current_user.session_id).await?;
    clear_session_cookie(cookies);
    Ok(Status::Ok)
}

#[openapi(tag = "Users")]
#[get("/me")]
pub async fn me(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<UserResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = UserService::new(&repo).get_user(&current_user.id).await?;
    Ok(Json(UserResponse::from(&user)))
}

#[openapi(tag = "Users")]
#[put("/update", data = "<payload>")]
pub async fn update_profile(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: JsonBody<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let user = UserService::new(&repo).update_profile(&current_user.id, &payload).await?;
    Ok(Json(UserResponse::from(&user)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![register, login, logout, me, update_profile]
}

#[cfg(test)]
mod tests {
    use crate::{Config, build_rocket};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    #[rocket::async_test]
    #[ignore = "requires database"]
    async fn register_login_me_logout() {
        let client = Client::tracked(build_rocket(Config::default())).await.expect("valid rocket instance");
        let email = format!("{}@example.com", uuid::Uuid::new_v4());

        let response = client
            .post("/api/users/register")
            .header(ContentType::JSON)
            .body(format!(r#"{{"username":"dana","email":"{email}","password":"violet-harbor-lantern-92","role":"owner"}}"#))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client
            .post("/api/users/login")
            .header(ContentType::JSON)
            .body(format!(r#"{{"email":"{email}","password":"violet-harbor-lantern-92"}}"#))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/users/me").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.post("/api/users/logout").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.get("/api/users/me").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    #[ignore = "requires database"]
    async fn admin_cannot_self_register() {
        let client = Client::tracked(build_rocket(Config::default())).await.expect("valid rocket instance");

        let response = client
            .post("/api/users/register")
            .header(ContentType::JSON)
            .body(r#"{"username":"root","email":"root@example.com","password":"violet-harbor-lantern-92","role":"admin"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }
}
