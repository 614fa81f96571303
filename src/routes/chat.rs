use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::RateLimit;
use crate::models::booking::parse_flexible_datetime;
use crate::models::message::{ChatMessageResponse, MessageRequest};
use crate::service::chat::ChatService;
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[allow(clippy::result_large_err)]
fn parse_since(since: Option<String>) -> Result<DateTime<Utc>, AppError> {
    let raw = since.ok_or_else(|| AppError::BadRequest("Missing since query parameter".to_string()))?;
    parse_flexible_datetime(&raw).ok_or_else(|| AppError::BadRequest(format!("Invalid since timestamp: {raw}")))
}

#[openapi(tag = "Chat")]
#[post("/send", data = "<payload>")]
pub async fn send_message(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: JsonBody<MessageRequest>,
) -> Result<(Status, Json<ChatMessageResponse>), AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let message = ChatService::new(&repo).send(&current_user.id, &payload).await?;
    Ok((Status::Created, Json(ChatMessageResponse::from(&message))))
}

/// Whole conversation with another user, oldest first.
#[openapi(tag = "Chat")]
#[get("/<user_id>")]
pub async fn get_conversation(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, user_id: &str) -> Result<Json<Vec<ChatMessageResponse>>, AppError> {
    let other_id = Uuid::parse_str(user_id).map_err(|e| AppError::uuid("Invalid user id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let messages = ChatService::new(&repo).conversation(&current_user.id, &other_id).await?;
    Ok(Json(messages.iter().map(ChatMessageResponse::from).collect()))
}

/// Polling endpoint: messages created strictly after `since`.
/// `since` accepts RFC 3339 or `YYYY-MM-DD`; returns 400 when missing or unparseable.
#[openapi(tag = "Chat")]
#[get("/<user_id>/new?<since>")]
pub async fn get_new_messages(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    user_id: &str,
    since: Option<String>,
) -> Result<Json<Vec<ChatMessageResponse>>, AppError> {
    let other_id = Uuid::parse_str(user_id).map_err(|e| AppError::uuid("Invalid user id", e))?;
    let since = parse_since(since)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let messages = ChatService::new(&repo).fetch_new_messages(&current_user.id, &other_id, since).await?;
    Ok(Json(messages.iter().map(ChatMessageResponse::from).collect()))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![send_message, get_conversation, get_new_messages]
}
