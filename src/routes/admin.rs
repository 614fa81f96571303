use crate::auth::AdminUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::car::MessageResponse;
use crate::models::dashboard::AdminStatsResponse;
use crate::service::dashboard::DashboardService;
use crate::service::user::UserService;
use rocket::serde::json::Json;
use rocket::{State, delete, get};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// Platform-wide totals. Admin only.
#[openapi(tag = "Admin")]
#[get("/stats")]
pub async fn admin_stats(pool: &State<PgPool>, _rate_limit: RateLimit, _admin: AdminUser) -> Result<Json<AdminStatsResponse>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    Ok(Json(DashboardService::new(&repo).admin_stats().await?))
}

/// Delete a user and every car they own. Admins cannot delete themselves.
#[openapi(tag = "Admin")]
#[delete("/user/<id>")]
pub async fn delete_user(pool: &State<PgPool>, _rate_limit: RateLimit, admin: AdminUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let user_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid user id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    UserService::new(&repo).delete_user_with_cars(&admin.0.id, &user_id).await?;
    Ok(Json(MessageResponse {
        message: "User and their cars deleted".to_string(),
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![admin_stats, delete_user]
}
