use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::dashboard::{DashboardStats, InsightResponse, InsightView};
use crate::service::dashboard::{DashboardService, RuleBasedInsight, StatsScope};
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;
use sqlx::PgPool;

#[allow(clippy::result_large_err)]
fn parse_view(view: Option<String>) -> Result<InsightView, AppError> {
    match view.as_deref().map(str::trim) {
        None | Some("") => Ok(InsightView::default()),
        Some(raw) => InsightView::parse(raw).ok_or_else(|| AppError::BadRequest(format!("Unknown insight view: {raw}"))),
    }
}

/// Counts and confirmed revenue across the current user's cars.
#[openapi(tag = "Dashboard")]
#[get("/owner")]
pub async fn owner_stats(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<DashboardStats>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let stats = DashboardService::new(&repo).stats(StatsScope::Owner(current_user.id)).await?;
    Ok(Json(stats))
}

/// Advice for the owner based on their numbers.
/// `view` is one of `dashboard` (default), `bookings` or `cars`; anything else is a 400.
#[openapi(tag = "Dashboard")]
#[get("/insight?<view>")]
pub async fn insight(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, view: Option<String>) -> Result<Json<InsightResponse>, AppError> {
    let view = parse_view(view)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let response = DashboardService::new(&repo).insight(&current_user.id, view, &RuleBasedInsight).await?;
    Ok(Json(response))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![owner_stats, insight]
}
