use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::RateLimit;
use crate::models::review::{ReviewRequest, ReviewResponse};
use crate::service::review::ReviewService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Rate a car. Returns 403 unless the caller has an approved or completed
/// booking on it.
#[openapi(tag = "Reviews")]
#[post("/add", data = "<payload>")]
pub async fn add_review(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: JsonBody<ReviewRequest>,
) -> Result<(Status, Json<ReviewResponse>), AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let review = ReviewService::new(&repo).add_review(&current_user.id, &payload).await?;
    Ok((Status::Created, Json(ReviewResponse::from(&review))))
}

/// Reviews for a car, newest first.
#[openapi(tag = "Reviews")]
#[get("/<car_id>")]
pub async fn list_reviews(pool: &State<PgPool>, _rate_limit: RateLimit, car_id: &str) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    let car_id = Uuid::parse_str(car_id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let reviews = ReviewService::new(&repo).list_for_car(&car_id).await?;
    Ok(Json(reviews.iter().map(ReviewResponse::from).collect()))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![add_review, list_reviews]
}
