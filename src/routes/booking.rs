use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::{BookingRateLimit, RateLimit};
use crate::models::booking::{BookingCreatedResponse, BookingRequest, BookingResponse, BookingStatusRequest};
use crate::service::booking::BookingService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_okapi::openapi;
use sqlx::PgPool;
use uuid::Uuid;

/// Request a car for a date range. The price is computed from the car's daily
/// rate and the booking starts out `pending`.
#[openapi(tag = "Bookings")]
#[post("/create", data = "<payload>")]
pub async fn create_booking(
    pool: &State<PgPool>,
    _rate_limit: BookingRateLimit,
    current_user: CurrentUser,
    payload: JsonBody<BookingRequest>,
) -> Result<(Status, Json<BookingCreatedResponse>), AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let booking = BookingService::new(&repo).create_booking(&current_user.id, &payload).await?;
    Ok((
        Status::Created,
        Json(BookingCreatedResponse {
            message: "Booking created".to_string(),
            booking: BookingResponse::from(&booking),
        }),
    ))
}

/// Bookings made by the current user, with car and owner populated.
#[openapi(tag = "Bookings")]
#[get("/my-bookings")]
pub async fn my_bookings(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let bookings = BookingService::new(&repo).list_for_renter(&current_user.id).await?;
    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}

/// Bookings on the current user's cars, with renter and car populated.
#[openapi(tag = "Bookings")]
#[get("/owner-bookings")]
pub async fn owner_bookings(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let bookings = BookingService::new(&repo).list_for_owner(&current_user.id).await?;
    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}

/// Owner decision on a booking. Returns 401 when the caller does not own the
/// booking and 409 when the move is not allowed from the current status or the
/// booking changed concurrently.
#[openapi(tag = "Bookings")]
#[put("/<id>/status", data = "<payload>")]
pub async fn update_booking_status(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<BookingStatusRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid booking id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let booking = BookingService::new(&repo).update_status(&booking_id, &current_user.id, payload.status).await?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// Renter withdraws a pending or approved booking.
#[openapi(tag = "Bookings")]
#[put("/<id>/cancel")]
pub async fn cancel_booking(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<BookingResponse>, AppError> {
    let booking_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid booking id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let booking = BookingService::new(&repo).cancel(&booking_id, &current_user.id).await?;
    Ok(Json(BookingResponse::from(&booking)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![create_booking, my_bookings, owner_bookings, update_booking_status, cancel_booking]
}
