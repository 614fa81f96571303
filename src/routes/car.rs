use crate::auth::CurrentUser;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::middleware::rate_limit::RateLimit;
use crate::models::car::{CarFilter, CarRequest, CarResponse, CarStatusResponse, FuelType, MessageResponse};
use crate::service::car::CarService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{FromForm, State, delete, get, post, put};
use rocket_okapi::openapi;
use schemars::JsonSchema;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Query string of the public listing.
#[derive(FromForm, JsonSchema, Debug, Default)]
pub struct CarSearchQuery {
    pub location: Option<String>,
    pub brand: Option<String>,
    #[field(name = "minPrice")]
    #[schemars(rename = "minPrice")]
    pub min_price: Option<i64>,
    #[field(name = "maxPrice")]
    #[schemars(rename = "maxPrice")]
    pub max_price: Option<i64>,
    #[field(name = "fuelType")]
    #[schemars(rename = "fuelType")]
    pub fuel_type: Option<String>,
}

impl TryFrom<CarSearchQuery> for CarFilter {
    type Error = AppError;

    fn try_from(query: CarSearchQuery) -> Result<Self, Self::Error> {
        let fuel_type = match query.fuel_type.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
            Some(raw) => Some(FuelType::parse(raw).ok_or_else(|| AppError::BadRequest(format!("Unknown fuel type: {raw}")))?),
            None => None,
        };

        Ok(CarFilter {
            location: non_blank(query.location),
            brand: non_blank(query.brand),
            min_price: query.min_price,
            max_price: query.max_price,
            fuel_type,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// List a new car. Renters get 403; the caller becomes the owner.
#[openapi(tag = "Cars")]
#[post("/add", data = "<payload>")]
pub async fn add_car(
    pool: &State<PgPool>,
    _rate_limit: RateLimit,
    current_user: CurrentUser,
    payload: JsonBody<CarRequest>,
) -> Result<(Status, Json<CarResponse>), AppError> {
    payload.validate()?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo).add_car(&current_user.id, current_user.role, &payload).await?;
    Ok((Status::Created, Json(CarResponse::from(&car))))
}

/// Public listing of available cars. Text filters match case-insensitively.
#[openapi(tag = "Cars")]
#[get("/all?<query..>")]
pub async fn list_cars(pool: &State<PgPool>, _rate_limit: RateLimit, query: CarSearchQuery) -> Result<Json<Vec<CarResponse>>, AppError> {
    let filter = CarFilter::try_from(query)?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let cars = CarService::new(&repo).search(&filter).await?;
    Ok(Json(cars.iter().map(CarResponse::from).collect()))
}

#[openapi(tag = "Cars")]
#[get("/my-cars")]
pub async fn my_cars(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser) -> Result<Json<Vec<CarResponse>>, AppError> {
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let cars = CarService::new(&repo).my_cars(&current_user.id).await?;
    Ok(Json(cars.iter().map(CarResponse::from).collect()))
}

/// Single car with its owner populated.
#[openapi(tag = "Cars")]
#[get("/<id>")]
pub async fn get_car(pool: &State<PgPool>, _rate_limit: RateLimit, id: &str) -> Result<Json<CarResponse>, AppError> {
    let car_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo).get_car(&car_id).await?;
    Ok(Json(CarResponse::from(&car)))
}

/// Flip a car between listed and hidden. Only the owner may do this.
#[openapi(tag = "Cars")]
#[put("/status/<id>")]
pub async fn toggle_car_status(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<CarStatusResponse>, AppError> {
    let car_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    let car = CarService::new(&repo).toggle_availability(&car_id, &current_user.id).await?;
    let message = if car.available { "Car is now available" } else { "Car is now unavailable" };
    Ok(Json(CarStatusResponse {
        message: message.to_string(),
        car: CarResponse::from(&car),
    }))
}

/// Remove a listing together with its bookings and reviews.
#[openapi(tag = "Cars")]
#[delete("/delete/<id>")]
pub async fn delete_car(pool: &State<PgPool>, _rate_limit: RateLimit, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let car_id = Uuid::parse_str(id).map_err(|e| AppError::uuid("Invalid car id", e))?;
    let repo = PostgresRepository { pool: pool.inner().clone() };
    CarService::new(&repo).delete_car(&car_id, &current_user.id).await?;
    Ok(Json(MessageResponse {
        message: "Car deleted".to_string(),
    }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![add_car, list_cars, my_cars, get_car, toggle_car_status, delete_car]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_dropped() {
        let filter = CarFilter::try_from(CarSearchQuery {
            location: Some("  ".to_string()),
            brand: Some(" Toyota ".to_string()),
            min_price: Some(20),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(filter.location, None);
        assert_eq!(filter.brand.as_deref(), Some("Toyota"));
        assert_eq!(filter.min_price, Some(20));
        assert_eq!(filter.fuel_type, None);
    }

    #[test]
    fn fuel_type_must_be_known() {
        let ok = CarFilter::try_from(CarSearchQuery {
            fuel_type: Some("Electric".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ok.fuel_type, Some(FuelType::Electric));

        let unknown = CarFilter::try_from(CarSearchQuery {
            fuel_type: Some("Steam".to_string()),
            ..Default::default()
        });
        assert!(matches!(unknown, Err(AppError::BadRequest(_))));
    }
}
