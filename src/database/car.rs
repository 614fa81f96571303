use crate::database::postgres_repository::{PostgresRepository, contains_pattern};
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarFilter, CarRequest, Coordinates, FuelType, Transmission};
use crate::models::reference::Reference;
use crate::models::user::UserSummary;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait CarRepository {
    async fn create_car(&self, owner_id: &Uuid, request: &CarRequest) -> Result<Car, AppError>;
    /// Loads the car with its owner as a bare id.
    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError>;
    /// Loads the car with its owner's public profile joined in.
    async fn get_car_with_owner(&self, id: &Uuid) -> Result<Option<Car>, AppError>;
    async fn list_available_cars(&self, filter: &CarFilter) -> Result<Vec<Car>, AppError>;
    async fn list_cars_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Car>, AppError>;
    async fn list_all_cars(&self) -> Result<Vec<Car>, AppError>;
    /// Writes `available` only if the row is still at `expected_version`.
    /// Returns `None` when another write got there first.
    async fn set_car_availability(&self, id: &Uuid, available: bool, expected_version: i32) -> Result<Option<Car>, AppError>;
    async fn delete_car(&self, id: &Uuid) -> Result<(), AppError>;
    async fn delete_cars_by_owner(&self, owner_id: &Uuid) -> Result<u64, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct CarRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    owner_username: Option<String>,
    owner_email: Option<String>,
    owner_phone: Option<String>,
    brand: String,
    model: String,
    year: i32,
    price_per_day: i64,
    capacity: i32,
    transmission: String,
    fuel_type: String,
    location: String,
    image_url: String,
    description: Option<String>,
    available: bool,
    lat: f64,
    lng: f64,
    version: i32,
    created_at: DateTime<Utc>,
}

impl CarRow {
    fn into_car(self, populate_owner: bool) -> Result<Car, AppError> {
        let owner = self.owner_id.map(|id| match (populate_owner, self.owner_username) {
            (true, Some(username)) => Reference::Populated(UserSummary {
                id,
                username,
                email: self.owner_email,
                phone: self.owner_phone,
            }),
            _ => Reference::Id(id),
        });

        Ok(Car {
            id: self.id,
            owner,
            brand: self.brand,
            model: self.model,
            year: self.year,
            price_per_day: self.price_per_day,
            capacity: self.capacity,
            transmission: transmission_from_db(&self.transmission)?,
            fuel_type: fuel_type_from_db(&self.fuel_type)?,
            location: self.location,
            image_url: self.image_url,
            description: self.description,
            available: self.available,
            coordinates: Coordinates { lat: self.lat, lng: self.lng },
            version: self.version,
            created_at: self.created_at,
        })
    }
}

fn into_cars(rows: Vec<CarRow>, populate_owner: bool) -> Result<Vec<Car>, AppError> {
    rows.into_iter().map(|row| row.into_car(populate_owner)).collect()
}

pub fn transmission_from_db(value: &str) -> Result<Transmission, AppError> {
    match value {
        "Automatic" => Ok(Transmission::Automatic),
        "Manual" => Ok(Transmission::Manual),
        other => Err(AppError::DataIntegrity(format!("Unknown transmission: {}", other))),
    }
}

pub fn fuel_type_from_db(value: &str) -> Result<FuelType, AppError> {
    FuelType::parse(value).ok_or_else(|| AppError::DataIntegrity(format!("Unknown fuel type: {}", value)))
}

// `c` is the car row (or CTE), `u` its owner.
const CAR_SELECT_FIELDS: &str = r#"
    c.id,
    c.owner_id,
    u.username AS owner_username,
    u.email AS owner_email,
    u.phone AS owner_phone,
    c.brand,
    c.model,
    c.year,
    c.price_per_day,
    c.capacity,
    c.transmission,
    c.fuel_type,
    c.location,
    c.image_url,
    c.description,
    c.available,
    c.lat,
    c.lng,
    c.version,
    c.created_at
"#;

#[async_trait::async_trait]
impl CarRepository for PostgresRepository {
    async fn create_car(&self, owner_id: &Uuid, request: &CarRequest) -> Result<Car, AppError> {
        let query = format!(
            r#"
            WITH c AS (
                INSERT INTO cars (owner_id, brand, model, year, price_per_day, capacity, transmission, fuel_type,
                                  location, image_url, description, lat, lng)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING *
            )
            SELECT {CAR_SELECT_FIELDS}
            FROM c
            LEFT JOIN users u ON u.id = c.owner_id
            "#
        );

        let row = sqlx::query_as::<_, CarRow>(&query)
            .bind(owner_id)
            .bind(&request.brand)
            .bind(&request.model)
            .bind(request.year)
            .bind(request.price_per_day)
            .bind(request.capacity)
            .bind(request.transmission.as_str())
            .bind(request.fuel_type.as_str())
            .bind(&request.location)
            .bind(&request.image_url)
            .bind(&request.description)
            .bind(request.lat)
            .bind(request.lng)
            .fetch_one(&self.pool)
            .await?;

        row.into_car(false)
    }

    async fn get_car_by_id(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        let query = format!("SELECT {CAR_SELECT_FIELDS} FROM cars c LEFT JOIN users u ON u.id = c.owner_id WHERE c.id = $1");
        let row = sqlx::query_as::<_, CarRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        row.map(|row| row.into_car(false)).transpose()
    }

    async fn get_car_with_owner(&self, id: &Uuid) -> Result<Option<Car>, AppError> {
        let query = format!("SELECT {CAR_SELECT_FIELDS} FROM cars c LEFT JOIN users u ON u.id = c.owner_id WHERE c.id = $1");
        let row = sqlx::query_as::<_, CarRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        row.map(|row| row.into_car(true)).transpose()
    }

    async fn list_available_cars(&self, filter: &CarFilter) -> Result<Vec<Car>, AppError> {
        let query = format!(
            r#"
            SELECT {CAR_SELECT_FIELDS}
            FROM cars c
            LEFT JOIN users u ON u.id = c.owner_id
            WHERE c.available = TRUE
              AND ($1::text IS NULL OR c.location ILIKE $1)
              AND ($2::text IS NULL OR c.brand ILIKE $2)
              AND ($3::bigint IS NULL OR c.price_per_day >= $3)
              AND ($4::bigint IS NULL OR c.price_per_day <= $4)
              AND ($5::text IS NULL OR c.fuel_type = $5)
            ORDER BY c.created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, CarRow>(&query)
            .bind(filter.location.as_deref().map(contains_pattern))
            .bind(filter.brand.as_deref().map(contains_pattern))
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(filter.fuel_type.map(|fuel| fuel.as_str()))
            .fetch_all(&self.pool)
            .await?;

        into_cars(rows, false)
    }

    async fn list_cars_by_owner(&self, owner_id: &Uuid) -> Result<Vec<Car>, AppError> {
        let query = format!(
            "SELECT {CAR_SELECT_FIELDS} FROM cars c LEFT JOIN users u ON u.id = c.owner_id WHERE c.owner_id = $1 ORDER BY c.created_at DESC"
        );
        let rows = sqlx::query_as::<_, CarRow>(&query).bind(owner_id).fetch_all(&self.pool).await?;
        into_cars(rows, false)
    }

    async fn list_all_cars(&self) -> Result<Vec<Car>, AppError> {
        let query = format!("SELECT {CAR_SELECT_FIELDS} FROM cars c LEFT JOIN users u ON u.id = c.owner_id ORDER BY c.created_at DESC");
        let rows = sqlx::query_as::<_, CarRow>(&query).fetch_all(&self.pool).await?;
        into_cars(rows, false)
    }

    async fn set_car_availability(&self, id: &Uuid, available: bool, expected_version: i32) -> Result<Option<Car>, AppError> {
        let query = format!(
            r#"
            WITH c AS (
                UPDATE cars
                SET available = $2, version = version + 1
                WHERE id = $1 AND version = $3
                RETURNING *
            )
            SELECT {CAR_SELECT_FIELDS}
            FROM c
            LEFT JOIN users u ON u.id = c.owner_id
            "#
        );

        let row = sqlx::query_as::<_, CarRow>(&query)
            .bind(id)
            .bind(available)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.into_car(false)).transpose()
    }

    async fn delete_car(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cars WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_cars_by_owner(&self, owner_id: &Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cars WHERE owner_id = $1").bind(owner_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
