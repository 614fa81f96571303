use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingStatus, NewBooking};
use crate::models::car::CarSummary;
use crate::models::reference::Reference;
use crate::models::user::UserSummary;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait BookingRepository {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, AppError>;
    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError>;
    /// Renter view: car and owner contact details joined in, newest first.
    async fn list_bookings_for_renter(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError>;
    /// Owner view: renter and car joined in, newest first.
    async fn list_bookings_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Booking>, AppError>;
    async fn list_all_bookings(&self) -> Result<Vec<Booking>, AppError>;
    /// Writes `status` only if the row is still at `expected_version`.
    async fn update_booking_status(&self, id: &Uuid, status: BookingStatus, expected_version: i32) -> Result<Option<Booking>, AppError>;
    /// Whether `user_id` holds an approved or completed booking on `car_id`.
    async fn has_confirmed_booking(&self, user_id: &Uuid, car_id: &Uuid) -> Result<bool, AppError>;
    /// Moves approved bookings that ended before `now` to completed.
    async fn complete_finished_bookings(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Which references to return as joined records instead of bare ids.
#[derive(Debug, Clone, Copy, Default)]
struct Populate {
    car: bool,
    user: bool,
    owner: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    car_id: Uuid,
    car_brand: Option<String>,
    car_model: Option<String>,
    car_image_url: Option<String>,
    car_location: Option<String>,
    car_price_per_day: Option<i64>,
    user_id: Uuid,
    user_username: Option<String>,
    user_email: Option<String>,
    owner_id: Uuid,
    owner_username: Option<String>,
    owner_email: Option<String>,
    owner_phone: Option<String>,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    total_price: i64,
    status: String,
    version: i32,
    created_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self, populate: Populate) -> Result<Booking, AppError> {
        let status = BookingStatus::parse(&self.status).ok_or_else(|| AppError::DataIntegrity(format!("Unknown booking status: {}", self.status)))?;

        let car = match (populate.car, self.car_brand, self.car_model) {
            (true, Some(brand), Some(model)) => Reference::Populated(CarSummary {
                id: self.car_id,
                brand,
                model,
                image_url: self.car_image_url,
                location: self.car_location,
                price_per_day: self.car_price_per_day,
            }),
            _ => Reference::Id(self.car_id),
        };

        let user = match (populate.user, self.user_username) {
            (true, Some(username)) => Reference::Populated(UserSummary {
                id: self.user_id,
                username,
                email: self.user_email,
                phone: None,
            }),
            _ => Reference::Id(self.user_id),
        };

        let owner = match (populate.owner, self.owner_username) {
            (true, Some(username)) => Reference::Populated(UserSummary {
                id: self.owner_id,
                username,
                email: self.owner_email,
                phone: self.owner_phone,
            }),
            _ => Reference::Id(self.owner_id),
        };

        Ok(Booking {
            id: self.id,
            car,
            user,
            owner,
            start_date: self.start_date,
            end_date: self.end_date,
            total_price: self.total_price,
            status,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

fn into_bookings(rows: Vec<BookingRow>, populate: Populate) -> Result<Vec<Booking>, AppError> {
    rows.into_iter().map(|row| row.into_booking(populate)).collect()
}

// `b` is the booking row (or CTE); `c`, `r` and `o` are its car, renter and owner.
const BOOKING_SELECT_FIELDS: &str = r#"
    b.id,
    b.car_id,
    c.brand AS car_brand,
    c.model AS car_model,
    c.image_url AS car_image_url,
    c.location AS car_location,
    c.price_per_day AS car_price_per_day,
    b.user_id,
    r.username AS user_username,
    r.email AS user_email,
    b.owner_id,
    o.username AS owner_username,
    o.email AS owner_email,
    o.phone AS owner_phone,
    b.start_date,
    b.end_date,
    b.total_price,
    b.status,
    b.version,
    b.created_at
"#;

const BOOKING_JOINS: &str = r#"
    LEFT JOIN cars c ON c.id = b.car_id
    LEFT JOIN users r ON r.id = b.user_id
    LEFT JOIN users o ON o.id = b.owner_id
"#;

#[async_trait::async_trait]
impl BookingRepository for PostgresRepository {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking, AppError> {
        let query = format!(
            r#"
            WITH b AS (
                INSERT INTO bookings (car_id, user_id, owner_id, start_date, end_date, total_price, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT {BOOKING_SELECT_FIELDS}
            FROM b
            {BOOKING_JOINS}
            "#
        );

        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(booking.car_id)
            .bind(booking.user_id)
            .bind(booking.owner_id)
            .bind(booking.start_date)
            .bind(booking.end_date)
            .bind(booking.total_price)
            .bind(booking.status.as_str())
            .fetch_one(&self.pool)
            .await?;

        row.into_booking(Populate::default())
    }

    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError> {
        let query = format!("SELECT {BOOKING_SELECT_FIELDS} FROM bookings b {BOOKING_JOINS} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&query).bind(id).fetch_optional(&self.pool).await?;
        row.map(|row| row.into_booking(Populate::default())).transpose()
    }

    async fn list_bookings_for_renter(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        let query = format!("SELECT {BOOKING_SELECT_FIELDS} FROM bookings b {BOOKING_JOINS} WHERE b.user_id = $1 ORDER BY b.created_at DESC");
        let rows = sqlx::query_as::<_, BookingRow>(&query).bind(user_id).fetch_all(&self.pool).await?;
        into_bookings(
            rows,
            Populate {
                car: true,
                owner: true,
                ..Populate::default()
            },
        )
    }

    async fn list_bookings_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        let query = format!("SELECT {BOOKING_SELECT_FIELDS} FROM bookings b {BOOKING_JOINS} WHERE b.owner_id = $1 ORDER BY b.created_at DESC");
        let rows = sqlx::query_as::<_, BookingRow>(&query).bind(owner_id).fetch_all(&self.pool).await?;
        into_bookings(
            rows,
            Populate {
                car: true,
                user: true,
                ..Populate::default()
            },
        )
    }

    async fn list_all_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let query = format!("SELECT {BOOKING_SELECT_FIELDS} FROM bookings b {BOOKING_JOINS} ORDER BY b.created_at DESC");
        let rows = sqlx::query_as::<_, BookingRow>(&query).fetch_all(&self.pool).await?;
        into_bookings(rows, Populate::default())
    }

    async fn update_booking_status(&self, id: &Uuid, status: BookingStatus, expected_version: i32) -> Result<Option<Booking>, AppError> {
        let query = format!(
            r#"
            WITH b AS (
                UPDATE bookings
                SET status = $2, version = version + 1
                WHERE id = $1 AND version = $3
                RETURNING *
            )
            SELECT {BOOKING_SELECT_FIELDS}
            FROM b
            {BOOKING_JOINS}
            "#
        );

        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.into_booking(Populate::default())).transpose()
    }

    async fn has_confirmed_booking(&self, user_id: &Uuid, car_id: &Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bookings
                WHERE user_id = $1 AND car_id = $2 AND status IN ('approved', 'completed')
            )
            "#,
        )
        .bind(user_id)
        .bind(car_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn complete_finished_bookings(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'completed', version = version + 1
            WHERE status = 'approved' AND end_date < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
