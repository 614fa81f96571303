use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::reference::Reference;
use crate::models::review::{Review, ReviewRequest};
use crate::models::user::UserSummary;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait ReviewRepository {
    async fn create_review(&self, user_id: &Uuid, request: &ReviewRequest) -> Result<Review, AppError>;
    /// Reviews for a car with the author's username joined in, newest first.
    async fn list_reviews_for_car(&self, car_id: &Uuid) -> Result<Vec<Review>, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    car_id: Uuid,
    user_id: Uuid,
    user_username: Option<String>,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        let user = match row.user_username {
            Some(username) => Reference::Populated(UserSummary {
                id: row.user_id,
                username,
                email: None,
                phone: None,
            }),
            None => Reference::Id(row.user_id),
        };

        Review {
            id: row.id,
            car_id: row.car_id,
            user,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl ReviewRepository for PostgresRepository {
    async fn create_review(&self, user_id: &Uuid, request: &ReviewRequest) -> Result<Review, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            WITH v AS (
                INSERT INTO reviews (car_id, user_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT v.id, v.car_id, v.user_id, NULL::text AS user_username, v.rating, v.comment, v.created_at
            FROM v
            "#,
        )
        .bind(request.car_id)
        .bind(user_id)
        .bind(request.rating)
        .bind(&request.comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_reviews_for_car(&self, car_id: &Uuid) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT v.id, v.car_id, v.user_id, u.username AS user_username, v.rating, v.comment, v.created_at
            FROM reviews v
            LEFT JOIN users u ON u.id = v.user_id
            WHERE v.car_id = $1
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(car_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }
}
