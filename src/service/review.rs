use crate::database::booking::BookingRepository;
use crate::database::car::CarRepository;
use crate::database::review::ReviewRepository;
use crate::error::app_error::AppError;
use crate::models::review::{Review, ReviewRequest};
use tracing::{info, warn};
use uuid::Uuid;

pub const BOOKING_REQUIRED: &str = "You must rent this car first to leave a review.";

pub struct ReviewService<'a, R> {
    repository: &'a R,
}

impl<'a, R> ReviewService<'a, R>
where
    R: ReviewRepository + BookingRepository + CarRepository,
{
    pub fn new(repository: &'a R) -> Self {
        ReviewService { repository }
    }

    /// Only renters with an approved or completed booking on the car may review it.
    pub async fn add_review(&self, user_id: &Uuid, request: &ReviewRequest) -> Result<Review, AppError> {
        if self.repository.get_car_by_id(&request.car_id).await?.is_none() {
            return Err(AppError::NotFound("Car not found".to_string()));
        }

        if !self.repository.has_confirmed_booking(user_id, &request.car_id).await? {
            warn!(user_id = %user_id, car_id = %request.car_id, "review without a confirmed booking");
            return Err(AppError::Forbidden(BOOKING_REQUIRED.to_string()));
        }

        let review = self.repository.create_review(user_id, request).await?;
        info!(review_id = %review.id, car_id = %request.car_id, rating = review.rating, "review added");
        Ok(review)
    }

    pub async fn list_for_car(&self, car_id: &Uuid) -> Result<Vec<Review>, AppError> {
        self.repository.list_reviews_for_car(car_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;
    use crate::test_utils::{MockRepository, sample_booking, sample_car};

    fn review_of(car_id: Uuid) -> ReviewRequest {
        ReviewRequest {
            car_id,
            rating: 4,
            comment: "Smooth pickup".to_string(),
        }
    }

    #[tokio::test]
    async fn review_without_booking_is_forbidden() {
        let repo = MockRepository::default();
        let car = repo.insert_car(sample_car(Uuid::new_v4(), 30));

        let result = ReviewService::new(&repo).add_review(&Uuid::new_v4(), &review_of(car.id)).await;

        assert!(matches!(result, Err(AppError::Forbidden(message)) if message == BOOKING_REQUIRED));
    }

    #[tokio::test]
    async fn pending_booking_does_not_unlock_reviews() {
        let renter = Uuid::new_v4();
        let repo = MockRepository::default();
        let car = repo.insert_car(sample_car(Uuid::new_v4(), 30));
        repo.insert_booking(sample_booking(&car, renter, BookingStatus::Pending));

        let result = ReviewService::new(&repo).add_review(&renter, &review_of(car.id)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn completed_booking_unlocks_reviews() {
        let renter = Uuid::new_v4();
        let repo = MockRepository::default();
        let car = repo.insert_car(sample_car(Uuid::new_v4(), 30));
        repo.insert_booking(sample_booking(&car, renter, BookingStatus::Completed));
        let service = ReviewService::new(&repo);

        let review = service.add_review(&renter, &review_of(car.id)).await.unwrap();
        assert_eq!(review.car_id, car.id);

        let reviews = service.list_for_car(&car.id).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].user.id(), Some(renter));
    }

    #[tokio::test]
    async fn unknown_car_is_not_found() {
        let repo = MockRepository::default();
        let result = ReviewService::new(&repo).add_review(&Uuid::new_v4(), &review_of(Uuid::new_v4())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
