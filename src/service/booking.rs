use crate::database::booking::BookingRepository;
use crate::database::car::CarRepository;
use crate::error::app_error::AppError;
use crate::models::booking::{Booking, BookingRequest, BookingStatus, NewBooking};
use crate::service::ownership::check_ownership;
use crate::service::pricing::compute_total;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingActor {
    Owner,
    Renter,
    /// The maintenance job.
    System,
}

/// Allowed status moves. Anything outside this table, including moving a
/// booking to the status it already has, is an `InvalidTransition`.
pub fn transition(from: BookingStatus, to: BookingStatus, actor: BookingActor) -> Result<(), AppError> {
    use BookingActor::*;
    use BookingStatus::*;

    let allowed = matches!(
        (actor, from, to),
        (Owner, Pending, Approved)
            | (Owner, Pending, Rejected)
            | (Owner, Approved, Completed)
            | (System, Approved, Completed)
            | (Renter, Pending, Cancelled)
            | (Renter, Approved, Cancelled)
    );

    if allowed { Ok(()) } else { Err(AppError::InvalidTransition { from, to }) }
}

pub struct BookingService<'a, R> {
    repository: &'a R,
}

impl<'a, R> BookingService<'a, R>
where
    R: BookingRepository + CarRepository,
{
    pub fn new(repository: &'a R) -> Self {
        BookingService { repository }
    }

    pub async fn create_booking(&self, renter_id: &Uuid, request: &BookingRequest) -> Result<Booking, AppError> {
        let car = self
            .repository
            .get_car_by_id(&request.car_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

        let owner_id = car
            .owner
            .as_ref()
            .and_then(|owner| owner.id())
            .ok_or_else(|| AppError::DataIntegrity(format!("car {} has no owner", car.id)))?;

        if !car.available {
            return Err(AppError::BadRequest("Car is not available for booking".to_string()));
        }

        let quote = compute_total(request.start_date, request.end_date, car.price_per_day)?;

        // Pricing tolerates a reversed range; storage always keeps start before end.
        let start_date = request.start_date.min(request.end_date);
        let end_date = request.start_date.max(request.end_date);

        let booking = self
            .repository
            .create_booking(&NewBooking {
                car_id: car.id,
                user_id: *renter_id,
                owner_id,
                start_date,
                end_date,
                total_price: quote.total,
                status: BookingStatus::Pending,
            })
            .await?;

        info!(
            booking_id = %booking.id,
            car_id = %car.id,
            renter_id = %renter_id,
            days = quote.days,
            total_price = quote.total,
            "booking created"
        );

        Ok(booking)
    }

    pub async fn list_for_renter(&self, renter_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_bookings_for_renter(renter_id).await
    }

    pub async fn list_for_owner(&self, owner_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        self.repository.list_bookings_for_owner(owner_id).await
    }

    /// Owner decision on a booking of one of their cars.
    pub async fn update_status(&self, booking_id: &Uuid, actor_id: &Uuid, status: BookingStatus) -> Result<Booking, AppError> {
        let booking = self.load(booking_id).await?;
        check_ownership(&booking, actor_id, "booking")?;
        transition(booking.status, status, BookingActor::Owner)?;
        self.persist(&booking, status).await
    }

    /// Renter withdraws a booking that has not finished yet.
    pub async fn cancel(&self, booking_id: &Uuid, actor_id: &Uuid) -> Result<Booking, AppError> {
        let booking = self.load(booking_id).await?;
        if booking.user.id() != Some(*actor_id) {
            warn!(actor_id = %actor_id, booking_id = %booking.id, "cancel attempted by someone other than the renter");
            return Err(AppError::Unauthorized);
        }

        transition(booking.status, BookingStatus::Cancelled, BookingActor::Renter)?;
        self.persist(&booking, BookingStatus::Cancelled).await
    }

    /// Marks approved bookings whose end date is before `now` as completed.
    pub async fn complete_finished(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        transition(BookingStatus::Approved, BookingStatus::Completed, BookingActor::System)?;
        let completed = self.repository.complete_finished_bookings(now).await?;
        info!(completed, cutoff = %now, "finished bookings completed");
        Ok(completed)
    }

    async fn load(&self, booking_id: &Uuid) -> Result<Booking, AppError> {
        self.repository
            .get_booking_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
    }

    async fn persist(&self, booking: &Booking, status: BookingStatus) -> Result<Booking, AppError> {
        let updated = self
            .repository
            .update_booking_status(&booking.id, status, booking.version)
            .await?
            .ok_or_else(|| AppError::Conflict("Booking was modified by another request".to_string()))?;

        info!(booking_id = %booking.id, from = %booking.status, to = %status, "booking status updated");
        Ok(updated)
    }
}
