use crate::database::car::CarRepository;
use crate::error::app_error::AppError;
use crate::models::car::{Car, CarFilter, CarRequest};
use crate::models::user::Role;
use crate::service::ownership::check_ownership;
use tracing::{info, warn};
use uuid::Uuid;

pub struct CarService<'a, R> {
    repository: &'a R,
}

impl<'a, R> CarService<'a, R>
where
    R: CarRepository,
{
    pub fn new(repository: &'a R) -> Self {
        CarService { repository }
    }

    pub async fn add_car(&self, owner_id: &Uuid, role: Role, request: &CarRequest) -> Result<Car, AppError> {
        if role == Role::Renter {
            warn!(user_id = %owner_id, "renter attempted to list a car");
            return Err(AppError::Forbidden("Only owners can list cars".to_string()));
        }

        if !request.coordinates().is_valid() {
            return Err(AppError::BadRequest("Coordinates must be finite, with lat in [-90, 90] and lng in [-180, 180]".to_string()));
        }

        let car = self.repository.create_car(owner_id, request).await?;
        info!(car_id = %car.id, owner_id = %owner_id, "car listed");
        Ok(car)
    }

    pub async fn get_car(&self, id: &Uuid) -> Result<Car, AppError> {
        self.repository
            .get_car_with_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".to_string()))
    }

    pub async fn search(&self, filter: &CarFilter) -> Result<Vec<Car>, AppError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price)
            && min > max
        {
            return Err(AppError::BadRequest("min_price must not exceed max_price".to_string()));
        }

        self.repository.list_available_cars(filter).await
    }

    pub async fn my_cars(&self, owner_id: &Uuid) -> Result<Vec<Car>, AppError> {
        self.repository.list_cars_by_owner(owner_id).await
    }

    /// Flips `available` for a car the actor owns.
    pub async fn toggle_availability(&self, car_id: &Uuid, actor_id: &Uuid) -> Result<Car, AppError> {
        let car = self.load_owned(car_id, actor_id).await?;

        let updated = self
            .repository
            .set_car_availability(&car.id, !car.available, car.version)
            .await?
            .ok_or_else(|| AppError::Conflict("Car was modified by another request".to_string()))?;

        info!(car_id = %car.id, available = updated.available, "car availability toggled");
        Ok(updated)
    }

    pub async fn delete_car(&self, car_id: &Uuid, actor_id: &Uuid) -> Result<(), AppError> {
        let car = self.load_owned(car_id, actor_id).await?;
        self.repository.delete_car(&car.id).await?;
        info!(car_id = %car.id, owner_id = %actor_id, "car deleted");
        Ok(())
    }

    async fn load_owned(&self, car_id: &Uuid, actor_id: &Uuid) -> Result<Car, AppError> {
        let car = self
            .repository
            .get_car_by_id(car_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Car not found".to_string()))?;

        if car.owner.as_ref().and_then(|owner| owner.id()).is_none() {
            return Err(AppError::DataIntegrity(format!("car {} has no owner", car.id)));
        }

        check_ownership(&car, actor_id, "car")?;
        Ok(car)
    }
}
