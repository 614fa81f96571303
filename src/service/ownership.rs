use crate::error::app_error::AppError;
use crate::models::booking::Booking;
use crate::models::car::Car;
use tracing::warn;
use uuid::Uuid;

/// A record that belongs to exactly one user.
pub trait Owned {
    /// Canonical owner id, or `None` when the owner is missing or unusable.
    fn owner_id(&self) -> Option<Uuid>;
}

impl Owned for Car {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner.as_ref().and_then(|owner| owner.id())
    }
}

impl Owned for Booking {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner.id()
    }
}

/// Whether `actor_id` owns `resource`. Never errors: a missing owner, a
/// missing actor or a nil id all mean "not the owner".
pub fn is_owner<T: Owned + ?Sized>(resource: &T, actor_id: Option<&Uuid>) -> bool {
    match (resource.owner_id(), actor_id) {
        (Some(owner), Some(actor)) => !actor.is_nil() && owner == *actor,
        _ => false,
    }
}

pub fn check_ownership<T: Owned + ?Sized>(resource: &T, actor_id: &Uuid, resource_kind: &str) -> Result<(), AppError> {
    if is_owner(resource, Some(actor_id)) {
        return Ok(());
    }

    warn!(actor_id = %actor_id, resource = resource_kind, "ownership check failed");
    Err(AppError::Unauthorized)
}
