use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentalQuote {
    pub days: i64,
    pub total: i64,
}

/// Whole rental days between two instants, rounded half away from zero.
/// Order does not matter.
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let millis = (end - start).num_milliseconds().saturating_abs();
    (millis + MILLIS_PER_DAY / 2) / MILLIS_PER_DAY
}

pub fn compute_total(start: DateTime<Utc>, end: DateTime<Utc>, daily_rate: i64) -> Result<RentalQuote, AppError> {
    if daily_rate <= 0 {
        return Err(AppError::InvalidRange(format!("daily rate must be positive, got {daily_rate}")));
    }

    let days = rental_days(start, end);
    if days <= 0 {
        return Err(AppError::InvalidRange("rental must last at least one day".to_string()));
    }

    let total = days
        .checked_mul(daily_rate)
        .ok_or_else(|| AppError::InvalidRange("rental total is too large".to_string()))?;

    Ok(RentalQuote { days, total })
}
