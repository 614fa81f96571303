use crate::models::car::CarSummary;
use crate::models::reference::Reference;
use crate::models::user::UserSummary;
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Approved,
        BookingStatus::Rejected,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Approved and completed bookings count as confirmed business: they earn
    /// revenue and unlock reviews.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, BookingStatus::Approved | BookingStatus::Completed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub car: Reference<CarSummary>,
    /// The renter.
    pub user: Reference<UserSummary>,
    /// The car's owner at the time the booking was made.
    pub owner: Reference<UserSummary>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: i64,
    pub status: BookingStatus,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Row to insert; price and owner are already resolved.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub car_id: Uuid,
    pub user_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: i64,
    pub status: BookingStatus,
}

#[derive(Deserialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub car_id: Uuid,
    #[serde(deserialize_with = "deserialize_flexible_datetime")]
    #[schemars(with = "String")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_flexible_datetime")]
    #[schemars(with = "String")]
    pub end_date: DateTime<Utc>,
}

#[derive(Deserialize, Debug, JsonSchema)]
pub struct BookingStatusRequest {
    pub status: BookingStatus,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub car: Reference<CarSummary>,
    pub user: Reference<UserSummary>,
    pub owner: Reference<UserSummary>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            car: booking.car.clone(),
            user: booking.user.clone(),
            owner: booking.owner.clone(),
            start_date: booking.start_date,
            end_date: booking.end_date,
            total_price: booking.total_price,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct BookingCreatedResponse {
    pub message: String,
    pub booking: BookingResponse,
}

/// Parses either a calendar date (`2024-01-01`, taken as midnight UTC) or a
/// full RFC 3339 timestamp.
pub fn parse_flexible_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_datetime(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}
