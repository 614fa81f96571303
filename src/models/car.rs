use crate::models::reference::{Identified, Reference};
use crate::models::user::UserSummary;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema)]
pub enum Transmission {
    #[default]
    Automatic,
    Manual,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Default, JsonSchema)]
pub enum FuelType {
    #[default]
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Automatic => "Automatic",
            Transmission::Manual => "Manual",
        }
    }
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Petrol => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Electric => "Electric",
            FuelType::Hybrid => "Hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Petrol" => Some(FuelType::Petrol),
            "Diesel" => Some(FuelType::Diesel),
            "Electric" => Some(FuelType::Electric),
            "Hybrid" => Some(FuelType::Hybrid),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Default, JsonSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Car {
    pub id: Uuid,
    /// Absent only for legacy rows whose owner was removed outside the API.
    pub owner: Option<Reference<UserSummary>>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: i64,
    pub capacity: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub location: String,
    pub image_url: String,
    pub description: Option<String>,
    pub available: bool,
    pub coordinates: Coordinates,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// The slice of a car that is joined into booking listings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_day: Option<i64>,
}

impl Identified for CarSummary {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<&Car> for CarSummary {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            brand: car.brand.clone(),
            model: car.model.clone(),
            image_url: Some(car.image_url.clone()),
            location: Some(car.location.clone()),
            price_per_day: Some(car.price_per_day),
        }
    }
}

/// New listing. The image itself is uploaded out of band; only its URL arrives here.
#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarRequest {
    #[validate(length(min = 1, max = 50))]
    pub brand: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
    #[validate(range(min = 1))]
    pub price_per_day: i64,
    #[validate(range(min = 1, max = 60))]
    pub capacity: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    #[validate(length(min = 1, max = 120))]
    pub location: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl CarRequest {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lng: self.lng }
    }
}

/// Public search filters; every field is optional and they combine with AND.
#[derive(Debug, Clone, Default)]
pub struct CarFilter {
    pub location: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub fuel_type: Option<FuelType>,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarResponse {
    pub id: Uuid,
    pub owner: Option<Reference<UserSummary>>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: i64,
    pub capacity: i32,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    pub location: String,
    pub image_url: String,
    pub description: Option<String>,
    pub available: bool,
    pub coordinates: Coordinates,
    pub created_at: DateTime<Utc>,
}

impl From<&Car> for CarResponse {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            owner: car.owner.clone(),
            brand: car.brand.clone(),
            model: car.model.clone(),
            year: car.year,
            price_per_day: car.price_per_day,
            capacity: car.capacity,
            transmission: car.transmission,
            fuel_type: car.fuel_type,
            location: car.location.clone(),
            image_url: car.image_url.clone(),
            description: car.description.clone(),
            available: car.available,
            coordinates: car.coordinates,
            created_at: car.created_at,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct CarStatusResponse {
    pub message: String,
    pub car: CarResponse,
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}
