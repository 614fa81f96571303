use crate::models::reference::Reference;
use crate::models::user::UserSummary;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub car_id: Uuid,
    pub user: Reference<UserSummary>,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub car_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    #[validate(length(min = 1, max = 1000))]
    pub comment: String,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub car: Uuid,
    pub user: Reference<UserSummary>,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Review> for ReviewResponse {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            car: review.car_id,
            user: review.user.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: review.created_at,
        }
    }
}
