use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Counts and revenue for one scope. Recomputed on every read.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_cars: i64,
    pub total_bookings: i64,
    pub pending: i64,
    /// Approved plus completed bookings.
    pub confirmed: i64,
    /// Sum of `totalPrice` over confirmed bookings.
    pub revenue: i64,
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub total_users: i64,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InsightView {
    #[default]
    Dashboard,
    Bookings,
    Cars,
}

impl InsightView {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboard" => Some(InsightView::Dashboard),
            "bookings" => Some(InsightView::Bookings),
            "cars" => Some(InsightView::Cars),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
pub struct InsightResponse {
    pub prompt: String,
    pub insight: String,
}
