use chrono::{DateTime, Utc};

use serde::Serialize;

use uuid::Uuid;

/// New membership plan request
#[derive(Debug)]
pub struct NewMembership {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub duration_days: i32,
    pub has_coach: bool,
    pub has_workout_plan: bool,
    pub has_nutrition_plan: bool,
}

/// Stored membership plan
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price in whole currency units
    pub price: i64,
    /// Length of a subscription bought against this plan
    pub duration_days: i32,
    pub has_coach: bool,
    pub has_workout_plan: bool,
    pub has_nutrition_plan: bool,
    /// Inactive plans are kept for history but cannot be subscribed to
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
