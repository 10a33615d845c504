//! Availability slot model

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A provider's bookable weekly time window
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

/// New slot creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewSlot {
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
