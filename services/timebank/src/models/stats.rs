//! Aggregate user statistics model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user aggregates recomputed from completed bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStats {
    pub user_id: Uuid,
    /// Hours provided to others (as booked_for)
    pub hours_given: Decimal,
    /// Hours received from others (as booked_by)
    pub hours_received: Decimal,
    pub sessions_completed: i32,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for the leaderboard listing
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}
