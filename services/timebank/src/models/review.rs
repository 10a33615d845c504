//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review of a completed booking, written by the requester
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// New review payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// Query parameters for the review listing
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewQuery {
    pub booking_id: Option<Uuid>,
    /// Filter by the user who was reviewed (the booking's provider)
    pub reviewed_user_id: Option<Uuid>,
}
