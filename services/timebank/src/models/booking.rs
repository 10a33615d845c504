//! Booking model and status definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle states of a booking, stored as TEXT in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled bookings can never change status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub booked_by: Uuid,
    pub booked_for: Uuid,
    pub status: BookingStatus,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub cancel_reason: Option<String>,
    pub availability_slot_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// New booking creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub skill_id: Uuid,
    pub booked_for: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub availability_slot_id: Option<Uuid>,
}

/// Status transition payload
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChange {
    pub status: BookingStatus,
    pub cancel_reason: Option<String>,
}

/// Reschedule payload
#[derive(Debug, Clone, Deserialize)]
pub struct Reschedule {
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
}
