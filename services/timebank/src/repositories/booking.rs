//! Booking repository for database operations

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{Booking, BookingStatus, NewBooking};

/// Booking repository
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Booking {
        Booking {
            id: row.get("id"),
            skill_id: row.get("skill_id"),
            booked_by: row.get("booked_by"),
            booked_for: row.get("booked_for"),
            status: row.get("status"),
            scheduled_time: row.get("scheduled_time"),
            duration_minutes: row.get("duration_minutes"),
            cancel_reason: row.get("cancel_reason"),
            availability_slot_id: row.get("availability_slot_id"),
            created_at: row.get("created_at"),
        }
    }

    /// Insert a new booking in the pending state
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        booked_by: Uuid,
        new: &NewBooking,
    ) -> TimebankResult<Booking> {
        let row = sqlx::query(
            r#"
            INSERT INTO bookings
                (skill_id, booked_by, booked_for, status, scheduled_time,
                 duration_minutes, availability_slot_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, skill_id, booked_by, booked_for, status, scheduled_time,
                      duration_minutes, cancel_reason, availability_slot_id, created_at
            "#,
        )
        .bind(new.skill_id)
        .bind(booked_by)
        .bind(new.booked_for)
        .bind(BookingStatus::Pending)
        .bind(new.scheduled_time)
        .bind(new.duration_minutes)
        .bind(new.availability_slot_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                match db.constraint() {
                    Some(c) if c.contains("skill") => TimebankError::NotFound("skill"),
                    _ => TimebankError::NotFound("user"),
                }
            }
            _ => e.into(),
        })?;

        Ok(Self::from_row(&row))
    }

    /// Find a booking by ID
    pub async fn fetch(&self, id: Uuid) -> TimebankResult<Option<Booking>> {
        let row = sqlx::query(
            r#"
            SELECT id, skill_id, booked_by, booked_for, status, scheduled_time,
                   duration_minutes, cancel_reason, availability_slot_id, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::from_row(&row)))
    }

    /// Fetch a booking and lock its row for the remainder of the
    /// transaction, serializing concurrent transitions on the same booking
    pub async fn fetch_for_update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> TimebankResult<Booking> {
        let row = sqlx::query(
            r#"
            SELECT id, skill_id, booked_by, booked_for, status, scheduled_time,
                   duration_minutes, cancel_reason, availability_slot_id, created_at
            FROM bookings
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TimebankError::NotFound("booking"))?;

        Ok(Self::from_row(&row))
    }

    /// List all bookings a user is a party to, newest scheduled first
    pub async fn list_for_user(&self, user_id: Uuid) -> TimebankResult<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, skill_id, booked_by, booked_for, status, scheduled_time,
                   duration_minutes, cancel_reason, availability_slot_id, created_at
            FROM bookings
            WHERE booked_by = $1 OR booked_for = $1
            ORDER BY scheduled_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Persist a status change. The cancel reason is stored when cancelling
    /// and cleared on every other transition.
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: BookingStatus,
        cancel_reason: Option<&str>,
    ) -> TimebankResult<()> {
        sqlx::query("UPDATE bookings SET status = $2, cancel_reason = $3 WHERE id = $1")
            .bind(id)
            .bind(status)
            .bind(cancel_reason)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Persist a new scheduled time and duration
    pub async fn set_schedule(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        scheduled_time: DateTime<Utc>,
        duration_minutes: i32,
    ) -> TimebankResult<()> {
        sqlx::query("UPDATE bookings SET scheduled_time = $2, duration_minutes = $3 WHERE id = $1")
            .bind(id)
            .bind(scheduled_time)
            .bind(duration_minutes)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
