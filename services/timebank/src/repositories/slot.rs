//! Availability slot repository

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{AvailabilitySlot, NewSlot};

/// Availability slot repository
#[derive(Clone)]
pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    /// Create a new slot repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> AvailabilitySlot {
        AvailabilitySlot {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            weekday: row.get("weekday"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
            is_booked: row.get("is_booked"),
        }
    }

    /// Create a new slot for its owner. Rejects inverted time windows and
    /// exact duplicates of an existing slot.
    pub async fn create(&self, owner_id: Uuid, new: &NewSlot) -> TimebankResult<AvailabilitySlot> {
        if !(0..=6).contains(&new.weekday) {
            return Err(TimebankError::Validation(
                "weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }
        if new.end_time <= new.start_time {
            return Err(TimebankError::Validation(
                "end time must be after start time".to_string(),
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO availability_slots (owner_id, weekday, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, weekday, start_time, end_time, is_booked
            "#,
        )
        .bind(owner_id)
        .bind(new.weekday)
        .bind(new.start_time)
        .bind(new.end_time)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TimebankError::Validation("an identical slot already exists".to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                TimebankError::NotFound("user")
            }
            _ => e.into(),
        })?;

        Ok(Self::from_row(&row))
    }

    /// Find a slot by ID
    pub async fn fetch(&self, id: Uuid) -> TimebankResult<Option<AvailabilitySlot>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, weekday, start_time, end_time, is_booked
            FROM availability_slots
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::from_row(&row)))
    }

    /// Fetch a slot and lock its row for the remainder of the transaction
    pub async fn fetch_locked(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> TimebankResult<Option<AvailabilitySlot>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, weekday, start_time, end_time, is_booked
            FROM availability_slots
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|row| Self::from_row(&row)))
    }

    /// List all slots owned by a user, ordered by weekday and start time
    pub async fn list_for_owner(&self, owner_id: Uuid) -> TimebankResult<Vec<AvailabilitySlot>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, weekday, start_time, end_time, is_booked
            FROM availability_slots
            WHERE owner_id = $1
            ORDER BY weekday, start_time
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Delete a slot. Ownership is checked by the calling layer.
    pub async fn delete(&self, id: Uuid) -> TimebankResult<bool> {
        let result = sqlx::query("DELETE FROM availability_slots WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a slot booked, but only if it is currently free. Returns false
    /// when the slot was already taken, so a concurrent booking attempt
    /// loses cleanly instead of double-booking.
    pub async fn reserve(&self, conn: &mut PgConnection, id: Uuid) -> TimebankResult<bool> {
        let result = sqlx::query(
            "UPDATE availability_slots SET is_booked = TRUE WHERE id = $1 AND is_booked = FALSE",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a slot free again. Idempotent: releasing a free slot is a no-op.
    pub async fn release(&self, conn: &mut PgConnection, id: Uuid) -> TimebankResult<()> {
        sqlx::query("UPDATE availability_slots SET is_booked = FALSE WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
