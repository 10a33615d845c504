//! User statistics repository
//!
//! Aggregates are recomputed from completed bookings rather than maintained
//! incrementally, so a recompute always converges on the source data.

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::TimebankResult;
use crate::models::{BookingStatus, UserStats};

/// User statistics repository
#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    /// Create a new stats repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> UserStats {
        UserStats {
            user_id: row.get("user_id"),
            hours_given: row.get("hours_given"),
            hours_received: row.get("hours_received"),
            sessions_completed: row.get("sessions_completed"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Recompute a user's aggregates from completed bookings and upsert the
    /// result
    pub async fn recompute(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> TimebankResult<UserStats> {
        let given = sqlx::query(
            r#"
            SELECT COALESCE(SUM(ROUND(duration_minutes::numeric / 60, 2)), 0) AS hours,
                   COUNT(*) AS sessions
            FROM bookings
            WHERE booked_for = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(BookingStatus::Completed)
        .fetch_one(&mut *conn)
        .await?;

        let hours_given: Decimal = given.get("hours");
        let sessions: i64 = given.get("sessions");

        let hours_received: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(ROUND(duration_minutes::numeric / 60, 2)), 0)
            FROM bookings
            WHERE booked_by = $1 AND status = $2
            "#,
        )
        .bind(user_id)
        .bind(BookingStatus::Completed)
        .fetch_one(&mut *conn)
        .await?;

        let row = sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, hours_given, hours_received, sessions_completed, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id) DO UPDATE
                SET hours_given = EXCLUDED.hours_given,
                    hours_received = EXCLUDED.hours_received,
                    sessions_completed = EXCLUDED.sessions_completed,
                    updated_at = now()
            RETURNING user_id, hours_given, hours_received, sessions_completed, updated_at
            "#,
        )
        .bind(user_id)
        .bind(hours_given)
        .bind(hours_received)
        .bind(sessions as i32)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Self::from_row(&row))
    }

    /// Top providers by hours given
    pub async fn leaderboard(&self, limit: u32) -> TimebankResult<Vec<UserStats>> {
        let limit = limit.clamp(1, 100);

        let rows = sqlx::query(
            r#"
            SELECT user_id, hours_given, hours_received, sessions_completed, updated_at
            FROM user_stats
            ORDER BY hours_given DESC, sessions_completed DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }
}
