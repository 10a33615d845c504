//! Review repository

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{Review, ReviewQuery};

/// Review repository
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Review {
        Review {
            id: row.get("id"),
            booking_id: row.get("booking_id"),
            reviewer_id: row.get("reviewer_id"),
            rating: row.get("rating"),
            comment: row.get("comment"),
            created_at: row.get("created_at"),
        }
    }

    /// Store a review. Each booking can be reviewed once.
    pub async fn insert(
        &self,
        booking_id: Uuid,
        reviewer_id: Uuid,
        rating: i16,
        comment: &str,
    ) -> TimebankResult<Review> {
        let row = sqlx::query(
            r#"
            INSERT INTO reviews (booking_id, reviewer_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, booking_id, reviewer_id, rating, comment, created_at
            "#,
        )
        .bind(booking_id)
        .bind(reviewer_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TimebankError::Validation("this booking has already been reviewed".to_string())
            }
            _ => e.into(),
        })?;

        Ok(Self::from_row(&row))
    }

    /// List reviews, optionally narrowed to one booking or to everything
    /// written about one provider
    pub async fn list(&self, query: &ReviewQuery) -> TimebankResult<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.booking_id, r.reviewer_id, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN bookings b ON b.id = r.booking_id
            WHERE ($1::uuid IS NULL OR r.booking_id = $1)
              AND ($2::uuid IS NULL OR b.booked_for = $2)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(query.booking_id)
        .bind(query.reviewed_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }
}
