//! Notification repository

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::TimebankResult;
use crate::models::{Notification, NotificationKind};

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Notification {
        Notification {
            id: row.get("id"),
            user_id: row.get("user_id"),
            kind: row.get("kind"),
            content: row.get("content"),
            is_read: row.get("is_read"),
            created_at: row.get("created_at"),
        }
    }

    /// Store a notification for a user
    pub async fn insert(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        content: &str,
    ) -> TimebankResult<Notification> {
        let row = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, kind, content, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::from_row(&row))
    }

    /// List a user's notifications, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> TimebankResult<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, content, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::from_row).collect())
    }

    /// Mark one of the user's notifications as read
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> TimebankResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
