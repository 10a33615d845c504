//! User and skill directory repository
//!
//! The timebank core treats identity and the skill catalog as external
//! collaborators: it registers users (to provision wallets) and otherwise
//! only reads. Skills are never created here.

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{NewUser, User};

/// User and skill directory repository
#[derive(Clone)]
pub struct DirectoryRepository {
    pool: PgPool,
}

impl DirectoryRepository {
    /// Create a new directory repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &PgRow) -> User {
        User {
            id: row.get("id"),
            username: row.get("username"),
            created_at: row.get("created_at"),
        }
    }

    /// Register a new user
    pub async fn create_user(&self, new: &NewUser) -> TimebankResult<User> {
        if new.username.trim().is_empty() {
            return Err(TimebankError::Validation(
                "username is required".to_string(),
            ));
        }

        info!("Registering new user: {}", new.username);

        let row = sqlx::query(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id, username, created_at
            "#,
        )
        .bind(&new.username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TimebankError::Validation("username is already taken".to_string())
            }
            _ => e.into(),
        })?;

        Ok(Self::user_from_row(&row))
    }

    /// Find a user by ID
    pub async fn fetch_user(&self, id: Uuid) -> TimebankResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::user_from_row(&row)))
    }

    /// True iff the user exists
    pub async fn user_exists(&self, conn: &mut PgConnection, id: Uuid) -> TimebankResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists)
    }

    /// True iff the skill exists
    pub async fn skill_exists(&self, conn: &mut PgConnection, id: Uuid) -> TimebankResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM skills WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists)
    }
}
