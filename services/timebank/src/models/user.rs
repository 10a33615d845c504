//! User directory model
//!
//! The timebank core does not own user identity; this is the minimal shadow
//! of the user directory it needs for wallet provisioning and foreign keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// New user registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
}
