//! Shared helpers for the integration tests
//!
//! These tests run against a real PostgreSQL instance (DATABASE_URL) and are
//! ignored by default.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use common::database::{DatabaseConfig, init_pool};
use timebank::MIGRATOR;
use timebank::ledger::Ledger;
use timebank::models::NewBooking;
use timebank::notifier::Notifier;
use timebank::orchestrator::BookingService;
use timebank::repositories::{
    BookingRepository, DirectoryRepository, NotificationRepository, ReviewRepository,
    SlotRepository, StatsRepository, TransactionRepository, WalletRepository,
};

/// Connect to the test database and apply migrations
pub async fn test_pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Wire a booking service over the given pool
pub fn service(pool: &PgPool) -> BookingService {
    let wallets = WalletRepository::new(pool.clone());
    let transactions = TransactionRepository::new(pool.clone());
    let ledger = Ledger::new(wallets.clone(), transactions.clone());
    let notifier = Notifier::new(NotificationRepository::new(pool.clone()));

    BookingService::new(
        pool.clone(),
        BookingRepository::new(pool.clone()),
        SlotRepository::new(pool.clone()),
        wallets,
        DirectoryRepository::new(pool.clone()),
        StatsRepository::new(pool.clone()),
        ReviewRepository::new(pool.clone()),
        ledger,
        notifier,
    )
}

/// Insert a user with a unique username and provision their wallet
pub async fn create_user(pool: &PgPool, prefix: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    let username = format!("{}-{}", prefix, Uuid::new_v4());
    let user_id: Uuid = sqlx::query_scalar("INSERT INTO users (username) VALUES ($1) RETURNING id")
        .bind(username)
        .fetch_one(pool)
        .await?;

    WalletRepository::new(pool.clone())
        .get_or_create(user_id)
        .await?;

    Ok(user_id)
}

/// Insert a skill with a unique name
pub async fn create_skill(pool: &PgPool) -> Result<Uuid, Box<dyn std::error::Error>> {
    let name = format!("skill-{}", Uuid::new_v4());
    let skill_id: Uuid = sqlx::query_scalar("INSERT INTO skills (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await?;

    Ok(skill_id)
}

/// Current wallet balance of a user
pub async fn balance_of(pool: &PgPool, user_id: Uuid) -> Result<Decimal, Box<dyn std::error::Error>> {
    let balance: Decimal = sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(balance)
}

/// Force a wallet balance, bypassing the ledger
pub async fn set_balance(
    pool: &PgPool,
    user_id: Uuid,
    balance: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    sqlx::query("UPDATE wallets SET balance = $2 WHERE user_id = $1")
        .bind(user_id)
        .bind(balance)
        .execute(pool)
        .await?;

    Ok(())
}

/// Number of ledger transactions linked to a booking
pub async fn transaction_count(
    pool: &PgPool,
    booking_id: Uuid,
) -> Result<i64, Box<dyn std::error::Error>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE booking_id = $1")
        .bind(booking_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// A valid booking payload scheduled for tomorrow
pub fn booking_payload(skill_id: Uuid, booked_for: Uuid, duration_minutes: i32) -> NewBooking {
    NewBooking {
        skill_id,
        booked_for,
        scheduled_time: Utc::now() + Duration::days(1),
        duration_minutes,
        availability_slot_id: None,
    }
}
