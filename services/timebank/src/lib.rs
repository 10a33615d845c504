//! Timebank service
//!
//! Users exchange services for time-credits (1 credit = 1 hour). The core of
//! the service is the booking lifecycle — pending, confirmed, completed or
//! cancelled — and the wallet ledger that reserves credits at confirmation
//! and settles them at completion, atomically and under row-level locking.

pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod notifier;
pub mod orchestrator;
pub mod repositories;
pub mod routes;
pub mod state;

/// Schema migrations embedded from `migrations/`
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
