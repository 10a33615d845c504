//! Repositories for database operations
//!
//! One repository per entity. Simple reads go through the shared pool;
//! operations the orchestrator must compose atomically take an explicit
//! `&mut PgConnection` so they run inside a single transaction.

pub mod booking;
pub mod directory;
pub mod notification;
pub mod review;
pub mod slot;
pub mod stats;
pub mod transaction;
pub mod wallet;

pub use booking::BookingRepository;
pub use directory::DirectoryRepository;
pub use notification::NotificationRepository;
pub use review::ReviewRepository;
pub use slot::SlotRepository;
pub use stats::StatsRepository;
pub use transaction::TransactionRepository;
pub use wallet::WalletRepository;
