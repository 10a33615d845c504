//! Application state shared across handlers

use sqlx::PgPool;

use crate::orchestrator::BookingService;
use crate::repositories::{
    BookingRepository, DirectoryRepository, NotificationRepository, ReviewRepository,
    SlotRepository, StatsRepository, TransactionRepository, WalletRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub booking_service: BookingService,
    pub bookings: BookingRepository,
    pub slots: SlotRepository,
    pub wallets: WalletRepository,
    pub transactions: TransactionRepository,
    pub stats: StatsRepository,
    pub notifications: NotificationRepository,
    pub reviews: ReviewRepository,
    pub directory: DirectoryRepository,
}
