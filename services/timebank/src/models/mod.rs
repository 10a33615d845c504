//! Data models for the timebank service

pub mod booking;
pub mod notification;
pub mod review;
pub mod slot;
pub mod stats;
pub mod user;
pub mod wallet;

pub use booking::{Booking, BookingStatus, NewBooking, Reschedule, StatusChange};
pub use notification::{Notification, NotificationKind};
pub use review::{NewReview, Review, ReviewQuery};
pub use slot::{AvailabilitySlot, NewSlot};
pub use stats::{LeaderboardQuery, UserStats};
pub use user::{NewUser, User};
pub use wallet::{
    HistoryQuery, HistoryResponse, LedgerTransaction, NewTransaction, TransactionKind,
    TransactionStatus, TransferRequest, Wallet,
};
