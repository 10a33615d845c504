//! Wallet and ledger transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Wallet entity, one per user. The balance is denominated in time-credits
/// (1 credit = 1 hour of service) with two decimal places.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// True iff the balance covers `amount`
    pub fn has_sufficient_balance(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Kind of a ledger movement, stored as TEXT in the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Reserved at confirmation, not yet settled
    Pending,
    /// Funds left the owning wallet
    Debit,
    /// Funds entered the owning wallet
    Credit,
}

/// Settlement state of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
}

/// Ledger transaction entity — an immutable record of a wallet movement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub reason: String,
    pub booking_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a ledger transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub wallet_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub reason: String,
    pub booking_id: Option<Uuid>,
    pub status: TransactionStatus,
}

/// Direct wallet-to-wallet transfer payload
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub receiver_id: Uuid,
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// Query parameters for the transaction history listing
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
    /// Filter: "earned" lists credits only, "spent" lists debits only
    #[serde(rename = "type")]
    pub filter: Option<String>,
}

/// Response for the transaction history listing with pagination
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<LedgerTransaction>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}
