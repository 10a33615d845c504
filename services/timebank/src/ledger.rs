//! Time-credit ledger operations
//!
//! Every operation here runs on a caller-provided connection inside an open
//! transaction, so a failure at any point rolls the whole booking transition
//! back. Wallet pairs are always locked in ascending user-id order.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{Booking, NewTransaction, TransactionKind, TransactionStatus};
use crate::repositories::{TransactionRepository, WalletRepository};

/// Ledger facade coordinating wallets and transaction records
#[derive(Clone)]
pub struct Ledger {
    wallets: WalletRepository,
    transactions: TransactionRepository,
}

impl Ledger {
    /// Create a new ledger
    pub fn new(wallets: WalletRepository, transactions: TransactionRepository) -> Self {
        Self {
            wallets,
            transactions,
        }
    }

    /// Convert a duration in minutes into time-credits (hours, two decimal
    /// places)
    pub fn hours_for_duration(duration_minutes: i32) -> Decimal {
        (Decimal::from(duration_minutes) / Decimal::from(60)).round_dp(2)
    }

    /// Reserve the price of a booking at confirmation time.
    ///
    /// Verifies the requester's wallet covers the booking and records one
    /// pending transaction; no funds move yet.
    pub async fn open_pending(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
    ) -> TimebankResult<()> {
        let amount = Self::hours_for_duration(booking.duration_minutes);

        let wallet = self.wallets.lock_by_user(conn, booking.booked_by).await?;
        if !wallet.has_sufficient_balance(amount) {
            return Err(TimebankError::InsufficientFunds {
                required: amount,
                available: wallet.balance,
            });
        }

        self.transactions
            .insert(
                conn,
                &NewTransaction {
                    wallet_id: wallet.id,
                    sender_id: booking.booked_by,
                    receiver_id: booking.booked_for,
                    kind: TransactionKind::Pending,
                    amount,
                    reason: "Booking confirmed".to_string(),
                    booking_id: Some(booking.id),
                    status: TransactionStatus::Pending,
                },
            )
            .await?;

        Ok(())
    }

    /// Settle a booking at completion time.
    ///
    /// Moves the pending amount from the requester's wallet to the
    /// provider's, converts the pending record into a debit, and writes the
    /// paired credit record. A missing pending transaction means the stored
    /// state is corrupt.
    pub async fn settle_on_completion(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
    ) -> TimebankResult<Decimal> {
        let pending = self
            .transactions
            .find_pending_for_booking(conn, booking.id)
            .await?
            .ok_or_else(|| {
                error!(
                    booking_id = %booking.id,
                    "no pending transaction found at completion"
                );
                TimebankError::Integrity(format!(
                    "no pending transaction for booking {}",
                    booking.id
                ))
            })?;

        let (payer, payee) = self
            .wallets
            .lock_pair(conn, booking.booked_by, booking.booked_for)
            .await?;

        self.wallets.deduct(conn, payer.id, pending.amount).await?;
        self.wallets.credit(conn, payee.id, pending.amount).await?;

        self.transactions.settle_pending(conn, pending.id).await?;
        self.transactions
            .insert(
                conn,
                &NewTransaction {
                    wallet_id: payee.id,
                    sender_id: booking.booked_by,
                    receiver_id: booking.booked_for,
                    kind: TransactionKind::Credit,
                    amount: pending.amount,
                    reason: "Booking completed".to_string(),
                    booking_id: Some(booking.id),
                    status: TransactionStatus::Completed,
                },
            )
            .await?;

        Ok(pending.amount)
    }

    /// Drop the pending reservation for a cancelled booking. No funds have
    /// moved, so there is nothing to reverse.
    pub async fn void_on_cancellation(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
    ) -> TimebankResult<()> {
        let removed = self.transactions.delete_pending(conn, booking.id).await?;
        if removed > 0 {
            debug!(booking_id = %booking.id, "voided pending transaction");
        }

        Ok(())
    }

    /// Reprice the pending reservation after a confirmed booking changed
    /// duration, re-checking that the requester still covers the new amount
    pub async fn reprice_pending(
        &self,
        conn: &mut PgConnection,
        booking: &Booking,
        new_duration_minutes: i32,
    ) -> TimebankResult<()> {
        let Some(pending) = self
            .transactions
            .find_pending_for_booking(conn, booking.id)
            .await?
        else {
            return Ok(());
        };

        let amount = Self::hours_for_duration(new_duration_minutes);
        if amount == pending.amount {
            return Ok(());
        }

        let wallet = self.wallets.lock_by_user(conn, booking.booked_by).await?;
        if !wallet.has_sufficient_balance(amount) {
            return Err(TimebankError::InsufficientFunds {
                required: amount,
                available: wallet.balance,
            });
        }

        self.transactions
            .update_amount(conn, pending.id, amount)
            .await?;

        Ok(())
    }

    /// Direct wallet-to-wallet transfer, outside any booking
    pub async fn transfer(
        &self,
        conn: &mut PgConnection,
        sender_id: Uuid,
        receiver_id: Uuid,
        amount: Decimal,
        reason: &str,
    ) -> TimebankResult<()> {
        if sender_id == receiver_id {
            return Err(TimebankError::Validation(
                "cannot transfer credits to yourself".to_string(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(TimebankError::Validation(
                "transfer amount must be positive".to_string(),
            ));
        }

        let (from, to) = self.wallets.lock_pair(conn, sender_id, receiver_id).await?;

        if !from.has_sufficient_balance(amount) {
            return Err(TimebankError::InsufficientFunds {
                required: amount,
                available: from.balance,
            });
        }

        self.wallets.deduct(conn, from.id, amount).await?;
        self.wallets.credit(conn, to.id, amount).await?;

        self.transactions
            .insert(
                conn,
                &NewTransaction {
                    wallet_id: from.id,
                    sender_id,
                    receiver_id,
                    kind: TransactionKind::Debit,
                    amount,
                    reason: reason.to_string(),
                    booking_id: None,
                    status: TransactionStatus::Completed,
                },
            )
            .await?;
        self.transactions
            .insert(
                conn,
                &NewTransaction {
                    wallet_id: to.id,
                    sender_id,
                    receiver_id,
                    kind: TransactionKind::Credit,
                    amount,
                    reason: reason.to_string(),
                    booking_id: None,
                    status: TransactionStatus::Completed,
                },
            )
            .await?;

        Ok(())
    }
}
