//! Ledger transaction repository

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{
    HistoryQuery, LedgerTransaction, NewTransaction, TransactionKind, TransactionStatus,
};

/// Ledger transaction repository
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> LedgerTransaction {
        LedgerTransaction {
            id: row.get("id"),
            wallet_id: row.get("wallet_id"),
            sender_id: row.get("sender_id"),
            receiver_id: row.get("receiver_id"),
            kind: row.get("kind"),
            amount: row.get("amount"),
            reason: row.get("reason"),
            booking_id: row.get("booking_id"),
            status: row.get("status"),
            created_at: row.get("created_at"),
        }
    }

    /// Record a ledger movement
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        new: &NewTransaction,
    ) -> TimebankResult<LedgerTransaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions
                (wallet_id, sender_id, receiver_id, kind, amount, reason, booking_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, wallet_id, sender_id, receiver_id, kind, amount, reason,
                      booking_id, status, created_at
            "#,
        )
        .bind(new.wallet_id)
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(new.kind)
        .bind(new.amount)
        .bind(&new.reason)
        .bind(new.booking_id)
        .bind(new.status)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match &e {
            // The partial unique index allows one open pending entry per
            // booking; hitting it means a confirm raced past the row lock.
            sqlx::Error::Database(db) if db.is_unique_violation() => TimebankError::Integrity(
                format!("booking {:?} already has a pending transaction", new.booking_id),
            ),
            _ => e.into(),
        })?;

        Ok(Self::from_row(&row))
    }

    /// Find the open pending transaction for a booking, if any
    pub async fn find_pending_for_booking(
        &self,
        conn: &mut PgConnection,
        booking_id: Uuid,
    ) -> TimebankResult<Option<LedgerTransaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, wallet_id, sender_id, receiver_id, kind, amount, reason,
                   booking_id, status, created_at
            FROM transactions
            WHERE booking_id = $1 AND kind = $2
            "#,
        )
        .bind(booking_id)
        .bind(TransactionKind::Pending)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(|row| Self::from_row(&row)))
    }

    /// Convert a pending transaction into a settled debit record
    pub async fn settle_pending(&self, conn: &mut PgConnection, id: Uuid) -> TimebankResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET kind = $2, status = $3
            WHERE id = $1 AND kind = $4
            "#,
        )
        .bind(id)
        .bind(TransactionKind::Debit)
        .bind(TransactionStatus::Completed)
        .bind(TransactionKind::Pending)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TimebankError::Integrity(format!(
                "pending transaction {id} vanished during settlement"
            )));
        }

        Ok(())
    }

    /// Adjust the reserved amount of a still-pending transaction
    pub async fn update_amount(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        amount: Decimal,
    ) -> TimebankResult<()> {
        let result = sqlx::query("UPDATE transactions SET amount = $2 WHERE id = $1 AND kind = $3")
            .bind(id)
            .bind(amount)
            .bind(TransactionKind::Pending)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TimebankError::Integrity(format!(
                "pending transaction {id} vanished during reprice"
            )));
        }

        Ok(())
    }

    /// Delete the pending transaction for a booking, if one exists. Returns
    /// the number of rows removed (0 or 1).
    pub async fn delete_pending(
        &self,
        conn: &mut PgConnection,
        booking_id: Uuid,
    ) -> TimebankResult<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE booking_id = $1 AND kind = $2")
            .bind(booking_id)
            .bind(TransactionKind::Pending)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Paginated transaction history for a user's wallet, newest first.
    /// The optional filter narrows to credits ("earned") or debits ("spent").
    pub async fn history_for_user(
        &self,
        user_id: Uuid,
        query: &HistoryQuery,
    ) -> TimebankResult<(Vec<LedgerTransaction>, i64)> {
        let kind = match query.filter.as_deref() {
            None => None,
            Some("earned") => Some(TransactionKind::Credit),
            Some("spent") => Some(TransactionKind::Debit),
            Some(other) => {
                return Err(TimebankError::Validation(format!(
                    "unknown history filter: {other}"
                )));
            }
        };

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) as i64 * limit as i64;

        let rows = sqlx::query(
            r#"
            SELECT t.id, t.wallet_id, t.sender_id, t.receiver_id, t.kind, t.amount,
                   t.reason, t.booking_id, t.status, t.created_at
            FROM transactions t
            JOIN wallets w ON w.id = t.wallet_id
            WHERE w.user_id = $1 AND ($2::text IS NULL OR t.kind = $2)
            ORDER BY t.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM transactions t
            JOIN wallets w ON w.id = t.wallet_id
            WHERE w.user_id = $1 AND ($2::text IS NULL OR t.kind = $2)
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.iter().map(Self::from_row).collect(), count))
    }
}
