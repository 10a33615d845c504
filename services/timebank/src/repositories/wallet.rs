//! Wallet repository for balance storage and movement

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::Wallet;

/// Wallet repository
#[derive(Clone)]
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    /// Create a new wallet repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn from_row(row: &PgRow) -> Wallet {
        Wallet {
            id: row.get("id"),
            user_id: row.get("user_id"),
            balance: row.get("balance"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Idempotent wallet provisioning: the first call creates the wallet
    /// with the starting balance (10.00 credits), later calls return the
    /// existing row unchanged.
    pub async fn get_or_create(&self, user_id: Uuid) -> TimebankResult<Wallet> {
        let mut conn = self.pool.acquire().await?;
        self.ensure(&mut *conn, user_id).await
    }

    /// Transactional variant of [`get_or_create`](Self::get_or_create)
    pub async fn ensure(&self, conn: &mut PgConnection, user_id: Uuid) -> TimebankResult<Wallet> {
        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    TimebankError::NotFound("user")
                }
                _ => e.into(),
            })?;

        let row = sqlx::query(
            r#"
            SELECT id, user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TimebankError::NotFound("wallet"))?;

        Ok(Self::from_row(&row))
    }

    /// Find a wallet by its owning user
    pub async fn fetch_by_user(&self, user_id: Uuid) -> TimebankResult<Option<Wallet>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::from_row(&row)))
    }

    /// Lock a single wallet row for the remainder of the transaction
    pub async fn lock_by_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> TimebankResult<Wallet> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, balance, created_at, updated_at
            FROM wallets
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TimebankError::NotFound("wallet"))?;

        Ok(Self::from_row(&row))
    }

    /// Lock two wallets, always acquiring in ascending user-id order so two
    /// settlements touching the same pair of users cannot deadlock. The
    /// returned tuple matches the argument order.
    pub async fn lock_pair(
        &self,
        conn: &mut PgConnection,
        first: Uuid,
        second: Uuid,
    ) -> TimebankResult<(Wallet, Wallet)> {
        let (lo, hi) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };

        let wallet_lo = self.lock_by_user(conn, lo).await?;
        let wallet_hi = self.lock_by_user(conn, hi).await?;

        if first <= second {
            Ok((wallet_lo, wallet_hi))
        } else {
            Ok((wallet_hi, wallet_lo))
        }
    }

    /// Decrease a wallet balance. Fails closed: the conditional update
    /// refuses to drive the balance negative.
    pub async fn deduct(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: Decimal,
    ) -> TimebankResult<()> {
        if amount <= Decimal::ZERO {
            return Err(TimebankError::Validation(
                "deduct amount must be positive".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance - $2, updated_at = now()
            WHERE id = $1 AND balance >= $2
            "#,
        )
        .bind(wallet_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Decimal = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1")
                .bind(wallet_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(TimebankError::NotFound("wallet"))?;

            return Err(TimebankError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        Ok(())
    }

    /// Increase a wallet balance. Rejects non-positive amounts.
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        wallet_id: Uuid,
        amount: Decimal,
    ) -> TimebankResult<()> {
        if amount <= Decimal::ZERO {
            return Err(TimebankError::Validation(
                "credit amount must be positive".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(wallet_id)
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(TimebankError::NotFound("wallet"));
        }

        Ok(())
    }
}
