//! # Ledger Store — Persistence Seam
//!
//! The wallet core reads and writes its state through [`LedgerStore`], a
//! trait the production deployment implements over its database. The trait
//! is deliberately narrow: wallets keyed by (user, currency), an
//! append-only transaction log, and the two queries the service actually
//! needs (period totals for limit checks, recent history for reporting).
//!
//! [`memory::InMemoryLedgerStore`] is the reference implementation — it
//! defines the semantics every backend must match and backs the test suite
//! and the demo.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::{Direction, TransactionError, TransactionRecord, TransactionStatus, Wallet};
use crate::money::Currency;

pub use memory::InMemoryLedgerStore;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A wallet for this (user, currency) pair already exists.
    #[error("wallet for {currency} already exists for user {user_id}")]
    Duplicate {
        /// The owning user.
        user_id: String,
        /// The duplicated currency.
        currency: Currency,
    },

    /// An update referenced a wallet the store has never seen.
    #[error("wallet {0} not found in store")]
    WalletMissing(Uuid),

    /// A status update referenced an unknown transaction record.
    #[error("transaction {0} not found in store")]
    TransactionMissing(Uuid),

    /// A status update violated the record lifecycle.
    #[error(transparent)]
    Lifecycle(#[from] TransactionError),
}

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

/// Persistence operations for wallets and transaction records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Inserts a new wallet, enforcing the one-per-(user, currency) rule.
    ///
    /// # Errors
    ///
    /// [`StoreError::Duplicate`] when the pair already has a wallet.
    async fn insert_wallet(&self, wallet: Wallet) -> Result<(), StoreError>;

    /// Fetches one wallet by owner and currency.
    async fn wallet(&self, user_id: &str, currency: Currency) -> Option<Wallet>;

    /// Fetches all wallets owned by a user, in creation order.
    async fn wallets_for_user(&self, user_id: &str) -> Vec<Wallet>;

    /// Persists a mutated wallet.
    ///
    /// # Errors
    ///
    /// [`StoreError::WalletMissing`] when the wallet was never inserted.
    async fn update_wallet(&self, wallet: &Wallet) -> Result<(), StoreError>;

    /// Appends a transaction record.
    async fn insert_transaction(&self, record: TransactionRecord) -> Result<(), StoreError>;

    /// Moves a stored record to a terminal status, respecting the record
    /// lifecycle (terminal records reject further transitions).
    async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<(), StoreError>;

    /// Sums the amounts of a wallet's non-failed records in one direction,
    /// created at or after `since`. This is the spend-limit accumulator.
    async fn period_total(
        &self,
        wallet_id: Uuid,
        since: DateTime<Utc>,
        direction: Direction,
    ) -> Decimal;

    /// The wallet's most recent records, newest first, capped at `limit`.
    async fn recent_transactions(&self, wallet_id: Uuid, limit: usize) -> Vec<TransactionRecord>;
}
