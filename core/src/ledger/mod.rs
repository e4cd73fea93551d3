//! # Ledger Module — Wallets, Transactions & Spend Limits
//!
//! The ledger is where money lives in DualPay. Every fiat balance, every
//! deposit, every peer transfer passes through this module. If the service
//! layer is the nervous system, the ledger is the circulatory system — it
//! moves value around and keeps the books straight.
//!
//! ## Architecture
//!
//! ```text
//! wallet.rs       — per-(user, currency) balance with credit/debit guards
//! transaction.rs  — append-only money-movement records and their lifecycle
//! limits.rs       — daily/monthly spend windows and the limit rule
//! ```
//!
//! ## Design Principles
//!
//! 1. **All amounts are two-place decimals.** Quantized on the way in,
//!    exact from then on. The protocol never rounds twice.
//!
//! 2. **Balances only move through credit/debit.** Both refuse non-positive
//!    amounts and inactive wallets; debit additionally refuses to overdraw.
//!
//! 3. **Transaction records are written pending-first.** A record reaches
//!    `Completed` only after its balance mutation has succeeded, and once a
//!    record is terminal nothing about it changes again.

pub mod limits;
pub mod transaction;
pub mod wallet;

pub use limits::{LimitWindow, SpendLimits};
pub use transaction::{
    Direction, TransactionError, TransactionKind, TransactionRecord, TransactionStatus,
};
pub use wallet::{Wallet, WalletError};
