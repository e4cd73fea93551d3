//! # Transaction Records
//!
//! Every movement of money — deposit, withdrawal, either leg of a peer
//! transfer — produces one [`TransactionRecord`]. Records are written in
//! `Pending` state *before* the balance mutation is attempted and promoted
//! to `Completed` only after it succeeds, so the ledger never shows a
//! completed record for money that didn't move.
//!
//! Once a record reaches a terminal status (`Completed` or `Failed`) it is
//! frozen: the status transition methods reject any further change, and
//! nothing else in the crate mutates a stored record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::money::Currency;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the record lifecycle.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Attempted a status transition on a record that is already terminal.
    #[error("transaction {id} is already {status}")]
    AlreadyFinal {
        /// The record in question.
        id: Uuid,
        /// Its terminal status.
        status: TransactionStatus,
    },
}

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

/// Discriminant for what a record represents.
///
/// A peer transfer produces two records — `TransferOut` on the source
/// wallet and `TransferIn` on the destination — each cross-referencing the
/// other party as its counterparty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// External funds credited to a wallet.
    Deposit,
    /// Wallet funds paid out to an external destination account.
    Withdrawal,
    /// The receiving leg of a peer transfer.
    TransferIn,
    /// The sending leg of a peer transfer.
    TransferOut,
}

impl TransactionKind {
    /// Which spend-limit accumulator this kind counts against.
    pub fn direction(&self) -> Direction {
        match self {
            TransactionKind::Deposit | TransactionKind::TransferIn => Direction::Inbound,
            TransactionKind::Withdrawal | TransactionKind::TransferOut => Direction::Outbound,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdrawal => write!(f, "withdrawal"),
            TransactionKind::TransferIn => write!(f, "transfer_in"),
            TransactionKind::TransferOut => write!(f, "transfer_out"),
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Whether money entered or left the wallet.
///
/// Spend limits track the two directions separately — a withdrawal must
/// never eat into the room left for deposits, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Money entering the wallet (deposits, transfer-in legs).
    Inbound,
    /// Money leaving the wallet (withdrawals, transfer-out legs).
    Outbound,
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a record.
///
/// `Pending` while the balance mutation is in flight, `Completed` once it
/// has succeeded, `Failed` when a started operation was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Written, balance not yet mutated.
    Pending,
    /// Balance mutation succeeded.
    Completed,
    /// Operation was rolled back after the record was written.
    Failed,
}

impl TransactionStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionRecord
// ---------------------------------------------------------------------------

/// One append-only money-movement record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier for this record.
    pub id: Uuid,

    /// The user whose wallet this record belongs to.
    pub user_id: String,

    /// The wallet whose balance the record describes.
    pub wallet_id: Uuid,

    /// What kind of movement this is.
    pub kind: TransactionKind,

    /// The amount moved. Always positive — the kind carries the sign.
    pub amount: Decimal,

    /// Currency of the wallet (denormalized for reporting).
    pub currency: Currency,

    /// The other party's user id, for transfer legs.
    pub counterparty: Option<String>,

    /// External destination account, for withdrawals.
    pub destination: Option<String>,

    /// Current lifecycle status.
    pub status: TransactionStatus,

    /// When the record was written. Spend-limit windows sum over this.
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Creates a new `Pending` record.
    pub fn new(
        user_id: &str,
        wallet_id: Uuid,
        kind: TransactionKind,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            wallet_id,
            kind,
            amount,
            currency,
            counterparty: None,
            destination: None,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Attaches the other party of a transfer leg.
    pub fn with_counterparty(mut self, user_id: &str) -> Self {
        self.counterparty = Some(user_id.to_string());
        self
    }

    /// Attaches the external destination of a withdrawal.
    pub fn with_destination(mut self, account: &str) -> Self {
        self.destination = Some(account.to_string());
        self
    }

    /// Marks the record `Completed`.
    ///
    /// # Errors
    ///
    /// [`TransactionError::AlreadyFinal`] if the record is terminal.
    pub fn complete(&mut self) -> Result<(), TransactionError> {
        self.transition(TransactionStatus::Completed)
    }

    /// Marks the record `Failed`.
    ///
    /// # Errors
    ///
    /// [`TransactionError::AlreadyFinal`] if the record is terminal.
    pub fn fail(&mut self) -> Result<(), TransactionError> {
        self.transition(TransactionStatus::Failed)
    }

    fn transition(&mut self, next: TransactionStatus) -> Result<(), TransactionError> {
        if self.status.is_terminal() {
            return Err(TransactionError::AlreadyFinal {
                id: self.id,
                status: self.status,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(kind: TransactionKind) -> TransactionRecord {
        TransactionRecord::new("user-1", Uuid::new_v4(), kind, dec!(25.00), Currency::USD)
    }

    #[test]
    fn new_record_is_pending() {
        let rec = record(TransactionKind::Deposit);
        assert_eq!(rec.status, TransactionStatus::Pending);
        assert!(rec.counterparty.is_none());
        assert!(rec.destination.is_none());
    }

    #[test]
    fn complete_then_freeze() {
        let mut rec = record(TransactionKind::Deposit);
        rec.complete().unwrap();
        assert_eq!(rec.status, TransactionStatus::Completed);

        // Terminal records reject every further transition.
        assert!(rec.complete().is_err());
        assert!(rec.fail().is_err());
        assert_eq!(rec.status, TransactionStatus::Completed);
    }

    #[test]
    fn fail_is_terminal_too() {
        let mut rec = record(TransactionKind::Withdrawal);
        rec.fail().unwrap();
        assert!(matches!(
            rec.complete(),
            Err(TransactionError::AlreadyFinal {
                status: TransactionStatus::Failed,
                ..
            })
        ));
    }

    #[test]
    fn kinds_map_to_directions() {
        assert_eq!(TransactionKind::Deposit.direction(), Direction::Inbound);
        assert_eq!(TransactionKind::TransferIn.direction(), Direction::Inbound);
        assert_eq!(TransactionKind::Withdrawal.direction(), Direction::Outbound);
        assert_eq!(TransactionKind::TransferOut.direction(), Direction::Outbound);
    }

    #[test]
    fn builder_attachments() {
        let rec = record(TransactionKind::TransferOut)
            .with_counterparty("user-2")
            .with_destination("acct-9");
        assert_eq!(rec.counterparty.as_deref(), Some("user-2"));
        assert_eq!(rec.destination.as_deref(), Some("acct-9"));
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&TransactionKind::TransferOut).unwrap();
        assert_eq!(json, "\"transfer_out\"");
    }

    #[test]
    fn record_serde_roundtrip() {
        let mut rec = record(TransactionKind::Deposit);
        rec.complete().unwrap();

        let json = serde_json::to_string(&rec).expect("serialize");
        let recovered: TransactionRecord = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(recovered.id, rec.id);
        assert_eq!(recovered.amount, dec!(25.00));
        assert_eq!(recovered.status, TransactionStatus::Completed);
    }
}
