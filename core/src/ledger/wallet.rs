//! # Fiat Wallet
//!
//! A [`Wallet`] is one (user, currency) balance. The pair is unique across
//! the ledger — the store enforces it on insert — and the balance moves
//! only through [`credit`](Wallet::credit) and [`debit`](Wallet::debit),
//! both of which quantize their input and refuse anything that would leave
//! the books wrong: non-positive amounts, overdrafts, inactive wallets.
//!
//! Wallets are never deleted. Closing one means flipping the active flag,
//! which blocks all money movement in both directions while keeping the
//! balance and its history queryable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::limits::SpendLimits;
use crate::money::{self, Currency};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when moving money on a wallet.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The amount was zero or negative after quantization.
    #[error("amount must be positive: {amount}")]
    InvalidAmount {
        /// The offending amount, as quantized.
        amount: Decimal,
    },

    /// Attempted to debit more than the available balance.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The current balance.
        available: Decimal,
        /// The amount that was requested.
        requested: Decimal,
    },

    /// The wallet has been deactivated and cannot move money.
    #[error("wallet {wallet_id} is inactive")]
    Inactive {
        /// The wallet in question.
        wallet_id: Uuid,
    },
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A single fiat balance owned by one user in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier for this wallet.
    pub id: Uuid,

    /// The owning user.
    pub user_id: String,

    /// The wallet's currency. Fixed at creation.
    pub currency: Currency,

    /// Current balance. Never negative, always at money scale.
    pub balance: Decimal,

    /// Whether money movement is permitted. Deactivation is the only
    /// supported form of closure.
    pub is_active: bool,

    /// When the balance last moved.
    pub last_transaction: Option<DateTime<Utc>>,

    /// Daily/monthly spend caps in this wallet's currency units.
    pub limits: SpendLimits,

    /// Denormalized KYC flag, refreshed whenever a gated operation passes.
    /// The user directory remains authoritative.
    pub kyc_verified: bool,

    /// When this wallet was created.
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new empty, active wallet with the default limits.
    pub fn new(user_id: &str, currency: Currency, kyc_verified: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            currency,
            balance: Decimal::ZERO,
            is_active: true,
            last_transaction: None,
            limits: SpendLimits::default(),
            kyc_verified,
            created_at: Utc::now(),
        }
    }

    /// Credits (adds) funds to the balance.
    ///
    /// Returns the new balance. The stored balance stays at money scale and
    /// equals the old balance plus the quantized amount exactly.
    ///
    /// # Errors
    ///
    /// [`WalletError::Inactive`] on a deactivated wallet,
    /// [`WalletError::InvalidAmount`] for non-positive amounts.
    pub fn credit(&mut self, amount: Decimal) -> Result<Decimal, WalletError> {
        let amount = self.admissible(amount)?;
        self.balance = money::quantize(self.balance + amount);
        self.last_transaction = Some(Utc::now());
        Ok(self.balance)
    }

    /// Debits (subtracts) funds from the balance.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// [`WalletError::Inactive`] on a deactivated wallet,
    /// [`WalletError::InvalidAmount`] for non-positive amounts,
    /// [`WalletError::InsufficientFunds`] when the debit would overdraw.
    pub fn debit(&mut self, amount: Decimal) -> Result<Decimal, WalletError> {
        let amount = self.admissible(amount)?;
        if self.balance < amount {
            return Err(WalletError::InsufficientFunds {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance = money::quantize(self.balance - amount);
        self.last_transaction = Some(Utc::now());
        Ok(self.balance)
    }

    /// Blocks all money movement on this wallet.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Restores money movement on a deactivated wallet.
    pub fn reactivate(&mut self) {
        self.is_active = true;
    }

    /// Common admission checks for both movement directions.
    fn admissible(&self, amount: Decimal) -> Result<Decimal, WalletError> {
        if !self.is_active {
            return Err(WalletError::Inactive { wallet_id: self.id });
        }
        let amount = money::quantize(amount);
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount { amount });
        }
        Ok(amount)
    }
}
