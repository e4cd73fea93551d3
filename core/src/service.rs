//! # Fiat Wallet Service
//!
//! The operations callers actually invoke: wallet creation and lookup,
//! KYC-gated deposits, withdrawals and peer transfers, and currency
//! conversion through the rate provider. This is the only module allowed
//! to move money, and it always moves it in the same shape: validate
//! everything, write a `Pending` record, mutate the balance, complete the
//! record.
//!
//! ## Serialization
//!
//! Two operations racing on one wallet must not lose an update, so every
//! mutation runs under that wallet's entry in a lock registry. A transfer
//! takes both wallets' locks in ascending id order — two concurrent
//! opposing transfers therefore contend on the same first lock instead of
//! deadlocking. Wallet state is re-read after the lock is held; the
//! pre-read only resolves which lock to take.
//!
//! ## Transfers
//!
//! Both legs are recorded `Pending` before either balance moves. If the
//! credit leg fails after the debit has landed, the debit is compensated
//! (credited back) and both records are marked `Failed` — the ledger never
//! keeps half a transfer.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directory::{KycStatus, UserDirectory, UserRecord};
use crate::ledger::{
    Direction, LimitWindow, TransactionKind, TransactionRecord, TransactionStatus, Wallet,
    WalletError,
};
use crate::money::{self, Currency, UnsupportedCurrency};
use crate::rates::{RateError, RateProvider, RateSnapshot};
use crate::store::{LedgerStore, StoreError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a wallet operation can report.
///
/// Every variant is detected before any balance mutation (or, for the
/// transfer credit leg, after compensation has restored the books), so a
/// returned error always means "nothing moved".
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A currency code outside the supported set reached the service.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// The (user, currency) pair already has a wallet.
    #[error("wallet for {currency} already exists for user {user_id}")]
    DuplicateWallet {
        /// The owning user.
        user_id: String,
        /// The duplicated currency.
        currency: Currency,
    },

    /// The user id did not resolve in the directory.
    #[error("user {0} not found")]
    UserNotFound(String),

    /// No wallet exists for the (user, currency) pair.
    #[error("no {currency} wallet found for user {user_id}")]
    WalletNotFound {
        /// The requesting user.
        user_id: String,
        /// The requested currency.
        currency: Currency,
    },

    /// The wallet has been deactivated.
    #[error("wallet {wallet_id} is inactive")]
    WalletInactive {
        /// The wallet in question.
        wallet_id: Uuid,
    },

    /// The acting user has not completed identity verification.
    #[error("KYC verification required for user {user_id} (status: {status})")]
    KycRequired {
        /// The user who failed the gate.
        user_id: String,
        /// Their current status, for the error message.
        status: KycStatus,
    },

    /// The operation would push a spend window past its cap.
    #[error("{window} limit of {limit} exceeded: {period_total} already moved, {requested} requested")]
    LimitExceeded {
        /// Which window closed the gate.
        window: LimitWindow,
        /// The configured cap for that window.
        limit: Decimal,
        /// What the window has already accumulated.
        period_total: Decimal,
        /// The candidate amount.
        requested: Decimal,
    },

    /// The amount was zero or negative after quantization.
    #[error("amount must be positive: {0}")]
    InvalidAmount(Decimal),

    /// The destination of a withdrawal or transfer is unusable.
    #[error("invalid destination: {0}")]
    InvalidDestination(String),

    /// The source wallet cannot cover the debit.
    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The current balance.
        available: Decimal,
        /// The amount that was requested.
        requested: Decimal,
    },

    /// Rate lookup failed — the provider was unreachable or the target
    /// currency was missing from its table.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// The persistence collaborator failed mid-operation.
    #[error("ledger store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // The uniqueness rule is a caller-visible contract, not an
            // internal store failure.
            StoreError::Duplicate { user_id, currency } => {
                ServiceError::DuplicateWallet { user_id, currency }
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<WalletError> for ServiceError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidAmount { amount } => ServiceError::InvalidAmount(amount),
            WalletError::InsufficientFunds {
                available,
                requested,
            } => ServiceError::InsufficientFunds {
                available,
                requested,
            },
            WalletError::Inactive { wallet_id } => ServiceError::WalletInactive { wallet_id },
        }
    }
}

impl From<UnsupportedCurrency> for ServiceError {
    fn from(err: UnsupportedCurrency) -> Self {
        ServiceError::UnsupportedCurrency(err.0)
    }
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// Success payload for a deposit or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// The completed transaction record.
    pub transaction_id: Uuid,
    /// The wallet's balance after the operation.
    pub new_balance: Decimal,
}

/// Success payload for a peer transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// The completed `transfer_out` record on the source wallet.
    pub outbound_transaction_id: Uuid,
    /// The completed `transfer_in` record on the destination wallet.
    pub inbound_transaction_id: Uuid,
    /// Source balance after the debit.
    pub source_balance: Decimal,
    /// Destination balance after the credit.
    pub destination_balance: Decimal,
}

// ---------------------------------------------------------------------------
// WalletService
// ---------------------------------------------------------------------------

/// The fiat wallet service.
///
/// Collaborators are injected once at construction and live as long as the
/// service does — no per-call clients, no module-level singletons.
pub struct WalletService<S, D, R> {
    store: S,
    directory: D,
    rates: R,
    /// One mutex per wallet, created on first touch. Entries are tiny and
    /// wallets are never deleted, so the registry only grows with the
    /// wallet population.
    wallet_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<S, D, R> WalletService<S, D, R>
where
    S: LedgerStore,
    D: UserDirectory,
    R: RateProvider,
{
    /// Assembles the service from its collaborators.
    pub fn new(store: S, directory: D, rates: R) -> Self {
        Self {
            store,
            directory,
            rates,
            wallet_locks: DashMap::new(),
        }
    }

    /// Read access to the ledger store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read access to the user directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    // -----------------------------------------------------------------------
    // Wallet lifecycle
    // -----------------------------------------------------------------------

    /// Creates a wallet for (user, currency) with zero balance, active
    /// state, and the default spend limits.
    ///
    /// # Errors
    ///
    /// [`ServiceError::UserNotFound`] for unknown users,
    /// [`ServiceError::DuplicateWallet`] when the pair already has one.
    pub async fn create_wallet(
        &self,
        user_id: &str,
        currency: Currency,
    ) -> Result<Wallet, ServiceError> {
        let user = self.require_user(user_id).await?;

        let wallet = Wallet::new(user_id, currency, user.kyc_status.is_verified());
        self.store.insert_wallet(wallet.clone()).await?;

        info!(user = user_id, %currency, wallet = %wallet.id, "wallet created");
        Ok(wallet)
    }

    /// Fetches one wallet.
    ///
    /// # Errors
    ///
    /// [`ServiceError::WalletNotFound`] when absent.
    pub async fn get_wallet(
        &self,
        user_id: &str,
        currency: Currency,
    ) -> Result<Wallet, ServiceError> {
        self.require_wallet(user_id, currency).await
    }

    /// Fetches all of a user's wallets, in creation order. Unknown users
    /// simply own no wallets.
    pub async fn get_all_wallets(&self, user_id: &str) -> Vec<Wallet> {
        self.store.wallets_for_user(user_id).await
    }

    /// Blocks all money movement on a wallet. Balance and history remain
    /// readable; wallets are never hard-deleted.
    pub async fn deactivate_wallet(
        &self,
        user_id: &str,
        currency: Currency,
    ) -> Result<Wallet, ServiceError> {
        self.set_wallet_active(user_id, currency, false).await
    }

    /// Restores money movement on a deactivated wallet.
    pub async fn reactivate_wallet(
        &self,
        user_id: &str,
        currency: Currency,
    ) -> Result<Wallet, ServiceError> {
        self.set_wallet_active(user_id, currency, true).await
    }

    async fn set_wallet_active(
        &self,
        user_id: &str,
        currency: Currency,
        active: bool,
    ) -> Result<Wallet, ServiceError> {
        let wallet = self.require_wallet(user_id, currency).await?;
        let lock = self.lock_for(wallet.id);
        let _guard = lock.lock().await;

        let mut wallet = self.require_wallet(user_id, currency).await?;
        if active {
            wallet.reactivate();
        } else {
            wallet.deactivate();
        }
        self.store.update_wallet(&wallet).await?;

        info!(user = user_id, %currency, wallet = %wallet.id, active, "wallet active flag changed");
        Ok(wallet)
    }

    /// The wallet's most recent transaction records, newest first.
    pub async fn transaction_history(
        &self,
        user_id: &str,
        currency: Currency,
        limit: usize,
    ) -> Result<Vec<TransactionRecord>, ServiceError> {
        let wallet = self.require_wallet(user_id, currency).await?;
        Ok(self.store.recent_transactions(wallet.id, limit).await)
    }

    // -----------------------------------------------------------------------
    // Money movement
    // -----------------------------------------------------------------------

    /// Credits `amount` to the user's wallet.
    ///
    /// On success the returned balance is the old balance plus the
    /// quantized amount exactly.
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `WalletNotFound`, `WalletInactive`, `UserNotFound`,
    /// `KycRequired`, `LimitExceeded`.
    pub async fn deposit(
        &self,
        user_id: &str,
        currency: Currency,
        amount: Decimal,
    ) -> Result<TransactionReceipt, ServiceError> {
        let amount = positive_amount(amount)?;

        let wallet = self.require_wallet(user_id, currency).await?;
        let lock = self.lock_for(wallet.id);
        let _guard = lock.lock().await;

        let mut wallet = self.require_wallet(user_id, currency).await?;
        ensure_active(&wallet)?;
        self.require_verified(user_id).await?;
        self.check_limits(&wallet, amount, Direction::Inbound).await?;

        let record =
            TransactionRecord::new(user_id, wallet.id, TransactionKind::Deposit, amount, currency);
        let record_id = record.id;
        self.store.insert_transaction(record).await?;

        wallet.credit(amount)?;
        wallet.kyc_verified = true;
        self.store.update_wallet(&wallet).await?;
        self.store
            .set_transaction_status(record_id, TransactionStatus::Completed)
            .await?;

        info!(
            user = user_id,
            %currency,
            %amount,
            transaction = %record_id,
            balance = %wallet.balance,
            "deposit completed"
        );
        Ok(TransactionReceipt {
            transaction_id: record_id,
            new_balance: wallet.balance,
        })
    }

    /// Debits `amount` from the user's wallet toward an external
    /// destination account.
    ///
    /// # Errors
    ///
    /// Deposit's error set plus `InvalidDestination` and
    /// `InsufficientFunds`.
    pub async fn withdraw(
        &self,
        user_id: &str,
        currency: Currency,
        amount: Decimal,
        destination_account: &str,
    ) -> Result<TransactionReceipt, ServiceError> {
        let amount = positive_amount(amount)?;
        let destination = destination_account.trim();
        if destination.is_empty() {
            return Err(ServiceError::InvalidDestination(
                "destination account must not be empty".to_string(),
            ));
        }

        let wallet = self.require_wallet(user_id, currency).await?;
        let lock = self.lock_for(wallet.id);
        let _guard = lock.lock().await;

        let mut wallet = self.require_wallet(user_id, currency).await?;
        ensure_active(&wallet)?;
        self.require_verified(user_id).await?;
        self.check_limits(&wallet, amount, Direction::Outbound)
            .await?;
        if wallet.balance < amount {
            return Err(ServiceError::InsufficientFunds {
                available: wallet.balance,
                requested: amount,
            });
        }

        let record = TransactionRecord::new(
            user_id,
            wallet.id,
            TransactionKind::Withdrawal,
            amount,
            currency,
        )
        .with_destination(destination);
        let record_id = record.id;
        self.store.insert_transaction(record).await?;

        wallet.debit(amount)?;
        wallet.kyc_verified = true;
        self.store.update_wallet(&wallet).await?;
        self.store
            .set_transaction_status(record_id, TransactionStatus::Completed)
            .await?;

        info!(
            user = user_id,
            %currency,
            %amount,
            destination,
            transaction = %record_id,
            balance = %wallet.balance,
            "withdrawal completed"
        );
        Ok(TransactionReceipt {
            transaction_id: record_id,
            new_balance: wallet.balance,
        })
    }

    /// Moves `amount` between two users' wallets in the same currency.
    ///
    /// Produces a `transfer_out` record on the source and a `transfer_in`
    /// record on the destination, each naming the other party. Either both
    /// legs complete or neither balance changes.
    ///
    /// # Errors
    ///
    /// The deposit/withdraw taxonomy, evaluated against each wallet's own
    /// limits and each user's own KYC status.
    pub async fn transfer(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        currency: Currency,
        amount: Decimal,
    ) -> Result<TransferReceipt, ServiceError> {
        let amount = positive_amount(amount)?;

        let source = self.require_wallet(from_user_id, currency).await?;
        let target = self.require_wallet(to_user_id, currency).await?;
        if source.id == target.id {
            return Err(ServiceError::InvalidDestination(
                "transfer source and destination are the same wallet".to_string(),
            ));
        }

        // Ascending-id lock order keeps opposing transfers deadlock-free.
        let (first, second) = if source.id < target.id {
            (source.id, target.id)
        } else {
            (target.id, source.id)
        };
        let first_lock = self.lock_for(first);
        let second_lock = self.lock_for(second);
        let _guard_first = first_lock.lock().await;
        let _guard_second = second_lock.lock().await;

        let mut source = self.require_wallet(from_user_id, currency).await?;
        let mut target = self.require_wallet(to_user_id, currency).await?;
        ensure_active(&source)?;
        ensure_active(&target)?;
        self.require_verified(from_user_id).await?;
        self.require_verified(to_user_id).await?;
        self.check_limits(&source, amount, Direction::Outbound)
            .await?;
        self.check_limits(&target, amount, Direction::Inbound).await?;
        if source.balance < amount {
            return Err(ServiceError::InsufficientFunds {
                available: source.balance,
                requested: amount,
            });
        }

        // Both legs exist, pending, before either balance moves.
        let out_record = TransactionRecord::new(
            from_user_id,
            source.id,
            TransactionKind::TransferOut,
            amount,
            currency,
        )
        .with_counterparty(to_user_id);
        let in_record = TransactionRecord::new(
            to_user_id,
            target.id,
            TransactionKind::TransferIn,
            amount,
            currency,
        )
        .with_counterparty(from_user_id);
        let (out_id, in_id) = (out_record.id, in_record.id);
        self.store.insert_transaction(out_record).await?;
        self.store.insert_transaction(in_record).await?;

        source.debit(amount)?;
        source.kyc_verified = true;
        self.store.update_wallet(&source).await?;

        // Credit leg. Anything failing past this point compensates the
        // debit so the ledger never keeps half a transfer.
        let credit_leg: Result<(), ServiceError> = match target.credit(amount) {
            Ok(_) => {
                target.kyc_verified = true;
                self.store
                    .update_wallet(&target)
                    .await
                    .map_err(ServiceError::from)
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = credit_leg {
            warn!(
                from = from_user_id,
                to = to_user_id,
                %currency,
                %amount,
                error = %e,
                "transfer credit leg failed, compensating debit"
            );
            source.credit(amount)?;
            self.store.update_wallet(&source).await?;
            self.store
                .set_transaction_status(out_id, TransactionStatus::Failed)
                .await?;
            self.store
                .set_transaction_status(in_id, TransactionStatus::Failed)
                .await?;
            return Err(e);
        }

        self.store
            .set_transaction_status(out_id, TransactionStatus::Completed)
            .await?;
        self.store
            .set_transaction_status(in_id, TransactionStatus::Completed)
            .await?;

        info!(
            from = from_user_id,
            to = to_user_id,
            %currency,
            %amount,
            outbound = %out_id,
            inbound = %in_id,
            "transfer completed"
        );
        Ok(TransferReceipt {
            outbound_transaction_id: out_id,
            inbound_transaction_id: in_id,
            source_balance: source.balance,
            destination_balance: target.balance,
        })
    }

    // -----------------------------------------------------------------------
    // Exchange rates
    // -----------------------------------------------------------------------

    /// The provider's latest rate table quoted against `base`, filtered to
    /// the supported currency set.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Rate`] wrapping `Unreachable` — provider failures
    /// always propagate; there is no fallback rate.
    pub async fn get_exchange_rates(
        &self,
        base: Currency,
    ) -> Result<RateSnapshot, ServiceError> {
        let snapshot = self.rates.latest(base).await?;
        debug!(%base, quoted = snapshot.rates.len(), "exchange rates served");
        Ok(snapshot)
    }

    /// Converts `amount` from one currency to another at the provider's
    /// latest rate, quoted with `from` as the base, rounded to the money
    /// scale.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for non-positive input; [`ServiceError::Rate`] for
    /// provider outages (`Unreachable`) or a missing target currency
    /// (`Unavailable`).
    pub async fn convert_currency(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Result<Decimal, ServiceError> {
        let amount = positive_amount(amount)?;
        let snapshot = self.rates.latest(from).await?;
        let converted = snapshot.convert(amount, to)?;
        debug!(%amount, %from, %to, %converted, "currency converted");
        Ok(converted)
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn require_user(&self, user_id: &str) -> Result<UserRecord, ServiceError> {
        self.directory
            .lookup(user_id)
            .await
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))
    }

    async fn require_verified(&self, user_id: &str) -> Result<UserRecord, ServiceError> {
        let user = self.require_user(user_id).await?;
        if !user.kyc_status.is_verified() {
            return Err(ServiceError::KycRequired {
                user_id: user.user_id,
                status: user.kyc_status,
            });
        }
        Ok(user)
    }

    async fn require_wallet(
        &self,
        user_id: &str,
        currency: Currency,
    ) -> Result<Wallet, ServiceError> {
        self.store
            .wallet(user_id, currency)
            .await
            .ok_or_else(|| ServiceError::WalletNotFound {
                user_id: user_id.to_string(),
                currency,
            })
    }

    /// Evaluates both spend windows for one direction. The first window
    /// past its cap wins the error.
    async fn check_limits(
        &self,
        wallet: &Wallet,
        amount: Decimal,
        direction: Direction,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();
        for window in LimitWindow::BOTH {
            let since = window.start(now);
            let period_total = self.store.period_total(wallet.id, since, direction).await;
            if !wallet.limits.allows(window, period_total, amount) {
                return Err(ServiceError::LimitExceeded {
                    window,
                    limit: wallet.limits.limit_for(window),
                    period_total,
                    requested: amount,
                });
            }
        }
        Ok(())
    }

    fn lock_for(&self, wallet_id: Uuid) -> Arc<Mutex<()>> {
        self.wallet_locks
            .entry(wallet_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn ensure_active(wallet: &Wallet) -> Result<(), ServiceError> {
    if !wallet.is_active {
        return Err(ServiceError::WalletInactive {
            wallet_id: wallet.id,
        });
    }
    Ok(())
}

fn positive_amount(amount: Decimal) -> Result<Decimal, ServiceError> {
    let amount = money::quantize(amount);
    if amount <= Decimal::ZERO {
        return Err(ServiceError::InvalidAmount(amount));
    }
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
