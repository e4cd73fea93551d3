//! # In-Memory Ledger Store
//!
//! Reference [`LedgerStore`] implementation: a flat map of wallets, an
//! index from (user, currency) to wallet id, and an append-only vector of
//! transaction records, all behind one `parking_lot::RwLock`. Suitable for
//! tests, demos, and single-process deployments whose ledger fits in
//! memory; the production database implements the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use super::{LedgerStore, StoreError};
use crate::ledger::{Direction, TransactionRecord, TransactionStatus, Wallet};
use crate::money::Currency;

/// Interior state, guarded by one lock. Store calls never hold the lock
/// across an await point.
#[derive(Default)]
struct Inner {
    wallets: HashMap<Uuid, Wallet>,
    /// (user, currency) -> wallet id. Insert-time uniqueness check.
    owner_index: HashMap<(String, Currency), Uuid>,
    /// Append-only; records are updated in place only via status moves.
    transactions: Vec<TransactionRecord>,
    /// Wallet ids in insertion order, for stable listing.
    creation_order: Vec<Uuid>,
}

/// Map-backed store for tests, demos, and small deployments.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wallets held. Test helper.
    pub fn wallet_count(&self) -> usize {
        self.inner.read().wallets.len()
    }

    /// Fetches a stored record by id. Test helper.
    pub fn transaction(&self, id: Uuid) -> Option<TransactionRecord> {
        self.inner
            .read()
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_wallet(&self, wallet: Wallet) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let key = (wallet.user_id.clone(), wallet.currency);
        if inner.owner_index.contains_key(&key) {
            return Err(StoreError::Duplicate {
                user_id: wallet.user_id.clone(),
                currency: wallet.currency,
            });
        }
        inner.owner_index.insert(key, wallet.id);
        inner.creation_order.push(wallet.id);
        inner.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn wallet(&self, user_id: &str, currency: Currency) -> Option<Wallet> {
        let inner = self.inner.read();
        let id = inner.owner_index.get(&(user_id.to_string(), currency))?;
        inner.wallets.get(id).cloned()
    }

    async fn wallets_for_user(&self, user_id: &str) -> Vec<Wallet> {
        let inner = self.inner.read();
        inner
            .creation_order
            .iter()
            .filter_map(|id| inner.wallets.get(id))
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn update_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        match inner.wallets.get_mut(&wallet.id) {
            Some(stored) => {
                *stored = wallet.clone();
                Ok(())
            }
            None => Err(StoreError::WalletMissing(wallet.id)),
        }
    }

    async fn insert_transaction(&self, record: TransactionRecord) -> Result<(), StoreError> {
        self.inner.write().transactions.push(record);
        Ok(())
    }

    async fn set_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let record = inner
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::TransactionMissing(id))?;
        match status {
            TransactionStatus::Completed => record.complete()?,
            TransactionStatus::Failed => record.fail()?,
            // Nothing transitions back to pending.
            TransactionStatus::Pending => {}
        }
        Ok(())
    }

    async fn period_total(
        &self,
        wallet_id: Uuid,
        since: DateTime<Utc>,
        direction: Direction,
    ) -> Decimal {
        let inner = self.inner.read();
        inner
            .transactions
            .iter()
            .filter(|t| {
                t.wallet_id == wallet_id
                    && t.created_at >= since
                    && t.status != TransactionStatus::Failed
                    && t.kind.direction() == direction
            })
            .map(|t| t.amount)
            .sum()
    }

    async fn recent_transactions(&self, wallet_id: Uuid, limit: usize) -> Vec<TransactionRecord> {
        let inner = self.inner.read();
        let mut records: Vec<TransactionRecord> = inner
            .transactions
            .iter()
            .filter(|t| t.wallet_id == wallet_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionKind;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn seeded_record(
        wallet_id: Uuid,
        kind: TransactionKind,
        amount: Decimal,
        age: Duration,
    ) -> TransactionRecord {
        let mut rec =
            TransactionRecord::new("user-1", wallet_id, kind, amount, Currency::USD);
        rec.created_at = Utc::now() - age;
        rec.complete().unwrap();
        rec
    }

    #[tokio::test]
    async fn insert_enforces_one_wallet_per_pair() {
        let store = InMemoryLedgerStore::new();
        store
            .insert_wallet(Wallet::new("alice", Currency::USD, true))
            .await
            .unwrap();

        let dup = store
            .insert_wallet(Wallet::new("alice", Currency::USD, true))
            .await;
        assert!(matches!(dup, Err(StoreError::Duplicate { .. })));

        // Same user, different currency is fine.
        store
            .insert_wallet(Wallet::new("alice", Currency::EUR, true))
            .await
            .unwrap();
        assert_eq!(store.wallet_count(), 2);
    }

    #[tokio::test]
    async fn lookup_by_pair_and_by_user() {
        let store = InMemoryLedgerStore::new();
        store
            .insert_wallet(Wallet::new("alice", Currency::USD, true))
            .await
            .unwrap();
        store
            .insert_wallet(Wallet::new("alice", Currency::CHF, true))
            .await
            .unwrap();
        store
            .insert_wallet(Wallet::new("bob", Currency::USD, true))
            .await
            .unwrap();

        assert!(store.wallet("alice", Currency::USD).await.is_some());
        assert!(store.wallet("alice", Currency::JPY).await.is_none());

        let alices = store.wallets_for_user("alice").await;
        assert_eq!(alices.len(), 2);
        assert_eq!(alices[0].currency, Currency::USD);
        assert_eq!(alices[1].currency, Currency::CHF);
    }

    #[tokio::test]
    async fn update_roundtrips_and_rejects_unknown() {
        let store = InMemoryLedgerStore::new();
        let mut w = Wallet::new("alice", Currency::USD, true);
        store.insert_wallet(w.clone()).await.unwrap();

        w.credit(dec!(12.34)).unwrap();
        store.update_wallet(&w).await.unwrap();
        assert_eq!(
            store.wallet("alice", Currency::USD).await.unwrap().balance,
            dec!(12.34)
        );

        let ghost = Wallet::new("ghost", Currency::EUR, true);
        assert!(matches!(
            store.update_wallet(&ghost).await,
            Err(StoreError::WalletMissing(_))
        ));
    }

    #[tokio::test]
    async fn period_total_separates_directions() {
        let store = InMemoryLedgerStore::new();
        let wallet_id = Uuid::new_v4();

        for rec in [
            seeded_record(wallet_id, TransactionKind::Deposit, dec!(100), Duration::hours(1)),
            seeded_record(wallet_id, TransactionKind::TransferIn, dec!(40), Duration::hours(2)),
            seeded_record(wallet_id, TransactionKind::Withdrawal, dec!(30), Duration::hours(1)),
            seeded_record(wallet_id, TransactionKind::TransferOut, dec!(5), Duration::hours(3)),
        ] {
            store.insert_transaction(rec).await.unwrap();
        }

        let since = Utc::now() - Duration::days(1);
        assert_eq!(
            store.period_total(wallet_id, since, Direction::Inbound).await,
            dec!(140)
        );
        assert_eq!(
            store.period_total(wallet_id, since, Direction::Outbound).await,
            dec!(35)
        );
    }

    #[tokio::test]
    async fn period_total_respects_window_start_and_skips_failed() {
        let store = InMemoryLedgerStore::new();
        let wallet_id = Uuid::new_v4();

        // Inside the window.
        store
            .insert_transaction(seeded_record(
                wallet_id,
                TransactionKind::Deposit,
                dec!(10),
                Duration::hours(1),
            ))
            .await
            .unwrap();
        // Before the window — must not count.
        store
            .insert_transaction(seeded_record(
                wallet_id,
                TransactionKind::Deposit,
                dec!(99),
                Duration::days(2),
            ))
            .await
            .unwrap();
        // Failed — must not count either.
        let mut failed =
            TransactionRecord::new("user-1", wallet_id, TransactionKind::Deposit, dec!(77), Currency::USD);
        failed.fail().unwrap();
        store.insert_transaction(failed).await.unwrap();

        let since = Utc::now() - Duration::days(1);
        assert_eq!(
            store.period_total(wallet_id, since, Direction::Inbound).await,
            dec!(10)
        );
    }

    #[tokio::test]
    async fn status_moves_respect_the_lifecycle() {
        let store = InMemoryLedgerStore::new();
        let rec = TransactionRecord::new(
            "user-1",
            Uuid::new_v4(),
            TransactionKind::Deposit,
            dec!(1),
            Currency::USD,
        );
        let id = rec.id;
        store.insert_transaction(rec).await.unwrap();

        store
            .set_transaction_status(id, TransactionStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            store.transaction(id).unwrap().status,
            TransactionStatus::Completed
        );

        // Terminal: a second move is a lifecycle error.
        assert!(matches!(
            store
                .set_transaction_status(id, TransactionStatus::Failed)
                .await,
            Err(StoreError::Lifecycle(_))
        ));

        assert!(matches!(
            store
                .set_transaction_status(Uuid::new_v4(), TransactionStatus::Completed)
                .await,
            Err(StoreError::TransactionMissing(_))
        ));
    }

    #[tokio::test]
    async fn recent_transactions_newest_first_with_cap() {
        let store = InMemoryLedgerStore::new();
        let wallet_id = Uuid::new_v4();

        for (amount, hours) in [(dec!(1), 3), (dec!(2), 2), (dec!(3), 1)] {
            store
                .insert_transaction(seeded_record(
                    wallet_id,
                    TransactionKind::Deposit,
                    amount,
                    Duration::hours(hours),
                ))
                .await
                .unwrap();
        }

        let recent = store.recent_transactions(wallet_id, 2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].amount, dec!(3));
        assert_eq!(recent[1].amount, dec!(2));
    }
}
