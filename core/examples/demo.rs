//! Walkthrough of the full wallet lifecycle against in-memory
//! collaborators: user onboarding, wallet creation, deposits, a peer
//! transfer, a withdrawal, and a currency conversion off a canned rate
//! table. No network, no database — just the ledger core doing its job.
//!
//! Run with:
//!   cargo run --example demo

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

use dualpay_core::directory::{InMemoryUserDirectory, KycStatus, UserRecord};
use dualpay_core::money::Currency;
use dualpay_core::rates::{RateError, RateProvider, RateSnapshot};
use dualpay_core::service::WalletService;
use dualpay_core::store::InMemoryLedgerStore;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn section(title: &str) {
    println!();
    println!("{BOLD}{CYAN}== {title} =={RESET}");
}

/// Canned rate table standing in for the live quote endpoint, so the demo
/// runs offline. Swap in `HttpRateProvider::new()?` for real quotes.
struct CannedRates;

#[async_trait]
impl RateProvider for CannedRates {
    async fn latest(&self, base: Currency) -> Result<RateSnapshot, RateError> {
        // Quotes as of a random Tuesday; good enough for a demo.
        let usd_rates: HashMap<Currency, Decimal> = HashMap::from([
            (Currency::USD, dec!(1)),
            (Currency::EUR, dec!(0.92)),
            (Currency::JPY, dec!(149.50)),
            (Currency::AED, dec!(3.6725)),
            (Currency::SGD, dec!(1.34)),
            (Currency::CHF, dec!(0.885)),
        ]);

        // Rebase the table onto whatever base was requested.
        let base_rate = usd_rates[&base];
        let rates = usd_rates
            .iter()
            .map(|(c, r)| (*c, r / base_rate))
            .collect();

        Ok(RateSnapshot {
            base,
            fetched_at: Utc::now(),
            rates,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    section("Onboarding");
    let directory = InMemoryUserDirectory::new();
    directory.insert(UserRecord::new("alice", KycStatus::Verified));
    directory.insert(UserRecord::new("bob", KycStatus::Submitted));
    println!("alice: verified  |  bob: documents submitted, review pending");

    let service = WalletService::new(InMemoryLedgerStore::new(), directory, CannedRates);

    section("Wallet creation");
    let alice_usd = service.create_wallet("alice", Currency::USD).await?;
    service.create_wallet("alice", Currency::EUR).await?;
    let bob_usd = service.create_wallet("bob", Currency::USD).await?;
    println!(
        "alice/USD {DIM}{}{RESET}, alice/EUR, bob/USD {DIM}{}{RESET}",
        alice_usd.id, bob_usd.id
    );

    section("Deposits");
    let receipt = service.deposit("alice", Currency::USD, dec!(2500.00)).await?;
    println!("{GREEN}alice deposits 2500.00 USD{RESET} -> balance {}", receipt.new_balance);

    // Bob hasn't cleared KYC yet; the gate holds.
    match service.deposit("bob", Currency::USD, dec!(100)).await {
        Err(e) => println!("bob deposits 100 USD -> rejected: {e}"),
        Ok(_) => unreachable!("unverified deposit must not pass"),
    }

    // Review comes back clear.
    service.directory().set_kyc_status("bob", KycStatus::Verified);
    println!("bob's KYC review clears");

    section("Peer transfer");
    let transfer = service
        .transfer("alice", "bob", Currency::USD, dec!(750.25))
        .await?;
    println!(
        "{GREEN}alice -> bob 750.25 USD{RESET}  (out {DIM}{}{RESET}, in {DIM}{}{RESET})",
        transfer.outbound_transaction_id, transfer.inbound_transaction_id
    );
    println!(
        "alice balance {}  |  bob balance {}",
        transfer.source_balance, transfer.destination_balance
    );

    section("Withdrawal");
    let receipt = service
        .withdraw("bob", Currency::USD, dec!(250.25), "CH93-0076-2011-6238-5295-7")
        .await?;
    println!("{GREEN}bob withdraws 250.25 USD{RESET} -> balance {}", receipt.new_balance);

    section("Limits");
    match service.deposit("alice", Currency::USD, dec!(9999)).await {
        Err(e) => println!("alice deposits 9999 USD -> rejected: {e}"),
        Ok(_) => unreachable!("daily limit must hold"),
    }

    section("Conversion");
    let rates = service.get_exchange_rates(Currency::USD).await?;
    println!(
        "USD table as of {}: {} currencies quoted",
        rates.fetched_at,
        rates.rates.len()
    );
    let eur = service
        .convert_currency(dec!(100), Currency::USD, Currency::EUR)
        .await?;
    println!("100 USD = {eur} EUR");
    let jpy = service
        .convert_currency(dec!(100), Currency::EUR, Currency::JPY)
        .await?;
    println!("100 EUR = {jpy} JPY");

    section("History");
    for record in service
        .transaction_history("bob", Currency::USD, 10)
        .await?
    {
        println!(
            "{} {:>12} {} {} {DIM}{}{RESET}",
            record.created_at.format("%H:%M:%S"),
            record.kind.to_string(),
            record.amount,
            record.currency,
            record.status
        );
    }

    println!();
    Ok(())
}
