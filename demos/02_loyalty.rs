/// loyalty - earning, redeeming, transferring and the VIP upgrade
use std::sync::Arc;

use asset_rental_rs::{
    Asset, Customer, InMemoryCatalog, Money, PaymentMethod, RentalConfig, RentalLedger,
    RentalRequest, SafeTimeProvider, ScriptedGateway, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== loyalty example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let catalog = Arc::new(InMemoryCatalog::with_assets([Asset::new(
        "JS-1",
        "Sea-Doo Spark",
        "jet_ski".into(),
        Money::from_major(60),
        2,
    )]));
    let ledger = RentalLedger::new(
        RentalConfig::marina(),
        catalog,
        Arc::new(ScriptedGateway::approving()),
    )?;
    let customer = Customer::member("c-004", "Alex");

    // ten short jet ski rentals reach the rental-count threshold
    for round in 1..=10 {
        let start = time.now() + Duration::hours(1);
        let rental = ledger.create_rental(
            RentalRequest::new("JS-1", "Beach", start, start + Duration::hours(2), PaymentMethod::Wallet),
            &customer,
            &time,
        )?;
        controller.advance(Duration::hours(3));
        let outcome = ledger.return_asset(rental.id, &time)?;
        if let Some(settlement) = outcome.loyalty {
            println!(
                "rental {:>2}: +{} points, balance {}{}",
                round,
                settlement.earned + settlement.bonus,
                settlement.balance,
                if settlement.upgraded_to_vip { " -> VIP" } else { "" }
            );
        }
    }

    let snapshot = ledger.loyalty_snapshot("c-004")?;
    println!("\n{:?} tier, vip {}, {} points", snapshot.display_tier, snapshot.vip, snapshot.current_points);

    // spend some, give some away
    let loyalty = ledger.loyalty();
    loyalty.open_account("c-005", &time);
    loyalty.redeem("c-004", 50, "free life jacket", &time)?;
    let (from, to) = loyalty.transfer("c-004", "c-005", 100, &time)?;
    println!("after redeem and transfer: c-004 {} / c-005 {}", from, to);

    match loyalty.redeem("c-004", 500, "free day", &time) {
        Err(err) => println!("redeem refused: {}", err),
        Ok(balance) => println!("redeemed, balance {}", balance),
    }

    println!("\ntransaction log for c-004:");
    for tx in loyalty.transactions_for("c-004") {
        println!("  {:>+5} {:?} {}", tx.delta, tx.transaction_type, tx.description);
    }

    Ok(())
}
