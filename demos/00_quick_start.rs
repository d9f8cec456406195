/// quick start - book a speedboat, bring it back, print the receipt
use std::sync::Arc;

use asset_rental_rs::{
    Asset, Customer, InMemoryCatalog, Money, PaymentMethod, RentalConfig, RentalLedger,
    RentalRequest, SafeTimeProvider, ScriptedGateway, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    ));

    let catalog = Arc::new(InMemoryCatalog::with_assets([Asset::new(
        "SB-1",
        "Sea Ray 230",
        "speedboat".into(),
        Money::from_major(500),
        8,
    )]));
    let ledger = RentalLedger::new(
        RentalConfig::marina(),
        catalog,
        Arc::new(ScriptedGateway::approving()),
    )?;

    // three days for a VIP, starting tomorrow
    let start = time.now() + Duration::days(1);
    let request = RentalRequest::new(
        "SB-1",
        "North Dock",
        start,
        start + Duration::days(3),
        PaymentMethod::Card { last_four: "4242".to_string() },
    );
    let rental = ledger.create_rental(request, &Customer::vip("c-001", "Morgan"), &time)?;
    println!("rental {} charged {}", rental.id, rental.amount_paid);

    // bring it back on time
    time.test_control().unwrap().advance(Duration::days(4));
    let outcome = ledger.return_asset(rental.id, &time)?;
    println!("returned, {} points earned", outcome.rental.points_earned);

    println!("{}", ledger.receipt(rental.id)?.to_json_pretty()?);

    Ok(())
}
