/// cancellation window, declined payments and outstanding balances
use std::sync::Arc;

use asset_rental_rs::{
    Asset, Customer, ExtensionPayment, InMemoryCatalog, Money, PaymentMethod, RentalConfig,
    RentalError, RentalLedger, RentalRequest, SafeTimeProvider, ScriptedGateway, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== cancellation example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    ));
    let catalog = Arc::new(InMemoryCatalog::with_assets([
        Asset::new("SB-1", "Sea Ray 230", "speedboat".into(), Money::from_major(500), 8),
        Asset::new("PT-1", "Bennington", "pontoon".into(), Money::from_major(300), 10),
    ]));
    let gateway = Arc::new(ScriptedGateway::approving());
    let ledger = RentalLedger::new(RentalConfig::marina(), catalog, gateway.clone())?;
    let customer = Customer::member("c-002", "Robin");
    let card = PaymentMethod::Card { last_four: "1881".to_string() };

    // 72 hours ahead: outside the 48 hour window
    let start = time.now() + Duration::hours(72);
    let early = ledger.create_rental(
        RentalRequest::new("SB-1", "North Dock", start, start + Duration::days(2), card.clone()),
        &customer,
        &time,
    )?;
    let cancelled = ledger.cancel_rental(early.id, &time)?;
    println!("cancelled {} with a refund of {}", cancelled.id, cancelled.breakdown.refund);

    // 10 hours ahead: too late to cancel
    let start = time.now() + Duration::hours(10);
    let late = ledger.create_rental(
        RentalRequest::new("PT-1", "South Dock", start, start + Duration::days(1), card.clone()),
        &customer,
        &time,
    )?;
    match ledger.cancel_rental(late.id, &time) {
        Err(RentalError::CancellationWindow { cutoff, .. }) => {
            println!("cannot cancel {}, window closed at {}", late.id, cutoff)
        }
        other => println!("unexpected: {:?}", other.map(|r| r.status)),
    }

    // a declined extension stays on the rental as an outstanding balance
    gateway.decline_next("card limit reached");
    let extension = ledger.extend_rental(late.id, 1, &time)?;
    if let ExtensionPayment::Outstanding { amount, reason } = &extension.payment {
        println!("extension applied, {} outstanding ({})", amount, reason);
    }

    // a declined charge on booking leaves the boat free
    gateway.decline_next("insufficient funds");
    let start = time.now() + Duration::days(5);
    let result = ledger.create_rental(
        RentalRequest::new("SB-1", "North Dock", start, start + Duration::days(1), card),
        &Customer::guest("c-003", "Sam"),
        &time,
    );
    println!("booking with declined card: {:?}", result.err());

    for event in ledger.take_events() {
        println!("  {:?}", event);
    }

    Ok(())
}
