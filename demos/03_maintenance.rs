/// maintenance - usage threshold, inspection workflow, back in service
use std::sync::Arc;

use asset_rental_rs::{
    Asset, AssetCatalog, Customer, InMemoryCatalog, MaintenanceType, Money, PaymentMethod,
    RentalConfig, RentalLedger, RentalRequest, SafeTimeProvider, ScriptedGateway, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== maintenance example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let catalog = Arc::new(InMemoryCatalog::with_assets([Asset::new(
        "YT-1",
        "Azimut 55",
        "yacht".into(),
        Money::from_major(2_000),
        12,
    )]));
    let ledger = RentalLedger::new(
        RentalConfig::marina(),
        catalog.clone(),
        Arc::new(ScriptedGateway::approving()),
    )?;
    let customer = Customer::member("c-006", "Jordan");

    // yachts are inspected every 8 rentals
    let mut inspection = None;
    for _ in 0..8 {
        let start = time.now() + Duration::hours(1);
        let rental = ledger.create_rental(
            RentalRequest::new("YT-1", "Marina Gate", start, start + Duration::days(1), PaymentMethod::BankTransfer),
            &customer,
            &time,
        )?;
        controller.advance(Duration::hours(25));
        inspection = ledger.return_asset(rental.id, &time)?.maintenance;
    }

    let yacht = catalog.find_by_id("YT-1").unwrap();
    println!("after 8 rentals: {:?}, usage {}", yacht.availability, yacht.usage_count);

    if let Some(record) = inspection {
        println!("inspection {} scheduled for {}", record.id, record.scheduled_date.format("%Y-%m-%d"));

        controller.advance(Duration::days(1));
        ledger.maintenance().start(record.id, Some("Dana".to_string()), &time)?;
        let done = ledger.complete_maintenance(
            record.id,
            Money::from_major(450),
            Some("hull and engines checked".to_string()),
            &time,
        )?;
        println!("inspection {:?}, cost {}", done.status, done.cost);
    }

    println!("yacht now {:?}", catalog.find_by_id("YT-1").unwrap().availability);

    // book follow-up work and list what is coming
    ledger.schedule_maintenance("YT-1", MaintenanceType::HullCleaning, time.now() + Duration::days(10), &time)?;
    for record in ledger.maintenance().upcoming(time.now(), Duration::days(14)) {
        println!("upcoming: {:?} on {}", record.maintenance_type, record.scheduled_date.format("%Y-%m-%d"));
    }

    Ok(())
}
