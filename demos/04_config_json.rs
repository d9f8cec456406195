/// configuration - export a preset, tweak it, load it back
use std::sync::Arc;

use asset_rental_rs::{
    Asset, Customer, InMemoryCatalog, Money, PaymentMethod, Rate, RentalConfig, RentalLedger,
    RentalRequest, SafeTimeProvider, ScriptedGateway, TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== config example ===\n");

    let mut config = RentalConfig::fleet();
    config.pricing.tax_rate = Rate::from_percentage(8);
    let json = config.to_json_pretty()?;
    println!("{}", json);

    let config = RentalConfig::from_json_str(&json)?;

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    ));
    let catalog = Arc::new(InMemoryCatalog::with_assets([Asset::new(
        "CAR-7",
        "Model Y",
        "suv".into(),
        Money::from_major(120),
        5,
    )]));
    let ledger = RentalLedger::new(config, catalog, Arc::new(ScriptedGateway::approving()))?;

    let start = time.now() + Duration::days(2);
    let quote = ledger.create_rental(
        RentalRequest::new("CAR-7", "Airport", start, start + Duration::days(4), PaymentMethod::Cash)
            .with_add_on("gps", 4)
            .with_add_on("roof_rack", 1),
        &Customer::member("c-007", "Casey"),
        &time,
    )?;

    println!("\n{}", ledger.view(quote.id, &time)?.to_json_pretty()?);

    // broken tables are rejected on load
    let broken = json.replace("\"default_threshold\": 15", "\"default_threshold\": 0");
    println!("\nloading broken config: {:?}", RentalConfig::from_json_str(&broken).err());

    Ok(())
}
