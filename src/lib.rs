pub mod asset;
pub mod config;
pub mod customer;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod loyalty;
pub mod maintenance;
pub mod payments;
pub mod pricing;
pub mod rental;
pub mod types;

// re-export key types
pub use asset::{Asset, AssetAvailability, AssetCatalog, InMemoryCatalog};
pub use config::{
    CategoryRule, DiscountTable, LoyaltyConfig, MaintenanceConfig, PricingConfig, RentalConfig,
    TierRates, TierThreshold,
};
pub use customer::Customer;
pub use decimal::{Money, Rate};
pub use errors::{RentalError, Result};
pub use events::{Event, EventStore};
pub use loyalty::{LoyaltyAccount, LoyaltyLedger, LoyaltySettlement, LoyaltySnapshot, LoyaltyTransaction};
pub use maintenance::{MaintenanceRecord, MaintenanceScheduler};
pub use payments::{GatewayCall, PaymentGateway, PaymentOutcome, ScriptedGateway};
pub use pricing::{
    AddOnPricing, AddOnSelection, AddOnTemplate, LateFeeCalculation, LateFeePolicy,
    PricingBreakdown, PricingEngine, PricingInput, SelectedAddOn,
};
pub use rental::{
    ExtensionOutcome, ExtensionPayment, LateFeePayment, OverdueSettlement, Receipt, RentalHistoryEntry,
    RentalLedger, RentalRecord, RentalRequest, RentalView, ReturnOutcome,
};
pub use types::{
    AssetCategory, AssetId, BillingUnit, CategoryTier, CustomerId, DisplayTier, MaintenanceId,
    MaintenanceStatus, MaintenanceType, MembershipLevel, ObservedStatus, PaymentMethod, Points,
    RentalId, RentalStatus, TransactionType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
