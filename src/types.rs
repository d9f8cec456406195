use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a rental
pub type RentalId = Uuid;

/// unique identifier for a maintenance record
pub type MaintenanceId = Uuid;

/// catalog identifier of an asset
pub type AssetId = String;

/// identity-provider identifier of a customer
pub type CustomerId = String;

/// loyalty points are whole and never negative on an account
pub type Points = u64;

/// category tag carried by every asset; drives pricing tier and maintenance threshold
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCategory(String);

impl AssetCategory {
    pub fn new(name: impl Into<String>) -> Self {
        AssetCategory(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetCategory {
    fn from(s: &str) -> Self {
        AssetCategory::new(s)
    }
}

/// price tier of a category, one axis of the discount table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTier {
    Economy,
    Standard,
    Luxury,
}

/// the unit a category is billed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingUnit {
    Hour,
    Day,
}

impl BillingUnit {
    pub fn duration(&self) -> Duration {
        match self {
            BillingUnit::Hour => Duration::hours(1),
            BillingUnit::Day => Duration::days(1),
        }
    }

    /// length of `units` whole units, `None` when it cannot be represented
    pub fn span(&self, units: u32) -> Option<Duration> {
        self.duration().checked_mul(i32::try_from(units).ok()?)
    }

    /// whole units needed to cover a span, rounded up
    pub fn units_covering(&self, span: Duration) -> u32 {
        let unit = self.duration().num_seconds();
        let secs = span.num_seconds().max(0);
        ((secs + unit - 1) / unit) as u32
    }
}

/// membership level, the other axis of the discount table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipLevel {
    NonMember,
    Member,
    Vip,
}

/// stored rental status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    /// priced and claimed, payment not yet confirmed
    Requested,
    /// paid and in progress
    Active,
    /// returned
    Completed,
    /// cancelled inside the cancellation window
    Cancelled,
}

impl RentalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Completed | RentalStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        matches!(
            (self, next),
            (RentalStatus::Requested, RentalStatus::Active)
                | (RentalStatus::Requested, RentalStatus::Cancelled)
                | (RentalStatus::Active, RentalStatus::Completed)
                | (RentalStatus::Active, RentalStatus::Cancelled)
        )
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RentalStatus::Requested => write!(f, "requested"),
            RentalStatus::Active => write!(f, "active"),
            RentalStatus::Completed => write!(f, "completed"),
            RentalStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// status as seen by readers; overdue is active past its scheduled end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservedStatus {
    Requested,
    Active,
    Overdue,
    Completed,
    Cancelled,
}

/// how the customer pays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card { last_four: String },
    BankTransfer,
    Wallet,
    Cash,
}

/// loyalty ledger entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Redeem,
    Transfer,
    Bonus,
    Deduction,
}

/// customer-facing tier ladder derived from lifetime points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// maintenance record lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, MaintenanceStatus::Scheduled | MaintenanceStatus::InProgress)
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaintenanceStatus::Scheduled => write!(f, "scheduled"),
            MaintenanceStatus::InProgress => write!(f, "in_progress"),
            MaintenanceStatus::Completed => write!(f, "completed"),
            MaintenanceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// kind of servicing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceType {
    GeneralInspection,
    EngineService,
    HullCleaning,
    SafetyCheck,
    Repair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_covering_rounds_up() {
        assert_eq!(BillingUnit::Day.units_covering(Duration::days(3)), 3);
        assert_eq!(BillingUnit::Day.units_covering(Duration::hours(49)), 3);
        assert_eq!(BillingUnit::Hour.units_covering(Duration::minutes(90)), 2);
        assert_eq!(BillingUnit::Hour.units_covering(Duration::zero()), 0);
    }

    #[test]
    fn test_rental_transitions() {
        assert!(RentalStatus::Requested.can_transition_to(RentalStatus::Active));
        assert!(RentalStatus::Active.can_transition_to(RentalStatus::Completed));
        assert!(!RentalStatus::Completed.can_transition_to(RentalStatus::Active));
        assert!(!RentalStatus::Cancelled.can_transition_to(RentalStatus::Completed));
        assert!(!RentalStatus::Requested.can_transition_to(RentalStatus::Completed));
    }
}
