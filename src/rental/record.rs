use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{RentalError, Result};
use crate::loyalty::LoyaltySettlement;
use crate::maintenance::MaintenanceRecord;
use crate::pricing::{AddOnSelection, LateFeeCalculation, PricingBreakdown, SelectedAddOn};
use crate::types::{
    AssetCategory, AssetId, BillingUnit, CustomerId, MembershipLevel, ObservedStatus,
    PaymentMethod, Points, RentalId, RentalStatus,
};

/// what a customer asks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub asset_id: AssetId,
    pub pickup_location: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[serde(default)]
    pub add_ons: Vec<AddOnSelection>,
    pub payment_method: PaymentMethod,
}

impl RentalRequest {
    pub fn new(
        asset_id: &str,
        pickup_location: &str,
        scheduled_start: DateTime<Utc>,
        scheduled_end: DateTime<Utc>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            pickup_location: pickup_location.to_string(),
            scheduled_start,
            scheduled_end,
            add_ons: Vec::new(),
            payment_method,
        }
    }

    pub fn with_add_on(mut self, name: &str, count: u32) -> Self {
        self.add_ons.push(AddOnSelection::new(name, count));
        self
    }

    /// shape checks that need neither the catalog nor the clock
    pub(crate) fn validate_shape(&self) -> Result<()> {
        if self.asset_id.trim().is_empty() {
            return Err(RentalError::validation("asset_id", "must not be empty"));
        }
        if self.pickup_location.trim().is_empty() {
            return Err(RentalError::validation("pickup_location", "must not be empty"));
        }
        if self.scheduled_start > self.scheduled_end {
            return Err(RentalError::validation(
                "scheduled_end",
                "must not be before the scheduled start",
            ));
        }
        Ok(())
    }
}

/// a rental as owned by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    pub id: RentalId,
    pub customer_id: CustomerId,
    pub asset_id: AssetId,
    pub asset_category: AssetCategory,
    pub pickup_location: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    /// set on return, or earlier by an overdue settlement
    pub actual_end: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub membership: MembershipLevel,
    pub billing_unit: BillingUnit,
    /// booked units plus extensions
    pub billed_units: u32,
    #[serde(default)]
    pub extended_units: u32,
    pub unit_rate: Money,
    pub breakdown: PricingBreakdown,
    pub add_ons: Vec<SelectedAddOn>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub amount_paid: Money,
    /// charges applied to the rental that the gateway declined
    pub amount_outstanding: Money,
    /// points held for the customer until the rental completes
    pub reserved_points: Points,
    /// earned plus bonus, known once completed
    pub points_earned: Points,
    pub late_fee_assessed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RentalRecord {
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }

    /// active past its scheduled end
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.scheduled_end < now
    }

    pub fn observed_status(&self, now: DateTime<Utc>) -> ObservedStatus {
        match self.status {
            RentalStatus::Requested => ObservedStatus::Requested,
            RentalStatus::Active if self.is_overdue(now) => ObservedStatus::Overdue,
            RentalStatus::Active => ObservedStatus::Active,
            RentalStatus::Completed => ObservedStatus::Completed,
            RentalStatus::Cancelled => ObservedStatus::Cancelled,
        }
    }

    pub(crate) fn transition(&mut self, next: RentalStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(RentalError::InvalidState {
                current: self.status.to_string(),
                expected: match next {
                    RentalStatus::Active => "requested",
                    RentalStatus::Completed => "active",
                    _ => "requested or active",
                }
                .to_string(),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn require_active(&self) -> Result<()> {
        if !self.is_active() {
            return Err(RentalError::InvalidState {
                current: self.status.to_string(),
                expected: RentalStatus::Active.to_string(),
            });
        }
        Ok(())
    }
}

/// audit entry appended on every lifecycle change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalHistoryEntry {
    pub id: Uuid,
    pub rental_id: RentalId,
    pub customer_id: CustomerId,
    pub asset_id: AssetId,
    pub status: RentalStatus,
    pub amount: Money,
    /// signed points movement tied to this step
    pub points: i64,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl RentalHistoryEntry {
    pub fn capture(record: &RentalRecord, amount: Money, points: i64, description: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            rental_id: record.id,
            customer_id: record.customer_id.clone(),
            asset_id: record.asset_id.clone(),
            status: record.status,
            amount,
            points,
            description,
            timestamp: record.updated_at,
        }
    }
}

/// how an extension was paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtensionPayment {
    Paid { reference: String },
    /// extension stays applied; the cost is owed
    Outstanding { amount: Money, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionOutcome {
    pub rental: RentalRecord,
    pub additional_units: u32,
    pub cost: Money,
    pub payment: ExtensionPayment,
}

impl ExtensionOutcome {
    pub fn is_outstanding(&self) -> bool {
        matches!(self.payment, ExtensionPayment::Outstanding { .. })
    }
}

/// how a late fee was paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LateFeePayment {
    NotDue,
    /// assessed earlier by an overdue settlement
    AlreadySettled,
    Paid { reference: String },
    Outstanding { amount: Money, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub rental: RentalRecord,
    pub late_fee: Option<LateFeeCalculation>,
    pub late_fee_payment: LateFeePayment,
    pub loyalty: Option<LoyaltySettlement>,
    pub maintenance: Option<MaintenanceRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverdueSettlement {
    pub rental: RentalRecord,
    pub late_fee: LateFeeCalculation,
    pub payment: LateFeePayment,
}
