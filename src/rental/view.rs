/// serializable read models over a rental
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::pricing::{PricingBreakdown, SelectedAddOn};
use crate::rental::RentalRecord;
use crate::types::{
    AssetCategory, AssetId, BillingUnit, CustomerId, MembershipLevel, ObservedStatus, Points,
    RentalId,
};

/// status dashboard view of a rental
#[derive(Debug, Serialize, Deserialize)]
pub struct RentalView {
    pub id: RentalId,
    pub customer_id: CustomerId,
    pub asset_id: AssetId,
    pub asset_category: AssetCategory,
    pub status: ObservedStatus,
    pub schedule: ScheduleView,
    pub financial: FinancialView,
    pub loyalty: PointsView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub pickup_location: String,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_end: Option<DateTime<Utc>>,
    pub billing_unit: BillingUnit,
    pub billed_units: u32,
    /// whole units past the scheduled end at view time
    pub overdue_units: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinancialView {
    pub membership: MembershipLevel,
    pub unit_rate: Money,
    pub total: Money,
    pub amount_paid: Money,
    pub amount_outstanding: Money,
    pub extensions: Money,
    pub late_fee: Money,
    pub refund: Money,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PointsView {
    pub reserved: Points,
    pub earned: Points,
}

impl RentalView {
    pub fn from_record(record: &RentalRecord, now: DateTime<Utc>) -> Self {
        let overdue_units = if record.is_overdue(now) {
            record.billing_unit.units_covering(now - record.scheduled_end)
        } else {
            0
        };

        RentalView {
            id: record.id,
            customer_id: record.customer_id.clone(),
            asset_id: record.asset_id.clone(),
            asset_category: record.asset_category.clone(),
            status: record.observed_status(now),
            schedule: ScheduleView {
                pickup_location: record.pickup_location.clone(),
                scheduled_start: record.scheduled_start,
                scheduled_end: record.scheduled_end,
                actual_end: record.actual_end,
                billing_unit: record.billing_unit,
                billed_units: record.billed_units,
                overdue_units,
            },
            financial: FinancialView {
                membership: record.membership,
                unit_rate: record.unit_rate,
                total: record.breakdown.total,
                amount_paid: record.amount_paid,
                amount_outstanding: record.amount_outstanding,
                extensions: record.breakdown.extensions,
                late_fee: record.breakdown.late_fee,
                refund: record.breakdown.refund,
            },
            loyalty: PointsView {
                reserved: record.reserved_points,
                earned: record.points_earned,
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// itemized receipt
#[derive(Debug, Serialize, Deserialize)]
pub struct Receipt {
    pub rental_id: RentalId,
    pub customer_id: CustomerId,
    pub asset_id: AssetId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub line_items: Vec<ReceiptLine>,
    pub breakdown: PricingBreakdown,
    pub amount_paid: Money,
    pub balance_due: Money,
    pub payment_reference: Option<String>,
    pub points_earned: Points,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub amount: Money,
}

impl Receipt {
    pub fn from_record(record: &RentalRecord) -> Self {
        let mut line_items = vec![ReceiptLine {
            description: format!("{} rental ({:?})", record.asset_category, record.billing_unit),
            quantity: record.billed_units - record.extended_units,
            unit_price: record.unit_rate,
            amount: record.breakdown.base,
        }];
        if record.extended_units > 0 {
            line_items.push(ReceiptLine {
                description: "extension".to_string(),
                quantity: record.extended_units,
                unit_price: record.unit_rate,
                amount: record.breakdown.extensions,
            });
        }
        line_items.extend(record.add_ons.iter().map(|add_on: &SelectedAddOn| ReceiptLine {
            description: add_on.name.clone(),
            quantity: add_on.count,
            unit_price: add_on.unit_price,
            amount: add_on.line_total(),
        }));

        Receipt {
            rental_id: record.id,
            customer_id: record.customer_id.clone(),
            asset_id: record.asset_id.clone(),
            period_start: record.scheduled_start,
            period_end: record.scheduled_end,
            returned_at: record.actual_end,
            line_items,
            breakdown: record.breakdown.clone(),
            amount_paid: record.amount_paid,
            balance_due: record.amount_outstanding,
            payment_reference: record.payment_reference.clone(),
            points_earned: record.points_earned,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
