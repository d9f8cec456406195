use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{AssetId, CustomerId, MaintenanceId, MaintenanceType, Points, RentalId, RentalStatus};

/// all events that can be emitted by the rental ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    RentalRequested {
        rental_id: RentalId,
        customer_id: CustomerId,
        asset_id: AssetId,
        quoted_total: Money,
        timestamp: DateTime<Utc>,
    },
    RentalActivated {
        rental_id: RentalId,
        amount_paid: Money,
        reserved_points: Points,
        timestamp: DateTime<Utc>,
    },
    RentalCompleted {
        rental_id: RentalId,
        total: Money,
        late_fee: Money,
        points_earned: Points,
        timestamp: DateTime<Utc>,
    },
    RentalCancelled {
        rental_id: RentalId,
        refund: Money,
        timestamp: DateTime<Utc>,
    },
    RentalExtended {
        rental_id: RentalId,
        additional_units: u32,
        cost: Money,
        new_end: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentCaptured {
        rental_id: RentalId,
        amount: Money,
        reference: String,
        timestamp: DateTime<Utc>,
    },
    PaymentDeclined {
        rental_id: Option<RentalId>,
        amount: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    RefundIssued {
        rental_id: RentalId,
        amount: Money,
        reference: String,
        timestamp: DateTime<Utc>,
    },
    LateFeeAssessed {
        rental_id: RentalId,
        fee: Money,
        overdue_units: u32,
        timestamp: DateTime<Utc>,
    },
    BalanceOutstanding {
        rental_id: RentalId,
        amount: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // loyalty events
    PointsCredited {
        customer_id: CustomerId,
        earned: Points,
        bonus: Points,
        balance: Points,
        timestamp: DateTime<Utc>,
    },
    VipUpgraded {
        customer_id: CustomerId,
        timestamp: DateTime<Utc>,
    },

    // maintenance events
    MaintenanceScheduled {
        record_id: MaintenanceId,
        asset_id: AssetId,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
    },
    AssetReturnedToService {
        asset_id: AssetId,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        rental_id: RentalId,
        old_status: RentalStatus,
        new_status: RentalStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
