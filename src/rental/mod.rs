pub mod record;
pub mod view;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::asset::{Asset, AssetAvailability, AssetCatalog};
use crate::config::RentalConfig;
use crate::customer::Customer;
use crate::decimal::Money;
use crate::errors::{RentalError, Result};
use crate::events::{Event, EventStore};
use crate::loyalty::{LoyaltyLedger, LoyaltySnapshot};
use crate::maintenance::{MaintenanceRecord, MaintenanceScheduler};
use crate::payments::{PaymentGateway, PaymentOutcome};
use crate::pricing::PricingEngine;
use crate::types::{MaintenanceId, MaintenanceType, MembershipLevel, PaymentMethod, RentalId, RentalStatus};

pub use record::{
    ExtensionOutcome, ExtensionPayment, LateFeePayment, OverdueSettlement, RentalHistoryEntry,
    RentalRecord, RentalRequest, ReturnOutcome,
};
pub use view::{Receipt, ReceiptLine, RentalView};

/// rental lifecycle orchestrator
///
/// Owns every rental record and drives the asset claim, pricing, payment, loyalty
/// and maintenance collaborators. Records are locked one at a time and never
/// across a gateway call.
pub struct RentalLedger {
    config: Arc<RentalConfig>,
    catalog: Arc<dyn AssetCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    pricing: PricingEngine,
    loyalty: LoyaltyLedger,
    maintenance: MaintenanceScheduler,
    rentals: RwLock<HashMap<RentalId, Arc<Mutex<RentalRecord>>>>,
    history: Mutex<Vec<RentalHistoryEntry>>,
    events: Mutex<EventStore>,
}

impl RentalLedger {
    pub fn new(
        config: RentalConfig,
        catalog: Arc<dyn AssetCatalog>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            pricing: PricingEngine::new(config.clone()),
            loyalty: LoyaltyLedger::new(config.loyalty.clone()),
            maintenance: MaintenanceScheduler::new(config.clone()),
            config,
            catalog,
            gateway,
            rentals: RwLock::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
            events: Mutex::new(EventStore::new()),
        })
    }

    pub fn config(&self) -> &RentalConfig {
        &self.config
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn loyalty(&self) -> &LoyaltyLedger {
        &self.loyalty
    }

    pub fn maintenance(&self) -> &MaintenanceScheduler {
        &self.maintenance
    }

    pub fn catalog(&self) -> &dyn AssetCatalog {
        self.catalog.as_ref()
    }

    fn emit(&self, event: Event) {
        self.events.lock().emit(event);
    }

    fn record_history(&self, entry: RentalHistoryEntry) {
        self.history.lock().push(entry);
    }

    fn entry(&self, rental_id: RentalId) -> Result<Arc<Mutex<RentalRecord>>> {
        self.rentals
            .read()
            .get(&rental_id)
            .cloned()
            .ok_or(RentalError::RentalNotFound { id: rental_id })
    }

    fn asset_snapshot(&self, asset_id: &str) -> Result<Asset> {
        self.catalog
            .find_by_id(asset_id)
            .ok_or_else(|| RentalError::AssetNotFound {
                asset_id: asset_id.to_string(),
            })
    }

    fn release_claim(&self, asset_id: &str) {
        if let Err(err) = self.catalog.release(asset_id) {
            warn!("could not release asset {}: {}", asset_id, err);
        }
    }

    /// members pick up a VIP upgrade earned through the loyalty ledger
    fn membership_for(&self, customer: &Customer) -> MembershipLevel {
        match customer.membership() {
            MembershipLevel::Member
                if self.loyalty.account(&customer.id).map(|a| a.vip).unwrap_or(false) =>
            {
                MembershipLevel::Vip
            }
            level => level,
        }
    }

    /// charge an amount added to an existing rental and book the result on it
    fn charge_follow_up(
        &self,
        entry: &Mutex<RentalRecord>,
        amount: Money,
        method: &PaymentMethod,
        what: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, String> {
        let outcome = self.gateway.charge(amount, method);

        let mut record = entry.lock();
        record.updated_at = now;
        match outcome {
            PaymentOutcome::Approved { reference } => {
                record.amount_paid += amount;
                self.emit(Event::PaymentCaptured {
                    rental_id: record.id,
                    amount,
                    reference: reference.clone(),
                    timestamp: now,
                });
                Ok(reference)
            }
            PaymentOutcome::Declined { reason } => {
                record.amount_outstanding += amount;
                warn!(
                    "{} of {} for rental {} declined, recorded as outstanding: {}",
                    what, amount, record.id, reason
                );
                self.emit(Event::BalanceOutstanding {
                    rental_id: record.id,
                    amount,
                    reason: format!("{} declined: {}", what, reason),
                    timestamp: now,
                });
                Err(reason)
            }
        }
    }

    /// validate, claim, price and charge a new rental
    pub fn create_rental(
        &self,
        request: RentalRequest,
        customer: &Customer,
        time: &SafeTimeProvider,
    ) -> Result<RentalRecord> {
        let now = time.now();

        // validate
        if customer.id.trim().is_empty() {
            return Err(RentalError::validation("customer_id", "must not be empty"));
        }
        request.validate_shape()?;
        if request.scheduled_start < now {
            return Err(RentalError::validation("scheduled_start", "must not be in the past"));
        }

        let listed = self
            .catalog
            .find_by_id(&request.asset_id)
            .ok_or_else(|| RentalError::AssetUnavailable {
                asset_id: request.asset_id.clone(),
                reason: "not in catalog".to_string(),
            })?;
        let add_ons = self.pricing.resolve_add_ons(&listed.category, &request.add_ons)?;

        // claim before pricing; every failure from here on releases it
        let asset = self.catalog.try_claim(&request.asset_id)?;

        // price
        let membership = self.membership_for(customer);
        let billing_unit = self.pricing.billing_unit(&asset.category);
        let units = self.pricing.billing_units(
            &asset.category,
            request.scheduled_start,
            request.scheduled_end,
        );
        let mut breakdown = self.pricing.quote(&asset, units, &add_ons, membership);
        if membership == MembershipLevel::NonMember {
            breakdown.loyalty_points = 0;
        }
        let total = breakdown.total;

        let mut record = RentalRecord {
            id: Uuid::new_v4(),
            customer_id: customer.id.clone(),
            asset_id: asset.id.clone(),
            asset_category: asset.category.clone(),
            pickup_location: request.pickup_location,
            scheduled_start: request.scheduled_start,
            scheduled_end: request.scheduled_end,
            actual_end: None,
            status: RentalStatus::Requested,
            membership,
            billing_unit,
            billed_units: units,
            extended_units: 0,
            unit_rate: self.pricing.base_amount(&asset, 1),
            reserved_points: breakdown.loyalty_points,
            breakdown,
            add_ons,
            payment_method: request.payment_method,
            payment_reference: None,
            amount_paid: Money::ZERO,
            amount_outstanding: Money::ZERO,
            points_earned: 0,
            late_fee_assessed: false,
            created_at: now,
            updated_at: now,
        };

        // charge
        if total.is_positive() {
            match self.gateway.charge(total, &record.payment_method) {
                PaymentOutcome::Approved { reference } => {
                    record.payment_reference = Some(reference);
                    record.amount_paid = total;
                }
                PaymentOutcome::Declined { reason } => {
                    self.release_claim(&asset.id);
                    warn!(
                        "payment of {} declined for {} on asset {}: {}",
                        total, customer.id, asset.id, reason
                    );
                    self.emit(Event::PaymentDeclined {
                        rental_id: None,
                        amount: total,
                        reason: reason.clone(),
                        timestamp: now,
                    });
                    return Err(RentalError::PaymentFailed {
                        amount: total,
                        reason,
                    });
                }
            }
        }

        if let Err(err) = record.transition(RentalStatus::Active, now) {
            self.release_claim(&asset.id);
            return Err(err);
        }

        if membership != MembershipLevel::NonMember {
            self.loyalty.open_account(&customer.id, time);
        }

        self.rentals
            .write()
            .insert(record.id, Arc::new(Mutex::new(record.clone())));
        self.record_history(RentalHistoryEntry::capture(
            &record,
            total,
            record.reserved_points as i64,
            format!("activated, {} points reserved", record.reserved_points),
        ));

        // emit events
        self.emit(Event::RentalRequested {
            rental_id: record.id,
            customer_id: record.customer_id.clone(),
            asset_id: record.asset_id.clone(),
            quoted_total: total,
            timestamp: now,
        });
        if let Some(reference) = &record.payment_reference {
            self.emit(Event::PaymentCaptured {
                rental_id: record.id,
                amount: total,
                reference: reference.clone(),
                timestamp: now,
            });
        }
        self.emit(Event::StatusChanged {
            rental_id: record.id,
            old_status: RentalStatus::Requested,
            new_status: RentalStatus::Active,
            reason: "payment captured".to_string(),
            timestamp: now,
        });
        self.emit(Event::RentalActivated {
            rental_id: record.id,
            amount_paid: record.amount_paid,
            reserved_points: record.reserved_points,
            timestamp: now,
        });

        info!(
            "rental {} active: {} took {} for {} {:?}(s), total {}",
            record.id, record.customer_id, record.asset_id, units, billing_unit, total
        );
        Ok(record)
    }

    /// complete an active rental and hand the asset back
    pub fn return_asset(&self, rental_id: RentalId, time: &SafeTimeProvider) -> Result<ReturnOutcome> {
        let now = time.now();
        let entry = self.entry(rental_id)?;
        let asset_id = entry.lock().asset_id.clone();
        let asset = self.asset_snapshot(&asset_id)?;

        let (record, late_fee) = {
            let mut record = entry.lock();
            record.require_active()?;

            let actual_end = *record.actual_end.get_or_insert(now);
            let late_fee = if record.late_fee_assessed {
                None
            } else {
                let calculation =
                    self.pricing.assess_late_fee(&asset, record.scheduled_end, actual_end);
                record.breakdown = record.breakdown.with_late_fee(calculation.fee);
                record.late_fee_assessed = true;
                Some(calculation)
            };

            record.transition(RentalStatus::Completed, now)?;
            (record.clone(), late_fee)
        };

        // release, usage and threshold check share the asset lock
        let mut scheduled: Option<MaintenanceRecord> = None;
        self.catalog.update(&asset_id, &mut |asset: &mut Asset| {
            asset.release();
            asset.increment_usage();
            scheduled = self.maintenance.evaluate(asset, time);
        })?;

        let late_fee_payment = match &late_fee {
            None => LateFeePayment::AlreadySettled,
            Some(calculation) if !calculation.fee.is_positive() => LateFeePayment::NotDue,
            Some(calculation) => {
                self.emit(Event::LateFeeAssessed {
                    rental_id,
                    fee: calculation.fee,
                    overdue_units: calculation.overdue_units,
                    timestamp: now,
                });
                match self.charge_follow_up(&entry, calculation.fee, &record.payment_method, "late fee", now) {
                    Ok(reference) => LateFeePayment::Paid { reference },
                    Err(reason) => LateFeePayment::Outstanding {
                        amount: calculation.fee,
                        reason,
                    },
                }
            }
        };

        // settle reserved points
        let loyalty = if record.membership != MembershipLevel::NonMember
            && self.loyalty.has_account(&record.customer_id)
        {
            match self.loyalty.settle_rental(
                &record.customer_id,
                record.reserved_points,
                &format!("rental {}", record.id),
                time,
            ) {
                Ok(settlement) => {
                    entry.lock().points_earned = settlement.earned + settlement.bonus;
                    self.emit(Event::PointsCredited {
                        customer_id: record.customer_id.clone(),
                        earned: settlement.earned,
                        bonus: settlement.bonus,
                        balance: settlement.balance,
                        timestamp: now,
                    });
                    if settlement.upgraded_to_vip {
                        self.emit(Event::VipUpgraded {
                            customer_id: record.customer_id.clone(),
                            timestamp: now,
                        });
                    }
                    Some(settlement)
                }
                Err(err) => {
                    warn!("could not settle points for rental {}: {}", record.id, err);
                    None
                }
            }
        } else {
            None
        };

        let record = entry.lock().clone();
        self.record_history(RentalHistoryEntry::capture(
            &record,
            record.breakdown.total,
            record.points_earned as i64,
            match &late_fee {
                Some(calculation) if calculation.overdue_units > 0 => {
                    format!("returned {} unit(s) late", calculation.overdue_units)
                }
                _ => "returned".to_string(),
            },
        ));

        self.emit(Event::StatusChanged {
            rental_id,
            old_status: RentalStatus::Active,
            new_status: RentalStatus::Completed,
            reason: "asset returned".to_string(),
            timestamp: now,
        });
        self.emit(Event::RentalCompleted {
            rental_id,
            total: record.breakdown.total,
            late_fee: record.breakdown.late_fee,
            points_earned: record.points_earned,
            timestamp: now,
        });
        if let Some(maintenance) = &scheduled {
            self.emit(Event::MaintenanceScheduled {
                record_id: maintenance.id,
                asset_id: maintenance.asset_id.clone(),
                maintenance_type: maintenance.maintenance_type,
                scheduled_date: maintenance.scheduled_date,
            });
        }

        info!(
            "rental {} completed, total {}, outstanding {}",
            rental_id, record.breakdown.total, record.amount_outstanding
        );
        Ok(ReturnOutcome {
            rental: record,
            late_fee,
            late_fee_payment,
            loyalty,
            maintenance: scheduled,
        })
    }

    /// cancel ahead of the cancellation window with a full refund
    pub fn cancel_rental(&self, rental_id: RentalId, time: &SafeTimeProvider) -> Result<RentalRecord> {
        let now = time.now();
        let entry = self.entry(rental_id)?;
        let window = Duration::hours(self.config.pricing.cancellation_window_hours);

        let (prior, refund) = {
            let mut record = entry.lock();
            if record.status.is_terminal() {
                return Err(RentalError::InvalidState {
                    current: record.status.to_string(),
                    expected: "requested or active".to_string(),
                });
            }

            let cutoff = record.scheduled_start - window;
            if now >= cutoff {
                return Err(RentalError::CancellationWindow {
                    scheduled_start: record.scheduled_start,
                    cutoff,
                    now,
                });
            }

            let prior = record.clone();
            let refund = self.pricing.refund_amount(&record);
            // nothing stays owed on a cancelled booking
            let written_off = record.amount_outstanding;
            record.breakdown = record.breakdown.with_refund(refund).with_write_off(written_off);
            record.amount_outstanding = Money::ZERO;
            record.transition(RentalStatus::Cancelled, now)?;
            (prior, refund)
        };

        // refund outside the record lock; a decline puts the record back
        let mut refund_reference = None;
        if refund.is_positive() {
            let original = prior.payment_reference.clone().unwrap_or_default();
            match self.gateway.refund(refund, &original) {
                PaymentOutcome::Approved { reference } => refund_reference = Some(reference),
                PaymentOutcome::Declined { reason } => {
                    *entry.lock() = prior;
                    warn!("refund of {} for rental {} declined: {}", refund, rental_id, reason);
                    self.emit(Event::PaymentDeclined {
                        rental_id: Some(rental_id),
                        amount: refund,
                        reason: reason.clone(),
                        timestamp: now,
                    });
                    return Err(RentalError::PaymentFailed {
                        amount: refund,
                        reason,
                    });
                }
            }
        }

        self.release_claim(&prior.asset_id);

        let record = entry.lock().clone();
        self.record_history(RentalHistoryEntry::capture(
            &record,
            refund,
            0,
            format!("cancelled, {} reserved points released", prior.reserved_points),
        ));

        self.emit(Event::StatusChanged {
            rental_id,
            old_status: prior.status,
            new_status: RentalStatus::Cancelled,
            reason: "cancelled by customer".to_string(),
            timestamp: now,
        });
        if let Some(reference) = refund_reference {
            self.emit(Event::RefundIssued {
                rental_id,
                amount: refund,
                reference,
                timestamp: now,
            });
        }
        self.emit(Event::RentalCancelled {
            rental_id,
            refund,
            timestamp: now,
        });

        if prior.amount_outstanding.is_positive() {
            info!(
                "rental {} cancelled with {} outstanding, written off",
                rental_id, prior.amount_outstanding
            );
        }
        info!("rental {} cancelled, refunded {}", rental_id, refund);
        Ok(record)
    }

    /// push the scheduled end out by whole billing units
    ///
    /// The extension stays in place when its payment is declined; the cost is then
    /// owed on the rental and reported as outstanding.
    pub fn extend_rental(
        &self,
        rental_id: RentalId,
        additional_units: u32,
        time: &SafeTimeProvider,
    ) -> Result<ExtensionOutcome> {
        if additional_units == 0 {
            return Err(RentalError::validation("additional_units", "must be at least 1"));
        }
        let now = time.now();
        let entry = self.entry(rental_id)?;
        let asset_id = entry.lock().asset_id.clone();
        let asset = self.asset_snapshot(&asset_id)?;
        let cost = self.pricing.extension_cost(&asset, additional_units);

        let (method, new_end) = {
            let mut record = entry.lock();
            record.require_active()?;
            if record.actual_end.is_some() {
                return Err(RentalError::InvalidState {
                    current: "overdue, settled".to_string(),
                    expected: RentalStatus::Active.to_string(),
                });
            }

            // work out the new schedule in full before touching the record
            let new_end = record
                .billing_unit
                .span(additional_units)
                .and_then(|step| record.scheduled_end.checked_add_signed(step));
            let billed_units = record.billed_units.checked_add(additional_units);
            let extended_units = record.extended_units.checked_add(additional_units);
            let (Some(new_end), Some(billed_units), Some(extended_units)) =
                (new_end, billed_units, extended_units)
            else {
                return Err(RentalError::validation(
                    "additional_units",
                    format!("extension of {} unit(s) is out of range", additional_units),
                ));
            };

            record.scheduled_end = new_end;
            record.billed_units = billed_units;
            record.extended_units = extended_units;
            record.breakdown = record.breakdown.with_extension(cost);
            record.updated_at = now;
            (record.payment_method.clone(), record.scheduled_end)
        };

        let payment = if cost.is_positive() {
            match self.charge_follow_up(&entry, cost, &method, "extension", now) {
                Ok(reference) => ExtensionPayment::Paid { reference },
                Err(reason) => ExtensionPayment::Outstanding { amount: cost, reason },
            }
        } else {
            ExtensionPayment::Paid {
                reference: String::new(),
            }
        };

        let record = entry.lock().clone();
        self.record_history(RentalHistoryEntry::capture(
            &record,
            cost,
            0,
            format!("extended by {} unit(s) to {}", additional_units, new_end),
        ));
        self.emit(Event::RentalExtended {
            rental_id,
            additional_units,
            cost,
            new_end,
            timestamp: now,
        });

        info!("rental {} extended to {}, cost {}", rental_id, new_end, cost);
        Ok(ExtensionOutcome {
            rental: record,
            additional_units,
            cost,
            payment,
        })
    }

    /// stamp the end of an overdue rental and charge its late fee before the return
    pub fn settle_overdue(&self, rental_id: RentalId, time: &SafeTimeProvider) -> Result<OverdueSettlement> {
        let now = time.now();
        let entry = self.entry(rental_id)?;
        let asset_id = entry.lock().asset_id.clone();
        let asset = self.asset_snapshot(&asset_id)?;

        let (late_fee, method) = {
            let mut record = entry.lock();
            record.require_active()?;
            if record.late_fee_assessed {
                return Err(RentalError::InvalidState {
                    current: "overdue, settled".to_string(),
                    expected: "overdue".to_string(),
                });
            }
            if !record.is_overdue(now) {
                return Err(RentalError::InvalidState {
                    current: RentalStatus::Active.to_string(),
                    expected: "overdue".to_string(),
                });
            }

            let calculation = self.pricing.assess_late_fee(&asset, record.scheduled_end, now);
            record.actual_end = Some(now);
            record.breakdown = record.breakdown.with_late_fee(calculation.fee);
            record.late_fee_assessed = true;
            record.updated_at = now;
            (calculation, record.payment_method.clone())
        };

        let payment = if late_fee.fee.is_positive() {
            self.emit(Event::LateFeeAssessed {
                rental_id,
                fee: late_fee.fee,
                overdue_units: late_fee.overdue_units,
                timestamp: now,
            });
            match self.charge_follow_up(&entry, late_fee.fee, &method, "late fee", now) {
                Ok(reference) => LateFeePayment::Paid { reference },
                Err(reason) => LateFeePayment::Outstanding {
                    amount: late_fee.fee,
                    reason,
                },
            }
        } else {
            LateFeePayment::NotDue
        };

        let record = entry.lock().clone();
        self.record_history(RentalHistoryEntry::capture(
            &record,
            late_fee.fee,
            0,
            format!("overdue settled, {} unit(s) late", late_fee.overdue_units),
        ));

        info!("rental {} overdue settlement, late fee {}", rental_id, late_fee.fee);
        Ok(OverdueSettlement {
            rental: record,
            late_fee,
            payment,
        })
    }

    /// book servicing on a catalog asset
    pub fn schedule_maintenance(
        &self,
        asset_id: &str,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        self.asset_snapshot(asset_id)?;
        self.maintenance.schedule(asset_id, maintenance_type, scheduled_date, time)
    }

    /// sign off servicing; the asset returns to service once nothing is open on it
    pub fn complete_maintenance(
        &self,
        record_id: MaintenanceId,
        cost: Money,
        notes: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        self.maintenance_asset(record_id)?;
        let record = self.maintenance.complete(record_id, cost, notes, time)?;
        self.return_to_service_if_clear(&record.asset_id, time)?;
        Ok(record)
    }

    pub fn cancel_maintenance(
        &self,
        record_id: MaintenanceId,
        reason: &str,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        self.maintenance_asset(record_id)?;
        let record = self.maintenance.cancel(record_id, reason, time)?;
        self.return_to_service_if_clear(&record.asset_id, time)?;
        Ok(record)
    }

    fn maintenance_asset(&self, record_id: MaintenanceId) -> Result<Asset> {
        let record = self
            .maintenance
            .record(record_id)
            .ok_or(RentalError::MaintenanceRecordNotFound { id: record_id })?;
        self.asset_snapshot(&record.asset_id)
    }

    fn return_to_service_if_clear(&self, asset_id: &str, time: &SafeTimeProvider) -> Result<bool> {
        let mut restored = false;
        self.catalog.update(asset_id, &mut |asset: &mut Asset| {
            if asset.availability == AssetAvailability::InMaintenance
                && !self.maintenance.has_open_work(&asset.id)
            {
                asset.availability = AssetAvailability::Available;
                restored = true;
            }
        })?;

        if restored {
            info!("asset {} back in service", asset_id);
            self.emit(Event::AssetReturnedToService {
                asset_id: asset_id.to_string(),
                timestamp: time.now(),
            });
        } else {
            debug!("asset {} still has open maintenance or was not held", asset_id);
        }
        Ok(restored)
    }

    pub fn rental(&self, rental_id: RentalId) -> Result<RentalRecord> {
        Ok(self.entry(rental_id)?.lock().clone())
    }

    fn rentals_matching(&self, filter: impl Fn(&RentalRecord) -> bool) -> Vec<RentalRecord> {
        let mut records: Vec<RentalRecord> = self
            .rentals
            .read()
            .values()
            .map(|r| r.lock().clone())
            .filter(|r| filter(r))
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    pub fn active_rentals_for_customer(&self, customer_id: &str) -> Vec<RentalRecord> {
        self.rentals_matching(|r| r.customer_id == customer_id && r.is_active())
    }

    pub fn rentals_for_asset(&self, asset_id: &str) -> Vec<RentalRecord> {
        self.rentals_matching(|r| r.asset_id == asset_id)
    }

    pub fn overdue_rentals(&self, now: DateTime<Utc>) -> Vec<RentalRecord> {
        self.rentals_matching(|r| r.is_overdue(now))
    }

    pub fn history_for_customer(&self, customer_id: &str) -> Vec<RentalHistoryEntry> {
        self.history
            .lock()
            .iter()
            .filter(|h| h.customer_id == customer_id)
            .cloned()
            .collect()
    }

    pub fn history_for_rental(&self, rental_id: RentalId) -> Vec<RentalHistoryEntry> {
        self.history
            .lock()
            .iter()
            .filter(|h| h.rental_id == rental_id)
            .cloned()
            .collect()
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }

    pub fn loyalty_snapshot(&self, customer_id: &str) -> Result<LoyaltySnapshot> {
        self.loyalty.snapshot(customer_id)
    }

    pub fn view(&self, rental_id: RentalId, time: &SafeTimeProvider) -> Result<RentalView> {
        Ok(RentalView::from_record(&self.rental(rental_id)?, time.now()))
    }

    pub fn receipt(&self, rental_id: RentalId) -> Result<Receipt> {
        Ok(Receipt::from_record(&self.rental(rental_id)?))
    }
}
