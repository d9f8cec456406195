use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::asset::{Asset, AssetAvailability};
use crate::config::RentalConfig;
use crate::decimal::Money;
use crate::errors::{RentalError, Result};
use crate::types::{AssetId, MaintenanceId, MaintenanceStatus, MaintenanceType};

/// servicing job on one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: MaintenanceId,
    pub asset_id: AssetId,
    pub maintenance_type: MaintenanceType,
    pub status: MaintenanceStatus,
    pub scheduled_date: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cost: Money,
    pub technician: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MaintenanceRecord {
    pub fn new(
        asset_id: &str,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_id: asset_id.to_string(),
            maintenance_type,
            status: MaintenanceStatus::Scheduled,
            scheduled_date,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cost: Money::ZERO,
            technician: None,
            notes: None,
            created_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// scheduled work whose date has passed without being started
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == MaintenanceStatus::Scheduled && self.scheduled_date < now
    }
}

/// usage-threshold trigger and maintenance record store
#[derive(Debug)]
pub struct MaintenanceScheduler {
    config: Arc<RentalConfig>,
    records: Mutex<HashMap<MaintenanceId, MaintenanceRecord>>,
}

impl MaintenanceScheduler {
    pub fn new(config: Arc<RentalConfig>) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// per-asset override, else the category rule, else the configured default
    pub fn threshold_for(&self, asset: &Asset) -> u32 {
        asset
            .maintenance_threshold
            .or_else(|| {
                self.config
                    .category_rule(&asset.category)
                    .map(|r| r.maintenance_threshold)
            })
            .unwrap_or(self.config.maintenance.default_threshold)
    }

    /// run after a completed rental, with the asset lock held by the caller
    ///
    /// Pulls the asset from service and opens an inspection once its rolling usage
    /// reaches the threshold. Usage restarts from zero so the next trigger needs a
    /// full threshold of further rentals.
    pub fn evaluate(&self, asset: &mut Asset, time: &SafeTimeProvider) -> Option<MaintenanceRecord> {
        let threshold = self.threshold_for(asset);
        if asset.usage_count < threshold {
            debug!(
                "asset {} usage {}/{} below maintenance threshold",
                asset.id, asset.usage_count, threshold
            );
            return None;
        }

        let now = time.now();
        let record = MaintenanceRecord::new(
            &asset.id,
            MaintenanceType::GeneralInspection,
            now + Duration::days(self.config.maintenance.inspection_lead_days),
            now,
        );

        asset.availability = AssetAvailability::InMaintenance;
        asset.usage_count = 0;
        self.records.lock().insert(record.id, record.clone());

        info!(
            "asset {} reached {} rentals, inspection {} scheduled for {}",
            asset.id, threshold, record.id, record.scheduled_date
        );
        Some(record)
    }

    /// book servicing by hand; the asset stays in service until the work starts
    pub fn schedule(
        &self,
        asset_id: &str,
        maintenance_type: MaintenanceType,
        scheduled_date: DateTime<Utc>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        if asset_id.trim().is_empty() {
            return Err(RentalError::validation("asset_id", "must not be empty"));
        }
        let now = time.now();
        if scheduled_date < now {
            return Err(RentalError::validation("scheduled_date", "must not be in the past"));
        }

        let record = MaintenanceRecord::new(asset_id, maintenance_type, scheduled_date, now);
        self.records.lock().insert(record.id, record.clone());
        info!("scheduled {:?} for asset {} on {}", maintenance_type, asset_id, scheduled_date);
        Ok(record)
    }

    fn transition(
        &self,
        id: MaintenanceId,
        attempted: &str,
        allowed: &[MaintenanceStatus],
        apply: impl FnOnce(&mut MaintenanceRecord),
    ) -> Result<MaintenanceRecord> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(&id)
            .ok_or(RentalError::MaintenanceRecordNotFound { id })?;

        if !allowed.contains(&record.status) {
            return Err(RentalError::InvalidMaintenanceState {
                id,
                current: record.status,
                attempted: attempted.to_string(),
            });
        }
        apply(record);
        Ok(record.clone())
    }

    pub fn start(
        &self,
        id: MaintenanceId,
        technician: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        let now = time.now();
        self.transition(id, "start", &[MaintenanceStatus::Scheduled], |record| {
            record.status = MaintenanceStatus::InProgress;
            record.started_at = Some(now);
            if technician.is_some() {
                record.technician = technician;
            }
        })
    }

    pub fn complete(
        &self,
        id: MaintenanceId,
        cost: Money,
        notes: Option<String>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        if cost.is_negative() {
            return Err(RentalError::validation("cost", "must not be negative"));
        }
        let now = time.now();
        let record = self.transition(id, "complete", &[MaintenanceStatus::InProgress], |record| {
            record.status = MaintenanceStatus::Completed;
            record.completed_at = Some(now);
            record.cost = cost;
            if notes.is_some() {
                record.notes = notes;
            }
        })?;
        info!("maintenance {} on asset {} completed, cost {}", id, record.asset_id, cost);
        Ok(record)
    }

    pub fn cancel(
        &self,
        id: MaintenanceId,
        reason: &str,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        let now = time.now();
        let record = self.transition(
            id,
            "cancel",
            &[MaintenanceStatus::Scheduled, MaintenanceStatus::InProgress],
            |record| {
                record.status = MaintenanceStatus::Cancelled;
                record.cancelled_at = Some(now);
                record.notes = Some(reason.to_string());
            },
        )?;
        info!("maintenance {} on asset {} cancelled: {}", id, record.asset_id, reason);
        Ok(record)
    }

    pub fn reschedule(
        &self,
        id: MaintenanceId,
        new_date: DateTime<Utc>,
        time: &SafeTimeProvider,
    ) -> Result<MaintenanceRecord> {
        if new_date < time.now() {
            return Err(RentalError::validation("scheduled_date", "must not be in the past"));
        }
        self.transition(id, "reschedule", &[MaintenanceStatus::Scheduled], |record| {
            record.scheduled_date = new_date;
        })
    }

    pub fn record(&self, id: MaintenanceId) -> Option<MaintenanceRecord> {
        self.records.lock().get(&id).cloned()
    }

    fn collect(&self, filter: impl Fn(&MaintenanceRecord) -> bool) -> Vec<MaintenanceRecord> {
        let mut records: Vec<MaintenanceRecord> = self
            .records
            .lock()
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.scheduled_date);
        records
    }

    /// scheduled work past its date
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<MaintenanceRecord> {
        self.collect(|r| r.is_overdue(now))
    }

    /// scheduled work due within the window
    pub fn upcoming(&self, now: DateTime<Utc>, within: Duration) -> Vec<MaintenanceRecord> {
        let horizon = now + within;
        self.collect(|r| {
            r.status == MaintenanceStatus::Scheduled
                && r.scheduled_date >= now
                && r.scheduled_date <= horizon
        })
    }

    pub fn for_asset(&self, asset_id: &str) -> Vec<MaintenanceRecord> {
        self.collect(|r| r.asset_id == asset_id)
    }

    pub fn open_for_asset(&self, asset_id: &str) -> Vec<MaintenanceRecord> {
        self.collect(|r| r.asset_id == asset_id && r.is_open())
    }

    pub fn has_open_work(&self, asset_id: &str) -> bool {
        self.records
            .lock()
            .values()
            .any(|r| r.asset_id == asset_id && r.is_open())
    }
}
