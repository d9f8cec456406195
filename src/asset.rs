use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::{RentalError, Result};
use crate::types::{AssetCategory, AssetId};

/// availability of a catalog asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetAvailability {
    Available,
    /// claimed by a rental
    Rented,
    /// pulled for servicing
    InMaintenance,
}

/// bookable vessel or vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub category: AssetCategory,
    /// price per billing unit of the category
    pub base_price: Money,
    pub capacity: u32,
    pub availability: AssetAvailability,
    /// completed rentals since the last inspection
    pub usage_count: u32,
    /// completed rentals over the asset's life
    pub rental_count: u32,
    /// overrides the category threshold when set
    pub maintenance_threshold: Option<u32>,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: AssetCategory,
        base_price: Money,
        capacity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            base_price,
            capacity,
            availability: AssetAvailability::Available,
            usage_count: 0,
            rental_count: 0,
            maintenance_threshold: None,
        }
    }

    pub fn with_maintenance_threshold(mut self, threshold: u32) -> Self {
        self.maintenance_threshold = Some(threshold);
        self
    }

    pub fn with_usage(mut self, usage_count: u32) -> Self {
        self.usage_count = usage_count;
        self
    }

    pub fn is_available(&self) -> bool {
        self.availability == AssetAvailability::Available
    }

    pub fn category(&self) -> &AssetCategory {
        &self.category
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// check-and-set; false when the asset is not available
    pub fn claim(&mut self) -> bool {
        if !self.is_available() {
            return false;
        }
        self.availability = AssetAvailability::Rented;
        true
    }

    /// hand a rented asset back; maintenance holds are left alone
    pub fn release(&mut self) {
        if self.availability == AssetAvailability::Rented {
            self.availability = AssetAvailability::Available;
        }
    }

    pub fn increment_usage(&mut self) {
        self.usage_count += 1;
        self.rental_count += 1;
    }
}

/// catalog collaborator as seen by the rental core
pub trait AssetCatalog: Send + Sync {
    /// snapshot of the asset
    fn find_by_id(&self, id: &str) -> Option<Asset>;

    /// atomically check availability and mark the asset rented
    fn try_claim(&self, id: &str) -> Result<Asset>;

    fn release(&self, id: &str) -> Result<Asset>;

    /// mutate an asset while holding its lock
    fn update(&self, id: &str, f: &mut dyn FnMut(&mut Asset)) -> Result<Asset>;

    fn list(&self) -> Vec<Asset>;
}

/// catalog held in memory with one lock per asset
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    assets: RwLock<HashMap<AssetId, Arc<Mutex<Asset>>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let catalog = Self::new();
        for asset in assets {
            catalog.insert(asset);
        }
        catalog
    }

    pub fn insert(&self, asset: Asset) {
        self.assets
            .write()
            .insert(asset.id.clone(), Arc::new(Mutex::new(asset)));
    }

    fn entry(&self, id: &str) -> Option<Arc<Mutex<Asset>>> {
        self.assets.read().get(id).cloned()
    }
}

impl AssetCatalog for InMemoryCatalog {
    fn find_by_id(&self, id: &str) -> Option<Asset> {
        self.entry(id).map(|a| a.lock().clone())
    }

    fn try_claim(&self, id: &str) -> Result<Asset> {
        let entry = self.entry(id).ok_or_else(|| RentalError::AssetUnavailable {
            asset_id: id.to_string(),
            reason: "not in catalog".to_string(),
        })?;

        let mut asset = entry.lock();
        if !asset.claim() {
            return Err(RentalError::AssetUnavailable {
                asset_id: id.to_string(),
                reason: format!("asset is {:?}", asset.availability),
            });
        }
        debug!("claimed asset {}", id);
        Ok(asset.clone())
    }

    fn release(&self, id: &str) -> Result<Asset> {
        let entry = self.entry(id).ok_or_else(|| RentalError::AssetNotFound {
            asset_id: id.to_string(),
        })?;

        let mut asset = entry.lock();
        asset.release();
        debug!("released asset {}", id);
        Ok(asset.clone())
    }

    fn update(&self, id: &str, f: &mut dyn FnMut(&mut Asset)) -> Result<Asset> {
        let entry = self.entry(id).ok_or_else(|| RentalError::AssetNotFound {
            asset_id: id.to_string(),
        })?;

        let mut asset = entry.lock();
        f(&mut asset);
        Ok(asset.clone())
    }

    fn list(&self) -> Vec<Asset> {
        let mut assets: Vec<Asset> = self
            .assets
            .read()
            .values()
            .map(|a| a.lock().clone())
            .collect();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn speedboat() -> Asset {
        Asset::new("SB-1", "Sea Ray", AssetCategory::new("speedboat"), Money::from_major(500), 8)
    }

    #[test]
    fn test_claim_is_exclusive() {
        let catalog = InMemoryCatalog::with_assets([speedboat()]);

        assert!(catalog.try_claim("SB-1").is_ok());
        let err = catalog.try_claim("SB-1").unwrap_err();
        assert!(matches!(err, RentalError::AssetUnavailable { .. }));

        catalog.release("SB-1").unwrap();
        assert!(catalog.try_claim("SB-1").is_ok());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let catalog = InMemoryCatalog::with_assets([speedboat()]);
        let winners = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    if catalog.try_claim("SB-1").is_ok() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_asset_is_unavailable() {
        let catalog = InMemoryCatalog::new();
        assert!(matches!(
            catalog.try_claim("nope"),
            Err(RentalError::AssetUnavailable { .. })
        ));
        assert!(matches!(
            catalog.release("nope"),
            Err(RentalError::AssetNotFound { .. })
        ));
    }

    #[test]
    fn test_release_keeps_maintenance_hold() {
        let mut asset = speedboat();
        asset.availability = AssetAvailability::InMaintenance;
        asset.release();
        assert_eq!(asset.availability, AssetAvailability::InMaintenance);
        assert!(!asset.claim());
    }

    #[test]
    fn test_update_runs_under_lock() {
        let catalog = InMemoryCatalog::with_assets([speedboat()]);
        let updated = catalog
            .update("SB-1", &mut |asset| asset.increment_usage())
            .unwrap();

        assert_eq!(updated.usage_count, 1);
        assert_eq!(updated.rental_count, 1);
        assert_eq!(catalog.find_by_id("SB-1").unwrap().usage_count, 1);
    }
}
