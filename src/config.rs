use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{RentalError, Result};
use crate::pricing::{AddOnPricing, AddOnTemplate};
use crate::types::{AssetCategory, BillingUnit, CategoryTier, DisplayTier, MembershipLevel, Points};

/// rental engine configuration, loaded once and shared by reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentalConfig {
    pub pricing: PricingConfig,
    pub categories: BTreeMap<AssetCategory, CategoryRule>,
    pub add_ons: Vec<AddOnTemplate>,
    pub loyalty: LoyaltyConfig,
    pub maintenance: MaintenanceConfig,
}

/// pricing terms shared by every category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    pub tax_rate: Rate,
    pub late_fee_multiplier: Decimal,
    pub cancellation_window_hours: i64,
    pub discounts: DiscountTable,
}

/// per-category rule replacing per-type subclasses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub tier: CategoryTier,
    pub billing_unit: BillingUnit,
    /// flat points awarded per completed rental
    pub loyalty_points: Points,
    /// completed rentals between inspections
    pub maintenance_threshold: u32,
}

/// discount rates indexed by membership level and category tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountTable {
    pub member: TierRates,
    pub vip: TierRates,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierRates {
    pub economy: Rate,
    pub standard: Rate,
    pub luxury: Rate,
}

impl TierRates {
    pub fn rate(&self, tier: CategoryTier) -> Rate {
        match tier {
            CategoryTier::Economy => self.economy,
            CategoryTier::Standard => self.standard,
            CategoryTier::Luxury => self.luxury,
        }
    }
}

impl DiscountTable {
    pub fn rate(&self, level: MembershipLevel, tier: CategoryTier) -> Rate {
        match level {
            MembershipLevel::NonMember => Rate::ZERO,
            MembershipLevel::Member => self.member.rate(tier),
            MembershipLevel::Vip => self.vip.rate(tier),
        }
    }
}

/// loyalty thresholds
///
/// `display_tiers` and the VIP thresholds are two separate ladders and are
/// deliberately not derived from each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoyaltyConfig {
    pub vip_point_threshold: Points,
    pub vip_rental_threshold: u32,
    /// extra points granted to VIP accounts on settlement, as a share of earned points
    pub vip_bonus_rate: Rate,
    pub display_tiers: Vec<TierThreshold>,
    /// lowest display tier reported for a VIP account
    pub vip_floor_tier: DisplayTier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThreshold {
    pub tier: DisplayTier,
    pub min_lifetime_points: Points,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// used when a category has no rule
    pub default_threshold: u32,
    /// days between the triggering return and the scheduled inspection
    pub inspection_lead_days: i64,
}

impl RentalConfig {
    /// vessel rentals out of a marina
    pub fn marina() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            AssetCategory::new("kayak"),
            CategoryRule {
                tier: CategoryTier::Economy,
                billing_unit: BillingUnit::Hour,
                loyalty_points: 10,
                maintenance_threshold: 25,
            },
        );
        categories.insert(
            AssetCategory::new("jet_ski"),
            CategoryRule {
                tier: CategoryTier::Standard,
                billing_unit: BillingUnit::Hour,
                loyalty_points: 25,
                maintenance_threshold: 15,
            },
        );
        categories.insert(
            AssetCategory::new("pontoon"),
            CategoryRule {
                tier: CategoryTier::Economy,
                billing_unit: BillingUnit::Day,
                loyalty_points: 50,
                maintenance_threshold: 12,
            },
        );
        categories.insert(
            AssetCategory::new("speedboat"),
            CategoryRule {
                tier: CategoryTier::Standard,
                billing_unit: BillingUnit::Day,
                loyalty_points: 100,
                maintenance_threshold: 10,
            },
        );
        categories.insert(
            AssetCategory::new("yacht"),
            CategoryRule {
                tier: CategoryTier::Luxury,
                billing_unit: BillingUnit::Day,
                loyalty_points: 250,
                maintenance_threshold: 8,
            },
        );

        Self {
            pricing: PricingConfig::standard(),
            categories,
            add_ons: vec![
                AddOnTemplate::per_unit("life_jacket", Money::from_major(5), &[]),
                AddOnTemplate::flat(
                    "fishing_gear",
                    Money::from_major(40),
                    &["pontoon", "speedboat", "yacht"],
                ),
                AddOnTemplate::per_unit("captain", Money::from_major(150), &["speedboat", "yacht"]),
                AddOnTemplate::flat(
                    "fuel_package",
                    Money::from_major(75),
                    &["jet_ski", "speedboat", "yacht"],
                ),
            ],
            loyalty: LoyaltyConfig::standard(),
            maintenance: MaintenanceConfig {
                default_threshold: 10,
                inspection_lead_days: 1,
            },
        }
    }

    /// road vehicle rentals
    pub fn fleet() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(
            AssetCategory::new("economy_car"),
            CategoryRule {
                tier: CategoryTier::Economy,
                billing_unit: BillingUnit::Day,
                loyalty_points: 20,
                maintenance_threshold: 20,
            },
        );
        categories.insert(
            AssetCategory::new("suv"),
            CategoryRule {
                tier: CategoryTier::Standard,
                billing_unit: BillingUnit::Day,
                loyalty_points: 35,
                maintenance_threshold: 15,
            },
        );
        categories.insert(
            AssetCategory::new("van"),
            CategoryRule {
                tier: CategoryTier::Standard,
                billing_unit: BillingUnit::Day,
                loyalty_points: 40,
                maintenance_threshold: 15,
            },
        );
        categories.insert(
            AssetCategory::new("luxury_car"),
            CategoryRule {
                tier: CategoryTier::Luxury,
                billing_unit: BillingUnit::Day,
                loyalty_points: 60,
                maintenance_threshold: 10,
            },
        );

        Self {
            pricing: PricingConfig::standard(),
            categories,
            add_ons: vec![
                AddOnTemplate::per_unit("gps", Money::from_major(8), &[]),
                AddOnTemplate::per_unit("child_seat", Money::from_major(12), &[]),
                AddOnTemplate::per_unit("insurance", Money::from_major(25), &[]),
                AddOnTemplate::flat("roof_rack", Money::from_major(30), &["suv", "van"]),
            ],
            loyalty: LoyaltyConfig::standard(),
            maintenance: MaintenanceConfig {
                default_threshold: 15,
                inspection_lead_days: 1,
            },
        }
    }

    /// parse and validate a json configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RentalConfig =
            serde_json::from_str(json).map_err(|e| RentalError::InvalidConfiguration {
                message: format!("malformed json: {}", e),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| RentalError::InvalidConfiguration {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn category_rule(&self, category: &AssetCategory) -> Option<&CategoryRule> {
        self.categories.get(category)
    }

    pub fn add_on(&self, name: &str) -> Option<&AddOnTemplate> {
        self.add_ons.iter().find(|a| a.name == name)
    }

    /// reject tables that would break pricing or loyalty rules
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(RentalError::InvalidConfiguration { message });

        let pricing = &self.pricing;
        if pricing.tax_rate.as_decimal() < Decimal::ZERO || pricing.tax_rate >= Rate::ONE {
            return invalid(format!("tax rate {} out of range", pricing.tax_rate));
        }
        if pricing.late_fee_multiplier < Decimal::ONE {
            return invalid(format!(
                "late fee multiplier {} below 1",
                pricing.late_fee_multiplier
            ));
        }
        if pricing.cancellation_window_hours < 0 {
            return invalid("negative cancellation window".to_string());
        }

        for tier in [CategoryTier::Economy, CategoryTier::Standard, CategoryTier::Luxury] {
            let member = pricing.discounts.member.rate(tier);
            let vip = pricing.discounts.vip.rate(tier);
            for rate in [member, vip] {
                if rate.as_decimal() < Decimal::ZERO || rate >= Rate::ONE {
                    return invalid(format!("discount {} for {:?} out of range", rate, tier));
                }
            }
            if vip < member {
                return invalid(format!(
                    "vip discount {} below member discount {} for {:?}",
                    vip, member, tier
                ));
            }
        }

        if self.categories.is_empty() {
            return invalid("no categories configured".to_string());
        }
        for (category, rule) in &self.categories {
            if rule.maintenance_threshold == 0 {
                return invalid(format!("zero maintenance threshold for {}", category));
            }
        }
        if self.maintenance.default_threshold == 0 {
            return invalid("zero default maintenance threshold".to_string());
        }

        let mut names = HashSet::new();
        for add_on in &self.add_ons {
            if !names.insert(add_on.name.as_str()) {
                return invalid(format!("duplicate add-on {}", add_on.name));
            }
            let price = match add_on.pricing {
                AddOnPricing::Flat(p) | AddOnPricing::PerUnit(p) => p,
            };
            if price.is_negative() {
                return invalid(format!("negative price for add-on {}", add_on.name));
            }
            if let Some(unknown) = add_on
                .eligible_categories
                .iter()
                .find(|c| !self.categories.contains_key(*c))
            {
                return invalid(format!(
                    "add-on {} references unknown category {}",
                    add_on.name, unknown
                ));
            }
        }

        let ladder = &self.loyalty.display_tiers;
        if ladder.first().map(|t| t.min_lifetime_points) != Some(0) {
            return invalid("display tier ladder must start at 0 points".to_string());
        }
        if ladder
            .windows(2)
            .any(|w| w[1].min_lifetime_points <= w[0].min_lifetime_points || w[1].tier <= w[0].tier)
        {
            return invalid("display tier ladder must be strictly ascending".to_string());
        }

        Ok(())
    }
}

impl PricingConfig {
    pub fn standard() -> Self {
        Self {
            tax_rate: Rate::from_percentage(6),
            late_fee_multiplier: dec!(1.5),
            cancellation_window_hours: 48,
            discounts: DiscountTable {
                member: TierRates {
                    economy: Rate::from_percentage(10),
                    standard: Rate::from_percentage(7),
                    luxury: Rate::from_percentage(5),
                },
                vip: TierRates {
                    economy: Rate::from_percentage(15),
                    standard: Rate::from_percentage(10),
                    luxury: Rate::from_percentage(8),
                },
            },
        }
    }
}

impl LoyaltyConfig {
    pub fn standard() -> Self {
        Self {
            vip_point_threshold: 1_000,
            vip_rental_threshold: 10,
            vip_bonus_rate: Rate::from_percentage(50),
            display_tiers: vec![
                TierThreshold { tier: DisplayTier::Bronze, min_lifetime_points: 0 },
                TierThreshold { tier: DisplayTier::Silver, min_lifetime_points: 500 },
                TierThreshold { tier: DisplayTier::Gold, min_lifetime_points: 1_500 },
                TierThreshold { tier: DisplayTier::Platinum, min_lifetime_points: 5_000 },
            ],
            vip_floor_tier: DisplayTier::Gold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(RentalConfig::marina().validate().is_ok());
        assert!(RentalConfig::fleet().validate().is_ok());
    }

    #[test]
    fn test_discount_axes() {
        let table = PricingConfig::standard().discounts;
        for tier in [CategoryTier::Economy, CategoryTier::Standard, CategoryTier::Luxury] {
            assert_eq!(table.rate(MembershipLevel::NonMember, tier), Rate::ZERO);
            assert!(table.rate(MembershipLevel::Vip, tier) > table.rate(MembershipLevel::Member, tier));
        }
        assert!(
            table.rate(MembershipLevel::Member, CategoryTier::Economy)
                > table.rate(MembershipLevel::Member, CategoryTier::Luxury)
        );
    }

    #[test]
    fn test_json_round_trip_keeps_tables() {
        let json = RentalConfig::marina().to_json_pretty().unwrap();
        let config = RentalConfig::from_json_str(&json).unwrap();

        let speedboat = config.category_rule(&AssetCategory::new("speedboat")).unwrap();
        assert_eq!(speedboat.billing_unit, BillingUnit::Day);
        assert_eq!(speedboat.maintenance_threshold, 10);
        assert!(config.add_on("captain").is_some());
        assert_eq!(config.pricing.cancellation_window_hours, 48);
    }

    #[test]
    fn test_rejects_vip_below_member() {
        let mut config = RentalConfig::fleet();
        config.pricing.discounts.vip.luxury = Rate::from_percentage(1);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, RentalError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_rejects_add_on_for_unknown_category() {
        let mut config = RentalConfig::fleet();
        config
            .add_ons
            .push(AddOnTemplate::flat("snorkel", Money::from_major(5), &["kayak"]));

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = RentalConfig::from_json_str("{ \"pricing\": 3 }").unwrap_err();
        assert!(matches!(err, RentalError::InvalidConfiguration { .. }));
    }
}
