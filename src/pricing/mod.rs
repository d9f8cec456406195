pub mod addons;
pub mod late_fee;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::asset::Asset;
use crate::config::{CategoryRule, RentalConfig};
use crate::decimal::{Money, Rate};
use crate::errors::{RentalError, Result};
use crate::rental::RentalRecord;
use crate::types::{AssetCategory, BillingUnit, MembershipLevel, Points};

pub use addons::{AddOnPricing, AddOnSelection, AddOnTemplate, SelectedAddOn};
pub use late_fee::{LateFeeCalculation, LateFeePolicy};

/// itemized cost of a rental
///
/// `total` is always recomputed from the components, never adjusted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base: Money,
    pub discount: Money,
    /// base less discount
    pub subtotal: Money,
    pub add_ons: Money,
    pub tax: Money,
    /// extension time at the undiscounted unit rate, untaxed
    #[serde(default)]
    pub extensions: Money,
    pub late_fee: Money,
    pub refund: Money,
    /// unpaid charges dropped when the booking is cancelled
    #[serde(default)]
    pub written_off: Money,
    pub total: Money,
    pub loyalty_points: Points,
}

impl PricingBreakdown {
    pub fn new(
        base: Money,
        discount: Money,
        add_ons: Money,
        tax: Money,
        loyalty_points: Points,
    ) -> Self {
        Self {
            base,
            discount,
            subtotal: Money::ZERO,
            add_ons,
            tax,
            extensions: Money::ZERO,
            late_fee: Money::ZERO,
            refund: Money::ZERO,
            written_off: Money::ZERO,
            total: Money::ZERO,
            loyalty_points,
        }
        .reconciled()
    }

    fn reconciled(mut self) -> Self {
        self.subtotal = self.base - self.discount;
        self.total = self.charges() - self.refund - self.written_off;
        self
    }

    /// everything billed on the rental before refunds and write-offs
    pub fn charges(&self) -> Money {
        self.subtotal + self.add_ons + self.tax + self.extensions + self.late_fee
    }

    pub fn with_late_fee(&self, late_fee: Money) -> Self {
        Self {
            late_fee,
            ..self.clone()
        }
        .reconciled()
    }

    pub fn with_refund(&self, refund: Money) -> Self {
        Self {
            refund,
            ..self.clone()
        }
        .reconciled()
    }

    /// extension time stacks on top of the booked amount; base, discount and tax stay as quoted
    pub fn with_extension(&self, extension_cost: Money) -> Self {
        Self {
            extensions: self.extensions + extension_cost,
            ..self.clone()
        }
        .reconciled()
    }

    pub fn with_write_off(&self, written_off: Money) -> Self {
        Self {
            written_off,
            ..self.clone()
        }
        .reconciled()
    }

    pub fn is_reconciled(&self) -> bool {
        self.subtotal == self.base - self.discount
            && self.total == self.charges() - self.refund - self.written_off
    }
}

/// inputs for a full breakdown
#[derive(Debug, Clone)]
pub struct PricingInput<'a> {
    pub asset: &'a Asset,
    pub units: u32,
    pub add_ons: &'a [SelectedAddOn],
    pub membership: MembershipLevel,
    pub late_fee: Money,
    pub refund: Money,
}

/// stateless calculator over the injected configuration
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: Arc<RentalConfig>,
    late_fees: LateFeePolicy,
}

impl PricingEngine {
    pub fn new(config: Arc<RentalConfig>) -> Self {
        let late_fees = LateFeePolicy::new(config.pricing.late_fee_multiplier);
        Self { config, late_fees }
    }

    pub fn config(&self) -> &RentalConfig {
        &self.config
    }

    fn rule(&self, category: &AssetCategory) -> Option<&CategoryRule> {
        self.config.category_rule(category)
    }

    /// unit rate for the asset, zero when its category has no pricing rule
    fn unit_rate(&self, asset: &Asset) -> Money {
        match self.rule(&asset.category) {
            Some(_) => asset.base_price,
            None => {
                warn!(
                    "no pricing rule for category {} of asset {}, pricing at zero",
                    asset.category, asset.id
                );
                Money::ZERO
            }
        }
    }

    /// billing unit of a category; unknown categories bill by the day
    pub fn billing_unit(&self, category: &AssetCategory) -> BillingUnit {
        self.rule(category)
            .map(|r| r.billing_unit)
            .unwrap_or(BillingUnit::Day)
    }

    /// units billed for a scheduled span, at least one
    pub fn billing_units(
        &self,
        category: &AssetCategory,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> u32 {
        self.billing_unit(category).units_covering(end - start).max(1)
    }

    pub fn base_amount(&self, asset: &Asset, units: u32) -> Money {
        self.unit_rate(asset).times(units)
    }

    pub fn discount_rate(&self, membership: MembershipLevel, category: &AssetCategory) -> Rate {
        match self.rule(category) {
            Some(rule) => self.config.pricing.discounts.rate(membership, rule.tier),
            None => Rate::ZERO,
        }
    }

    /// discount on the base amount only
    pub fn member_discount(
        &self,
        membership: MembershipLevel,
        base: Money,
        category: &AssetCategory,
    ) -> Money {
        base.apply_rate(self.discount_rate(membership, category))
    }

    pub fn tax(&self, subtotal: Money) -> Money {
        subtotal.apply_rate(self.config.pricing.tax_rate)
    }

    pub fn add_ons_total(&self, add_ons: &[SelectedAddOn]) -> Money {
        add_ons.iter().map(SelectedAddOn::line_total).sum()
    }

    pub fn late_fee(&self, unit_rate: Money, overdue_units: u32) -> Money {
        self.late_fees.calculate(unit_rate, overdue_units).fee
    }

    /// late fee for an asset returned at `actual_end`
    pub fn assess_late_fee(
        &self,
        asset: &Asset,
        scheduled_end: DateTime<Utc>,
        actual_end: DateTime<Utc>,
    ) -> LateFeeCalculation {
        let unit = self.billing_unit(&asset.category);
        let units = self.late_fees.overdue_units(unit, scheduled_end, actual_end);
        self.late_fees.calculate(self.unit_rate(asset), units)
    }

    /// same unit price as the base amount
    pub fn extension_cost(&self, asset: &Asset, additional_units: u32) -> Money {
        self.base_amount(asset, additional_units)
    }

    /// full refund of what was paid; only reachable inside the cancellation window
    pub fn refund_amount(&self, rental: &RentalRecord) -> Money {
        rental.amount_paid
    }

    /// flat points per category
    pub fn loyalty_points(&self, category: &AssetCategory) -> Points {
        self.rule(category).map(|r| r.loyalty_points).unwrap_or(0)
    }

    pub fn breakdown(&self, input: &PricingInput<'_>) -> PricingBreakdown {
        let category = &input.asset.category;
        let base = self.base_amount(input.asset, input.units);
        let discount = self.member_discount(input.membership, base, category);
        let tax = self.tax(base - discount);
        let add_ons = self.add_ons_total(input.add_ons);

        PricingBreakdown::new(base, discount, add_ons, tax, self.loyalty_points(category))
            .with_late_fee(input.late_fee)
            .with_refund(input.refund)
    }

    /// breakdown at booking time
    pub fn quote(
        &self,
        asset: &Asset,
        units: u32,
        add_ons: &[SelectedAddOn],
        membership: MembershipLevel,
    ) -> PricingBreakdown {
        self.breakdown(&PricingInput {
            asset,
            units,
            add_ons,
            membership,
            late_fee: Money::ZERO,
            refund: Money::ZERO,
        })
    }

    /// copy requested add-ons from the catalog, checking names, counts and eligibility
    pub fn resolve_add_ons(
        &self,
        category: &AssetCategory,
        selections: &[AddOnSelection],
    ) -> Result<Vec<SelectedAddOn>> {
        selections
            .iter()
            .map(|selection| {
                let template = self.config.add_on(&selection.name).ok_or_else(|| {
                    RentalError::validation("add_ons", format!("unknown add-on {}", selection.name))
                })?;
                if selection.count == 0 {
                    return Err(RentalError::validation(
                        "add_ons",
                        format!("add-on {} needs a count of at least 1", selection.name),
                    ));
                }
                if !template.is_eligible(category) {
                    return Err(RentalError::validation(
                        "add_ons",
                        format!("add-on {} not offered for {}", selection.name, category),
                    ));
                }
                Ok(template.select(selection.count))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(Arc::new(RentalConfig::marina()))
    }

    fn speedboat() -> Asset {
        Asset::new("SB-1", "Sea Ray", AssetCategory::new("speedboat"), Money::from_major(500), 8)
    }

    #[test]
    fn test_vip_three_day_scenario() {
        let engine = engine();
        let breakdown = engine.quote(&speedboat(), 3, &[], MembershipLevel::Vip);

        assert_eq!(breakdown.base, Money::from_major(1_500));
        assert_eq!(breakdown.discount, Money::from_major(150));
        assert_eq!(breakdown.subtotal, Money::from_major(1_350));
        assert_eq!(breakdown.tax, Money::from_major(81));
        assert_eq!(breakdown.total, Money::from_major(1_431));
        assert_eq!(breakdown.refund, Money::ZERO);
        assert_eq!(breakdown.loyalty_points, 100);
    }

    #[test]
    fn test_non_member_pays_full_base() {
        let breakdown = engine().quote(&speedboat(), 2, &[], MembershipLevel::NonMember);
        assert_eq!(breakdown.discount, Money::ZERO);
        assert_eq!(breakdown.tax, Money::from_major(60));
        assert_eq!(breakdown.total, Money::from_major(1_060));
    }

    #[test]
    fn test_discount_excludes_add_ons_and_tax() {
        let engine = engine();
        let add_ons = engine
            .resolve_add_ons(
                &AssetCategory::new("speedboat"),
                &[AddOnSelection::new("captain", 2), AddOnSelection::new("life_jacket", 4)],
            )
            .unwrap();
        let breakdown = engine.quote(&speedboat(), 1, &add_ons, MembershipLevel::Member);

        // 7% member discount on 500 only
        assert_eq!(breakdown.discount, Money::from_major(35));
        assert_eq!(breakdown.add_ons, Money::from_major(320));
        assert_eq!(breakdown.tax, Money::from_str_exact("27.90").unwrap());
        assert_eq!(breakdown.total, Money::from_str_exact("812.90").unwrap());
    }

    #[test]
    fn test_unknown_category_prices_at_zero() {
        let engine = engine();
        let mystery = Asset::new("X-1", "Hovercraft", AssetCategory::new("hovercraft"), Money::from_major(900), 4);

        let breakdown = engine.quote(&mystery, 2, &[], MembershipLevel::Vip);
        assert_eq!(breakdown.base, Money::ZERO);
        assert_eq!(breakdown.total, Money::ZERO);
        assert_eq!(breakdown.loyalty_points, 0);
    }

    #[test]
    fn test_billing_units_by_category() {
        let engine = engine();
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();

        assert_eq!(
            engine.billing_units(&AssetCategory::new("speedboat"), start, start + Duration::days(3)),
            3
        );
        assert_eq!(
            engine.billing_units(&AssetCategory::new("jet_ski"), start, start + Duration::minutes(150)),
            3
        );
        assert_eq!(engine.billing_units(&AssetCategory::new("yacht"), start, start), 1);
    }

    #[test]
    fn test_late_fee_and_extension() {
        let engine = engine();
        let asset = speedboat();
        let end = Utc.with_ymd_and_hms(2024, 7, 4, 9, 0, 0).unwrap();

        let late = engine.assess_late_fee(&asset, end, end + Duration::hours(30));
        assert_eq!(late.overdue_units, 2);
        assert_eq!(late.fee, Money::from_major(1_500));

        assert_eq!(engine.late_fee(Money::from_major(100), 0), Money::ZERO);
        assert_eq!(engine.extension_cost(&asset, 2), Money::from_major(1_000));
    }

    #[test]
    fn test_add_on_rejections() {
        let engine = engine();
        let kayak = AssetCategory::new("kayak");

        let unknown = engine.resolve_add_ons(&kayak, &[AddOnSelection::new("jacuzzi", 1)]);
        let ineligible = engine.resolve_add_ons(&kayak, &[AddOnSelection::new("captain", 1)]);
        let zero = engine.resolve_add_ons(&kayak, &[AddOnSelection::new("life_jacket", 0)]);

        for result in [unknown, ineligible, zero] {
            assert!(matches!(result, Err(RentalError::Validation { .. })));
        }
    }

    #[test]
    fn test_adjustments_stay_reconciled() {
        let breakdown = engine().quote(&speedboat(), 3, &[], MembershipLevel::Vip);

        let late = breakdown.with_late_fee(Money::from_major(750));
        assert_eq!(late.total, Money::from_major(2_181));

        let refunded = breakdown.with_refund(Money::from_major(1_431));
        assert_eq!(refunded.total, Money::ZERO);

        let extended = breakdown.with_extension(Money::from_major(500));
        assert_eq!(extended.base, Money::from_major(1_500));
        assert_eq!(extended.extensions, Money::from_major(500));
        assert_eq!(extended.total, Money::from_major(1_931));

        // discount and tax still match the booked base
        assert_eq!(extended.discount, Money::from_major(1_500).apply_rate(Rate::from_percentage(10)));
        assert_eq!(extended.tax, extended.subtotal.apply_rate(Rate::from_percentage(6)));

        let cancelled = extended
            .with_refund(Money::from_major(1_431))
            .with_write_off(Money::from_major(500));
        assert_eq!(cancelled.total, Money::ZERO);

        assert!(late.is_reconciled() && refunded.is_reconciled() && extended.is_reconciled());
        assert!(cancelled.is_reconciled());
    }

    proptest! {
        #[test]
        fn property_breakdown_reconciles(
            rate_cents in 0i64..500_000,
            units in 1u32..60,
            late_cents in 0i64..100_000,
            jackets in 0u32..10,
            level in prop_oneof![
                Just(MembershipLevel::NonMember),
                Just(MembershipLevel::Member),
                Just(MembershipLevel::Vip),
            ],
        ) {
            let engine = engine();
            let asset = Asset::new("P-1", "Pontoon", AssetCategory::new("pontoon"), Money::from_cents(rate_cents), 10);
            let add_ons: Vec<SelectedAddOn> = if jackets > 0 {
                engine.resolve_add_ons(&asset.category, &[AddOnSelection::new("life_jacket", jackets)]).unwrap()
            } else {
                Vec::new()
            };

            let breakdown = engine.breakdown(&PricingInput {
                asset: &asset,
                units,
                add_ons: &add_ons,
                membership: level,
                late_fee: Money::from_cents(late_cents),
                refund: Money::ZERO,
            });

            prop_assert!(breakdown.is_reconciled());
            prop_assert_eq!(
                breakdown.total,
                breakdown.base - breakdown.discount + breakdown.add_ons + breakdown.tax
                    + breakdown.extensions + breakdown.late_fee - breakdown.refund - breakdown.written_off
            );
            prop_assert!(breakdown.discount <= breakdown.base);
        }
    }
}
