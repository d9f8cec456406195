use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::Money;
use crate::types::BillingUnit;

/// late fee terms
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LateFeePolicy {
    /// multiplier applied to the unit rate (e.g., 1.5x)
    pub multiplier: Decimal,
}

impl Default for LateFeePolicy {
    fn default() -> Self {
        Self { multiplier: dec!(1.5) }
    }
}

impl LateFeePolicy {
    pub fn new(multiplier: Decimal) -> Self {
        Self { multiplier }
    }

    /// whole billing units between the scheduled and actual end, rounded up
    pub fn overdue_units(
        &self,
        unit: BillingUnit,
        scheduled_end: DateTime<Utc>,
        actual_end: DateTime<Utc>,
    ) -> u32 {
        if actual_end <= scheduled_end {
            return 0;
        }
        unit.units_covering(actual_end - scheduled_end)
    }

    /// fee for a number of overdue units at the given unit rate
    pub fn calculate(&self, unit_rate: Money, overdue_units: u32) -> LateFeeCalculation {
        if overdue_units == 0 {
            return LateFeeCalculation {
                fee: Money::ZERO,
                unit_rate,
                overdue_units: 0,
                multiplier: self.multiplier,
            };
        }

        let fee = unit_rate * self.multiplier;
        LateFeeCalculation {
            fee: fee.times(overdue_units),
            unit_rate,
            overdue_units,
            multiplier: self.multiplier,
        }
    }
}

/// late fee calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct LateFeeCalculation {
    pub fee: Money,
    pub unit_rate: Money,
    pub overdue_units: u32,
    pub multiplier: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_basic_late_fee() {
        let policy = LateFeePolicy::default();
        let result = policy.calculate(Money::from_major(500), 2);

        assert_eq!(result.fee, Money::from_major(1_500));
        assert_eq!(result.overdue_units, 2);
    }

    #[test]
    fn test_on_time_is_free() {
        let policy = LateFeePolicy::default();
        assert_eq!(policy.calculate(Money::from_major(500), 0).fee, Money::ZERO);
    }

    #[test]
    fn test_overdue_units_round_up() {
        let policy = LateFeePolicy::default();
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(policy.overdue_units(BillingUnit::Day, end, end - Duration::hours(1)), 0);
        assert_eq!(policy.overdue_units(BillingUnit::Day, end, end), 0);
        assert_eq!(policy.overdue_units(BillingUnit::Day, end, end + Duration::hours(2)), 1);
        assert_eq!(policy.overdue_units(BillingUnit::Hour, end, end + Duration::minutes(130)), 3);
    }

    #[test]
    fn test_custom_multiplier() {
        let policy = LateFeePolicy::new(dec!(2.0));
        let result = policy.calculate(Money::from_str_exact("12.50").unwrap(), 3);
        assert_eq!(result.fee, Money::from_major(75));
    }
}
