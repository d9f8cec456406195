//! The two loyalty ladders.
//!
//! The display ladder (lifetime points) and the VIP thresholds (current points or
//! rental count) disagree at their boundaries: an account can qualify for VIP at
//! 1,000 current points while still showing Silver. Both are kept as separate
//! rules until product decides which one is authoritative.

use crate::config::LoyaltyConfig;
use crate::types::{DisplayTier, Points};

/// customer-facing tier from lifetime points, lifted to the VIP floor for VIP accounts
pub fn display_tier(config: &LoyaltyConfig, lifetime_points: Points, vip: bool) -> DisplayTier {
    let earned = config
        .display_tiers
        .iter()
        .rev()
        .find(|t| lifetime_points >= t.min_lifetime_points)
        .map(|t| t.tier)
        .unwrap_or(DisplayTier::Bronze);

    if vip {
        earned.max(config.vip_floor_tier)
    } else {
        earned
    }
}

/// backend VIP rule: enough current points or enough rentals
pub fn vip_eligible(config: &LoyaltyConfig, current_points: Points, rental_count: u32) -> bool {
    current_points >= config.vip_point_threshold || rental_count >= config.vip_rental_threshold
}

/// points to the next display tier, if any
pub fn points_to_next_tier(config: &LoyaltyConfig, lifetime_points: Points) -> Option<Points> {
    config
        .display_tiers
        .iter()
        .find(|t| t.min_lifetime_points > lifetime_points)
        .map(|t| t.min_lifetime_points - lifetime_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ladder() {
        let config = LoyaltyConfig::standard();
        assert_eq!(display_tier(&config, 0, false), DisplayTier::Bronze);
        assert_eq!(display_tier(&config, 499, false), DisplayTier::Bronze);
        assert_eq!(display_tier(&config, 500, false), DisplayTier::Silver);
        assert_eq!(display_tier(&config, 1_500, false), DisplayTier::Gold);
        assert_eq!(display_tier(&config, 12_000, false), DisplayTier::Platinum);
    }

    #[test]
    fn test_vip_floor_never_lowers_tier() {
        let config = LoyaltyConfig::standard();
        assert_eq!(display_tier(&config, 100, true), DisplayTier::Gold);
        assert_eq!(display_tier(&config, 6_000, true), DisplayTier::Platinum);
    }

    #[test]
    fn test_vip_thresholds_disagree_with_display_ladder() {
        let config = LoyaltyConfig::standard();
        // qualifies for VIP on points while the display ladder still says Silver
        assert!(vip_eligible(&config, 1_000, 0));
        assert_eq!(display_tier(&config, 1_000, false), DisplayTier::Silver);

        assert!(vip_eligible(&config, 0, 10));
        assert!(!vip_eligible(&config, 999, 9));
    }

    #[test]
    fn test_points_to_next_tier() {
        let config = LoyaltyConfig::standard();
        assert_eq!(points_to_next_tier(&config, 450), Some(50));
        assert_eq!(points_to_next_tier(&config, 5_000), None);
    }
}
