use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::AssetCategory;

/// how an add-on is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOnPricing {
    /// one price regardless of count
    Flat(Money),
    /// price per item
    PerUnit(Money),
}

/// add-on offered in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnTemplate {
    pub name: String,
    pub pricing: AddOnPricing,
    /// categories that may attach this add-on; empty means all
    #[serde(default)]
    pub eligible_categories: Vec<AssetCategory>,
}

impl AddOnTemplate {
    pub fn flat(name: &str, price: Money, categories: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            pricing: AddOnPricing::Flat(price),
            eligible_categories: categories.iter().map(|c| AssetCategory::new(*c)).collect(),
        }
    }

    pub fn per_unit(name: &str, price: Money, categories: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            pricing: AddOnPricing::PerUnit(price),
            eligible_categories: categories.iter().map(|c| AssetCategory::new(*c)).collect(),
        }
    }

    pub fn is_eligible(&self, category: &AssetCategory) -> bool {
        self.eligible_categories.is_empty() || self.eligible_categories.contains(category)
    }

    /// copy the template onto a rental
    pub fn select(&self, count: u32) -> SelectedAddOn {
        match self.pricing {
            AddOnPricing::Flat(price) => SelectedAddOn {
                name: self.name.clone(),
                unit_price: price,
                count: 1,
            },
            AddOnPricing::PerUnit(price) => SelectedAddOn {
                name: self.name.clone(),
                unit_price: price,
                count,
            },
        }
    }
}

/// add-on requested by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOnSelection {
    pub name: String,
    pub count: u32,
}

impl AddOnSelection {
    pub fn new(name: &str, count: u32) -> Self {
        Self {
            name: name.to_string(),
            count,
        }
    }
}

/// add-on attached to a rental
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAddOn {
    pub name: String,
    pub unit_price: Money,
    pub count: u32,
}

impl SelectedAddOn {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_add_on_ignores_count() {
        let gear = AddOnTemplate::flat("fishing_gear", Money::from_major(40), &["pontoon"]);
        let selected = gear.select(3);

        assert_eq!(selected.count, 1);
        assert_eq!(selected.line_total(), Money::from_major(40));
    }

    #[test]
    fn test_per_unit_add_on() {
        let jackets = AddOnTemplate::per_unit("life_jacket", Money::from_major(5), &[]);
        assert_eq!(jackets.select(4).line_total(), Money::from_major(20));
        assert!(jackets.is_eligible(&AssetCategory::new("anything")));
    }

    #[test]
    fn test_eligibility_tags() {
        let captain = AddOnTemplate::per_unit("captain", Money::from_major(150), &["yacht"]);
        assert!(captain.is_eligible(&AssetCategory::new("yacht")));
        assert!(!captain.is_eligible(&AssetCategory::new("kayak")));
    }
}
