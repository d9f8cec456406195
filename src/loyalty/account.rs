use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{CustomerId, DisplayTier, Points, TransactionType};

/// per-customer loyalty balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyAccount {
    pub customer_id: CustomerId,
    pub current_points: Points,
    /// never decreases
    pub lifetime_points: Points,
    pub vip: bool,
    pub rental_count: u32,
    pub created_at: DateTime<Utc>,
    pub vip_since: Option<DateTime<Utc>>,
}

impl LoyaltyAccount {
    pub fn new(customer_id: CustomerId, created_at: DateTime<Utc>) -> Self {
        Self {
            customer_id,
            current_points: 0,
            lifetime_points: 0,
            vip: false,
            rental_count: 0,
            created_at,
            vip_since: None,
        }
    }

    pub(crate) fn add(&mut self, points: Points) {
        self.current_points += points;
        self.lifetime_points += points;
    }

    /// false leaves the balance untouched
    pub(crate) fn try_remove(&mut self, points: Points) -> bool {
        match self.current_points.checked_sub(points) {
            Some(rest) => {
                self.current_points = rest;
                true
            }
            None => false,
        }
    }
}

/// append-only ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: Uuid,
    pub customer_id: CustomerId,
    /// signed change to the current balance
    pub delta: i64,
    pub transaction_type: TransactionType,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl LoyaltyTransaction {
    pub fn new(
        customer_id: &str,
        delta: i64,
        transaction_type: TransactionType,
        description: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            delta,
            transaction_type,
            description: description.to_string(),
            timestamp,
        }
    }
}

/// dashboard view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltySnapshot {
    pub customer_id: CustomerId,
    pub current_points: Points,
    pub lifetime_points: Points,
    pub display_tier: DisplayTier,
    pub vip: bool,
    pub vip_eligible: bool,
    pub rental_count: u32,
    pub points_to_next_tier: Option<Points>,
}

/// outcome of crediting a finished rental
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltySettlement {
    pub earned: Points,
    pub bonus: Points,
    pub balance: Points,
    pub upgraded_to_vip: bool,
}
