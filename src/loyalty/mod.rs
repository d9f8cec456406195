pub mod account;
pub mod tier;

use std::collections::HashMap;
use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use parking_lot::{Mutex, RwLock};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::LoyaltyConfig;
use crate::errors::{RentalError, Result};
use crate::types::{DisplayTier, Points, TransactionType};

pub use account::{LoyaltyAccount, LoyaltySettlement, LoyaltySnapshot, LoyaltyTransaction};

/// point balances and their audit log
///
/// Each account sits behind its own lock so concurrent rentals by one customer
/// cannot lose an update. Balances are running totals; the log is never replayed.
#[derive(Debug)]
pub struct LoyaltyLedger {
    config: LoyaltyConfig,
    accounts: RwLock<HashMap<String, Arc<Mutex<LoyaltyAccount>>>>,
    transactions: Mutex<Vec<LoyaltyTransaction>>,
}

impl LoyaltyLedger {
    pub fn new(config: LoyaltyConfig) -> Self {
        Self {
            config,
            accounts: RwLock::new(HashMap::new()),
            transactions: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &LoyaltyConfig {
        &self.config
    }

    fn entry(&self, customer_id: &str) -> Result<Arc<Mutex<LoyaltyAccount>>> {
        self.accounts
            .read()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| RentalError::AccountNotFound {
                customer_id: customer_id.to_string(),
            })
    }

    fn log(&self, transaction: LoyaltyTransaction) {
        self.transactions.lock().push(transaction);
    }

    fn require_points(points: Points) -> Result<()> {
        if points == 0 {
            return Err(RentalError::validation("points", "must be greater than zero"));
        }
        Ok(())
    }

    /// open an account; returns the existing one if already open
    pub fn open_account(&self, customer_id: &str, time: &SafeTimeProvider) -> LoyaltyAccount {
        let mut accounts = self.accounts.write();
        let entry = accounts.entry(customer_id.to_string()).or_insert_with(|| {
            info!("opened loyalty account for {}", customer_id);
            Arc::new(Mutex::new(LoyaltyAccount::new(customer_id.to_string(), time.now())))
        });
        let account = entry.lock().clone();
        account
    }

    pub fn has_account(&self, customer_id: &str) -> bool {
        self.accounts.read().contains_key(customer_id)
    }

    pub fn account(&self, customer_id: &str) -> Option<LoyaltyAccount> {
        self.entry(customer_id).ok().map(|a| a.lock().clone())
    }

    pub fn balance(&self, customer_id: &str) -> Result<Points> {
        Ok(self.entry(customer_id)?.lock().current_points)
    }

    /// add points; returns the new balance
    pub fn credit(
        &self,
        customer_id: &str,
        points: Points,
        transaction_type: TransactionType,
        description: &str,
        time: &SafeTimeProvider,
    ) -> Result<Points> {
        Self::require_points(points)?;
        let entry = self.entry(customer_id)?;
        let mut account = entry.lock();

        account.add(points);
        self.log(LoyaltyTransaction::new(
            customer_id,
            points as i64,
            transaction_type,
            description,
            time.now(),
        ));
        debug!("credited {} points to {}, balance {}", points, customer_id, account.current_points);

        Ok(account.current_points)
    }

    /// remove points; the balance is untouched when it does not cover the request
    pub fn debit(
        &self,
        customer_id: &str,
        points: Points,
        transaction_type: TransactionType,
        description: &str,
        time: &SafeTimeProvider,
    ) -> Result<Points> {
        Self::require_points(points)?;
        let entry = self.entry(customer_id)?;
        let mut account = entry.lock();

        if !account.try_remove(points) {
            return Err(RentalError::InsufficientPoints {
                available: account.current_points,
                requested: points,
            });
        }
        self.log(LoyaltyTransaction::new(
            customer_id,
            -(points as i64),
            transaction_type,
            description,
            time.now(),
        ));
        debug!("debited {} points from {}, balance {}", points, customer_id, account.current_points);

        Ok(account.current_points)
    }

    pub fn redeem(
        &self,
        customer_id: &str,
        points: Points,
        description: &str,
        time: &SafeTimeProvider,
    ) -> Result<Points> {
        self.debit(customer_id, points, TransactionType::Redeem, description, time)
    }

    pub fn award_bonus(
        &self,
        customer_id: &str,
        points: Points,
        description: &str,
        time: &SafeTimeProvider,
    ) -> Result<Points> {
        self.credit(customer_id, points, TransactionType::Bonus, description, time)
    }

    /// move points between accounts; nothing moves unless the source covers it
    pub fn transfer(
        &self,
        from_id: &str,
        to_id: &str,
        points: Points,
        time: &SafeTimeProvider,
    ) -> Result<(Points, Points)> {
        Self::require_points(points)?;
        if from_id == to_id {
            return Err(RentalError::validation("to", "cannot transfer to the same account"));
        }
        let from = self.entry(from_id)?;
        let to = self.entry(to_id)?;

        // lock in id order so opposite transfers cannot deadlock
        let (mut source, mut destination) = if from_id < to_id {
            let source = from.lock();
            let destination = to.lock();
            (source, destination)
        } else {
            let destination = to.lock();
            let source = from.lock();
            (source, destination)
        };

        if !source.try_remove(points) {
            return Err(RentalError::InsufficientPoints {
                available: source.current_points,
                requested: points,
            });
        }
        destination.add(points);

        let now = time.now();
        let mut log = self.transactions.lock();
        log.push(LoyaltyTransaction::new(
            from_id,
            -(points as i64),
            TransactionType::Transfer,
            &format!("transfer to {}", to_id),
            now,
        ));
        log.push(LoyaltyTransaction::new(
            to_id,
            points as i64,
            TransactionType::Transfer,
            &format!("transfer from {}", from_id),
            now,
        ));
        info!("transferred {} points from {} to {}", points, from_id, to_id);

        Ok((source.current_points, destination.current_points))
    }

    /// count a completed rental towards the VIP rental threshold
    pub fn record_rental(&self, customer_id: &str) -> Result<u32> {
        let entry = self.entry(customer_id)?;
        let mut account = entry.lock();
        account.rental_count += 1;
        Ok(account.rental_count)
    }

    pub fn evaluate_vip_eligibility(&self, account: &LoyaltyAccount) -> bool {
        tier::vip_eligible(&self.config, account.current_points, account.rental_count)
    }

    /// returns true when the account was upgraded by this call
    pub fn upgrade_to_vip(&self, customer_id: &str, time: &SafeTimeProvider) -> Result<bool> {
        let entry = self.entry(customer_id)?;
        let mut account = entry.lock();
        if account.vip {
            return Ok(false);
        }
        account.vip = true;
        account.vip_since = Some(time.now());
        info!("upgraded {} to VIP", customer_id);
        Ok(true)
    }

    /// derived on every call, never stored
    pub fn tier_of(&self, account: &LoyaltyAccount) -> DisplayTier {
        tier::display_tier(&self.config, account.lifetime_points, account.vip)
    }

    /// credit a completed rental: earned points, VIP bonus, rental count, upgrade
    pub fn settle_rental(
        &self,
        customer_id: &str,
        earned: Points,
        description: &str,
        time: &SafeTimeProvider,
    ) -> Result<LoyaltySettlement> {
        let was_vip = self.entry(customer_id)?.lock().vip;

        let mut balance = self.balance(customer_id)?;
        if earned > 0 {
            balance = self.credit(customer_id, earned, TransactionType::Earn, description, time)?;
        }

        let bonus = if was_vip { self.vip_bonus(earned) } else { 0 };
        if bonus > 0 {
            balance = self.award_bonus(customer_id, bonus, &format!("VIP bonus: {}", description), time)?;
        }

        self.record_rental(customer_id)?;

        let upgraded_to_vip = match self.account(customer_id) {
            Some(account) if !account.vip && self.evaluate_vip_eligibility(&account) => {
                self.upgrade_to_vip(customer_id, time)?
            }
            _ => false,
        };

        Ok(LoyaltySettlement {
            earned,
            bonus,
            balance,
            upgraded_to_vip,
        })
    }

    fn vip_bonus(&self, earned: Points) -> Points {
        (Decimal::from(earned) * self.config.vip_bonus_rate.as_decimal())
            .floor()
            .to_u64()
            .unwrap_or(0)
    }

    pub fn snapshot(&self, customer_id: &str) -> Result<LoyaltySnapshot> {
        let account = self.entry(customer_id)?.lock().clone();
        Ok(LoyaltySnapshot {
            display_tier: self.tier_of(&account),
            vip_eligible: self.evaluate_vip_eligibility(&account),
            points_to_next_tier: tier::points_to_next_tier(&self.config, account.lifetime_points),
            customer_id: account.customer_id,
            current_points: account.current_points,
            lifetime_points: account.lifetime_points,
            vip: account.vip,
            rental_count: account.rental_count,
        })
    }

    pub fn transactions_for(&self, customer_id: &str) -> Vec<LoyaltyTransaction> {
        self.transactions
            .lock()
            .iter()
            .filter(|t| t.customer_id == customer_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use proptest::prelude::*;

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        ))
    }

    fn ledger_with(customer: &str, points: Points, time: &SafeTimeProvider) -> LoyaltyLedger {
        let ledger = LoyaltyLedger::new(LoyaltyConfig::standard());
        ledger.open_account(customer, time);
        if points > 0 {
            ledger.credit(customer, points, TransactionType::Earn, "seed", time).unwrap();
        }
        ledger
    }

    #[test]
    fn test_credit_requires_account() {
        let time = test_time();
        let ledger = LoyaltyLedger::new(LoyaltyConfig::standard());

        let err = ledger
            .credit("ghost", 10, TransactionType::Earn, "rental", &time)
            .unwrap_err();
        assert_eq!(err, RentalError::AccountNotFound { customer_id: "ghost".to_string() });
    }

    #[test]
    fn test_open_account_is_idempotent() {
        let time = test_time();
        let ledger = ledger_with("c1", 200, &time);

        let again = ledger.open_account("c1", &time);
        assert_eq!(again.current_points, 200);
    }

    #[test]
    fn test_debit_beyond_balance_is_rejected() {
        let time = test_time();
        let ledger = ledger_with("c1", 480, &time);

        let err = ledger
            .debit("c1", 500, TransactionType::Redeem, "free day", &time)
            .unwrap_err();

        assert_eq!(err, RentalError::InsufficientPoints { available: 480, requested: 500 });
        assert_eq!(ledger.balance("c1").unwrap(), 480);
        assert_eq!(ledger.transactions_for("c1").len(), 1);
    }

    #[test]
    fn test_debit_keeps_lifetime_points() {
        let time = test_time();
        let ledger = ledger_with("c1", 600, &time);

        assert_eq!(ledger.redeem("c1", 250, "upgrade", &time).unwrap(), 350);

        let account = ledger.account("c1").unwrap();
        assert_eq!(account.lifetime_points, 600);
        assert_eq!(ledger.tier_of(&account), DisplayTier::Silver);

        let log = ledger.transactions_for("c1");
        assert_eq!(log.last().unwrap().delta, -250);
        assert_eq!(log.last().unwrap().transaction_type, TransactionType::Redeem);
    }

    #[test]
    fn test_transfer_moves_points_atomically() {
        let time = test_time();
        let ledger = ledger_with("alice", 300, &time);
        ledger.open_account("bob", &time);

        assert_eq!(ledger.transfer("alice", "bob", 120, &time).unwrap(), (180, 120));

        let err = ledger.transfer("bob", "alice", 500, &time).unwrap_err();
        assert!(matches!(err, RentalError::InsufficientPoints { .. }));
        assert_eq!(ledger.balance("alice").unwrap(), 180);
        assert_eq!(ledger.balance("bob").unwrap(), 120);

        let bob_log = ledger.transactions_for("bob");
        assert_eq!(bob_log.len(), 1);
        assert_eq!(bob_log[0].transaction_type, TransactionType::Transfer);
    }

    #[test]
    fn test_transfer_needs_both_accounts() {
        let time = test_time();
        let ledger = ledger_with("alice", 300, &time);

        assert!(matches!(
            ledger.transfer("alice", "nobody", 10, &time),
            Err(RentalError::AccountNotFound { .. })
        ));
        assert!(matches!(
            ledger.transfer("alice", "alice", 10, &time),
            Err(RentalError::Validation { .. })
        ));
        assert_eq!(ledger.balance("alice").unwrap(), 300);
    }

    #[test]
    fn test_vip_eligibility_and_idempotent_upgrade() {
        let time = test_time();
        let ledger = ledger_with("c1", 1_000, &time);
        let account = ledger.account("c1").unwrap();
        assert!(ledger.evaluate_vip_eligibility(&account));

        assert!(ledger.upgrade_to_vip("c1", &time).unwrap());
        assert!(!ledger.upgrade_to_vip("c1", &time).unwrap());

        let account = ledger.account("c1").unwrap();
        assert!(account.vip);
        assert_eq!(account.current_points, 1_000);
        assert_eq!(ledger.tier_of(&account), DisplayTier::Gold);
    }

    #[test]
    fn test_settlement_upgrades_on_rental_count() {
        let time = test_time();
        let ledger = ledger_with("c1", 0, &time);

        for i in 0..9 {
            let settled = ledger.settle_rental("c1", 20, &format!("rental {}", i), &time).unwrap();
            assert!(!settled.upgraded_to_vip);
        }
        let tenth = ledger.settle_rental("c1", 20, "rental 9", &time).unwrap();
        assert!(tenth.upgraded_to_vip);
        assert_eq!(tenth.balance, 200);

        // VIP accounts earn the bonus from the next rental on
        let eleventh = ledger.settle_rental("c1", 20, "rental 10", &time).unwrap();
        assert_eq!(eleventh.bonus, 10);
        assert_eq!(eleventh.balance, 230);
    }

    #[test]
    fn test_concurrent_credits_are_not_lost() {
        let time = test_time();
        let ledger = ledger_with("c1", 0, &time);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let time = test_time();
                    for _ in 0..50 {
                        ledger.credit("c1", 1, TransactionType::Earn, "tick", &time).unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.balance("c1").unwrap(), 400);
        assert_eq!(ledger.transactions_for("c1").len(), 400);
    }

    #[test]
    fn test_snapshot() {
        let time = test_time();
        let ledger = ledger_with("c1", 450, &time);

        let snapshot = ledger.snapshot("c1").unwrap();
        assert_eq!(snapshot.display_tier, DisplayTier::Bronze);
        assert_eq!(snapshot.points_to_next_tier, Some(50));
        assert!(!snapshot.vip_eligible);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Credit(Points),
        Debit(Points),
        Upgrade,
    }

    fn op_strategy() -> impl Strategy<Value = Vec<Op>> {
        proptest::collection::vec(
            prop_oneof![
                (1u64..400).prop_map(Op::Credit),
                (1u64..600).prop_map(Op::Debit),
                Just(Op::Upgrade),
            ],
            0..40,
        )
    }

    proptest! {
        #[test]
        fn property_balance_never_negative_and_tier_monotonic(ops in op_strategy()) {
            let time = test_time();
            let ledger = ledger_with("c1", 0, &time);
            let mut expected: Points = 0;
            let mut last_lifetime = 0;
            let mut last_tier = DisplayTier::Bronze;
            let mut was_vip = false;

            for op in ops {
                match op {
                    Op::Credit(p) => {
                        ledger.credit("c1", p, TransactionType::Earn, "prop", &time).unwrap();
                        expected += p;
                    }
                    Op::Debit(p) => {
                        match ledger.debit("c1", p, TransactionType::Deduction, "prop", &time) {
                            Ok(_) => expected -= p,
                            Err(RentalError::InsufficientPoints { available, .. }) => {
                                prop_assert!(p > available);
                            }
                            Err(other) => prop_assert!(false, "unexpected {:?}", other),
                        }
                    }
                    Op::Upgrade => {
                        let before = ledger.balance("c1").unwrap();
                        ledger.upgrade_to_vip("c1", &time).unwrap();
                        prop_assert_eq!(ledger.balance("c1").unwrap(), before);
                    }
                }

                let account = ledger.account("c1").unwrap();
                prop_assert_eq!(account.current_points, expected);
                prop_assert!(account.lifetime_points >= last_lifetime);
                prop_assert!(!was_vip || account.vip);
                let tier = ledger.tier_of(&account);
                prop_assert!(tier >= last_tier);

                last_lifetime = account.lifetime_points;
                last_tier = tier;
                was_vip = account.vip;
            }
        }
    }
}
