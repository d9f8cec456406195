use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::PaymentMethod;

/// result of a gateway call; there is no partial charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

impl PaymentOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentOutcome::Approved { .. })
    }
}

/// payment gateway collaborator
///
/// Calls block; an implementation that times out must report `Declined` so the
/// caller releases whatever it claimed for the payment.
pub trait PaymentGateway: Send + Sync {
    fn charge(&self, amount: Money, method: &PaymentMethod) -> PaymentOutcome;

    fn refund(&self, amount: Money, reference: &str) -> PaymentOutcome;
}

/// recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Charge { amount: Money, method: PaymentMethod },
    Refund { amount: Money, reference: String },
}

/// in-process gateway stub that approves unless told otherwise
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<PaymentOutcome>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl ScriptedGateway {
    pub fn approving() -> Self {
        Self::default()
    }

    /// queue the outcome of the next call; unscripted calls are approved
    pub fn push_outcome(&self, outcome: PaymentOutcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn decline_next(&self, reason: &str) {
        self.push_outcome(PaymentOutcome::Declined {
            reason: reason.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    fn next_outcome(&self) -> PaymentOutcome {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| PaymentOutcome::Approved {
                reference: format!("PAY-{}", &Uuid::new_v4().simple().to_string()[..8]),
            })
    }
}

impl PaymentGateway for ScriptedGateway {
    fn charge(&self, amount: Money, method: &PaymentMethod) -> PaymentOutcome {
        self.calls.lock().push(GatewayCall::Charge {
            amount,
            method: method.clone(),
        });
        self.next_outcome()
    }

    fn refund(&self, amount: Money, reference: &str) -> PaymentOutcome {
        self.calls.lock().push(GatewayCall::Refund {
            amount,
            reference: reference.to_string(),
        });
        self.next_outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_outcomes_in_order() {
        let gateway = ScriptedGateway::approving();
        gateway.decline_next("card expired");

        let first = gateway.charge(Money::from_major(10), &PaymentMethod::Wallet);
        let second = gateway.refund(Money::from_major(10), "PAY-1");

        assert_eq!(
            first,
            PaymentOutcome::Declined {
                reason: "card expired".to_string()
            }
        );
        assert!(second.is_approved());
        assert_eq!(gateway.calls().len(), 2);
    }
}
