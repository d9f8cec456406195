use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{MaintenanceId, MaintenanceStatus, Points, RentalId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RentalError {
    #[error("invalid request: {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    #[error("asset {asset_id} unavailable: {reason}")]
    AssetUnavailable {
        asset_id: String,
        reason: String,
    },

    #[error("asset not found: {asset_id}")]
    AssetNotFound {
        asset_id: String,
    },

    #[error("payment of {amount} failed: {reason}")]
    PaymentFailed {
        amount: Money,
        reason: String,
    },

    #[error("rental not found: {id}")]
    RentalNotFound {
        id: RentalId,
    },

    #[error("invalid state: current {current}, expected {expected}")]
    InvalidState {
        current: String,
        expected: String,
    },

    #[error("cancellation window closed: start {scheduled_start}, cutoff {cutoff}, now {now}")]
    CancellationWindow {
        scheduled_start: DateTime<Utc>,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("insufficient points: available {available}, requested {requested}")]
    InsufficientPoints {
        available: Points,
        requested: Points,
    },

    #[error("loyalty account not found for customer {customer_id}")]
    AccountNotFound {
        customer_id: String,
    },

    #[error("maintenance record {id} is {current}, cannot {attempted}")]
    InvalidMaintenanceState {
        id: MaintenanceId,
        current: MaintenanceStatus,
        attempted: String,
    },

    #[error("maintenance record not found: {id}")]
    MaintenanceRecordNotFound {
        id: MaintenanceId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl RentalError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        RentalError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RentalError>;
