//! Payment Models

use std::str::FromStr;

use jiff::{Timestamp, civil::Date};
use thiserror::Error;

use harvest::commission::{Policy, Rate};

use crate::{domain::orders::models::OrderUuid, uuids::TypedUuid};

/// Transaction UUID
pub type TransactionUuid = TypedUuid<PaymentTransaction>;

/// Lifecycle of a single payment attempt against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Authorised,
    Captured,
    Failed,
    Refunded,
}

/// Raised when a stored transaction status string is unrecognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown transaction status {0:?}")]
pub struct UnknownTransactionStatus(pub String);

impl TransactionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorised => "authorised",
            Self::Captured => "captured",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownTransactionStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "authorised" => Ok(Self::Authorised),
            "captured" => Ok(Self::Captured),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownTransactionStatus(other.to_string())),
        }
    }
}

/// A recorded payment attempt. Failed attempts are kept, never deleted.
#[derive(Debug, Clone)]
pub struct PaymentTransaction {
    pub uuid: TransactionUuid,
    pub order: OrderUuid,
    pub amount_pence: u64,
    pub status: TransactionStatus,
    pub gateway_name: String,
    /// Gateway-issued reference; empty until authorisation succeeds.
    pub gateway_reference: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Policy UUID
pub type PolicyUuid = TypedUuid<CommissionPolicyRecord>;

/// A stored commission policy row.
#[derive(Debug, Clone)]
pub struct CommissionPolicyRecord {
    pub uuid: PolicyUuid,
    pub rate: Rate,
    pub valid_from: Date,
    pub valid_to: Option<Date>,
    pub created_at: Timestamp,
}

impl CommissionPolicyRecord {
    /// The pure policy value used for date resolution and splitting.
    #[must_use]
    pub fn policy(&self) -> Policy {
        Policy {
            rate: self.rate,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_status_round_trips_through_storage_form() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Authorised,
            TransactionStatus::Captured,
            TransactionStatus::Failed,
            TransactionStatus::Refunded,
        ] {
            assert_eq!(status.as_str().parse(), Ok(status));
        }
    }

    #[test]
    fn unknown_transaction_status_is_rejected() {
        assert_eq!(
            "settled".parse::<TransactionStatus>(),
            Err(UnknownTransactionStatus("settled".to_string()))
        );
    }
}
