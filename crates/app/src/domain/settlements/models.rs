//! Settlement Models

use std::str::FromStr;

use jiff::{Span, Timestamp, civil::Date};
use thiserror::Error;

use crate::{domain::identity::models::ProducerUuid, uuids::TypedUuid};

/// An inclusive range of delivery dates to settle over. Weekly in
/// practice, but any range is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPeriod {
    pub start: Date,
    pub end: Date,
}

impl SettlementPeriod {
    #[must_use]
    pub const fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// The seven-day period beginning on `start`.
    #[must_use]
    pub fn week_starting(start: Date) -> Self {
        Self {
            start,
            end: start.saturating_add(Span::new().days(6)),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.end >= self.start
    }
}

/// Payout state of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    Pending,
    Paid,
}

/// Raised when a stored settlement status string is unrecognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown settlement status {0:?}")]
pub struct UnknownSettlementStatus(pub String);

impl SettlementStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for SettlementStatus {
    type Err = UnknownSettlementStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(UnknownSettlementStatus(other.to_string())),
        }
    }
}

/// Settlement UUID
pub type SettlementUuid = TypedUuid<ProducerSettlement>;

/// One producer's totals for one period. Unique per
/// (producer, period start); re-settling recomputes the totals in
/// place rather than appending a second row.
#[derive(Debug, Clone)]
pub struct ProducerSettlement {
    pub uuid: SettlementUuid,
    pub producer: ProducerUuid,
    pub period_start: Date,
    pub period_end: Date,
    pub order_count: u64,
    pub subtotal_pence: u64,
    pub commission_pence: u64,
    pub payout_pence: u64,
    pub status: SettlementStatus,
    /// Bank or provider reference recorded when the payout is made.
    pub payment_reference: String,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
