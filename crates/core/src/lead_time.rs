//! Delivery lead-time validation.
//!
//! Producers need notice to pick, pack and deliver, so a requested
//! delivery date must be at least 48 hours after the moment the order
//! is placed. Instants are [`jiff::Timestamp`]s (unambiguous by
//! construction); requested delivery days are civil [`Date`]s
//! interpreted in one canonical zone held by the validator, so naive
//! and zone-aware values can never be compared by accident.

use jiff::{Span, Timestamp, civil::Date, tz::TimeZone};

/// Minimum interval between order placement and requested delivery.
pub const MIN_LEAD_HOURS: i64 = 48;

/// Validates requested delivery dates against the minimum lead time.
///
/// Pure: both operations take the reference instant as an argument and
/// have no side effects.
#[derive(Debug, Clone)]
pub struct LeadTime {
    tz: TimeZone,
}

impl LeadTime {
    /// Creates a validator anchored to the given canonical time zone.
    pub const fn new(tz: TimeZone) -> Self {
        Self { tz }
    }

    /// Creates a validator for Europe/London, the network's home zone.
    ///
    /// Falls back to UTC when the system has no tzdb; the lead-time
    /// window is identical, only the date boundary shifts.
    pub fn uk() -> Self {
        Self::new(TimeZone::get("Europe/London").unwrap_or(TimeZone::UTC))
    }

    /// The civil date of `reference` in the canonical zone.
    pub fn local_date(&self, reference: Timestamp) -> Date {
        reference.to_zoned(self.tz.clone()).date()
    }

    /// The earliest allowed delivery date: `reference` plus 48 hours,
    /// truncated to a date in the canonical zone.
    pub fn earliest_allowed(&self, reference: Timestamp) -> Date {
        reference
            .saturating_add(Span::new().hours(MIN_LEAD_HOURS))
            .expect("hours-only span is always valid timestamp arithmetic")
            .to_zoned(self.tz.clone())
            .date()
    }

    /// Whether `candidate` is on or after the earliest allowed date.
    /// Inclusive at exactly 48 hours.
    pub fn is_valid(&self, candidate: Date, reference: Timestamp) -> bool {
        candidate >= self.earliest_allowed(reference)
    }
}
