//! Commission calculation.
//!
//! Amounts are integer pence; rates are basis points (10000 = 100%).
//! Rounding is **half up**, applied identically at every call site so
//! per-producer figures always reconcile with settlement totals.

use jiff::civil::Date;
use thiserror::Error;

const BASIS_POINT_SCALE: u128 = 10_000;

/// Errors raised by rate construction and policy resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommissionError {
    /// A rate above 100% was supplied.
    #[error("rate of {0} basis points exceeds 10000")]
    RateOutOfRange(u32),

    /// No commission policy covers the given date.
    #[error("no commission policy is active on {0}")]
    NoActivePolicy(Date),

    /// More than one commission policy covers the given date. Overlaps
    /// are a configuration error and are never resolved by picking one.
    #[error("{count} commission policies are active on {on}")]
    OverlappingPolicies {
        /// The date being resolved.
        on: Date,
        /// How many policies covered it.
        count: usize,
    },
}

/// A commission rate in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    ///
    /// # Errors
    ///
    /// Returns [`CommissionError::RateOutOfRange`] for rates above 10000.
    pub const fn from_basis_points(bp: u32) -> Result<Self, CommissionError> {
        if bp > 10_000 {
            return Err(CommissionError::RateOutOfRange(bp));
        }

        Ok(Self(bp))
    }

    /// The rate in basis points.
    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// Splits a gross amount into commission and producer payout.
    ///
    /// `commission + payout == gross` always holds, and the commission
    /// never exceeds the gross amount.
    pub fn split(self, gross_pence: u64) -> Split {
        let scaled = u128::from(gross_pence) * u128::from(self.0) + BASIS_POINT_SCALE / 2;

        // A rate of at most 10000bp keeps the commission at or below the
        // gross amount, so the narrowing conversion cannot fail.
        let commission_pence =
            u64::try_from(scaled / BASIS_POINT_SCALE).unwrap_or(gross_pence);

        Split {
            commission_pence,
            payout_pence: gross_pence - commission_pence,
        }
    }
}

/// The two halves of a commission split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    /// Network commission in pence.
    pub commission_pence: u64,
    /// Amount due to the producer in pence.
    pub payout_pence: u64,
}

/// A commission rate valid over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// The rate charged while this policy is active.
    pub rate: Rate,
    /// First day the policy applies, inclusive.
    pub valid_from: Date,
    /// Last day the policy applies, inclusive; `None` is open-ended.
    pub valid_to: Option<Date>,
}

impl Policy {
    /// Whether this policy covers the given date.
    pub fn covers(&self, on: Date) -> bool {
        on >= self.valid_from && self.valid_to.is_none_or(|to| on <= to)
    }
}

/// Resolves the single policy active on `on`.
///
/// # Errors
///
/// Returns [`CommissionError::NoActivePolicy`] when no policy covers
/// the date and [`CommissionError::OverlappingPolicies`] when several
/// do.
pub fn active_policy(policies: &[Policy], on: Date) -> Result<&Policy, CommissionError> {
    let mut active = policies.iter().filter(|policy| policy.covers(on));

    match (active.next(), active.next()) {
        (Some(policy), None) => Ok(policy),
        (None, _) => Err(CommissionError::NoActivePolicy(on)),
        (Some(_), Some(_)) => Err(CommissionError::OverlappingPolicies {
            on,
            count: policies.iter().filter(|policy| policy.covers(on)).count(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn five_percent() -> Rate {
        Rate::from_basis_points(500).unwrap()
    }

    #[test]
    fn rate_above_ten_thousand_is_rejected() {
        assert_eq!(
            Rate::from_basis_points(10_001),
            Err(CommissionError::RateOutOfRange(10_001))
        );
    }

    #[test]
    fn full_rate_takes_everything() {
        let split = Rate::from_basis_points(10_000).unwrap().split(1234);

        assert_eq!(split.commission_pence, 1234);
        assert_eq!(split.payout_pence, 0);
    }

    #[test]
    fn five_percent_of_1300_is_65() {
        let split = five_percent().split(1300);

        assert_eq!(split.commission_pence, 65);
        assert_eq!(split.payout_pence, 1235);
    }

    #[test]
    fn five_percent_of_1000_is_50() {
        let split = five_percent().split(1000);

        assert_eq!(split.commission_pence, 50);
        assert_eq!(split.payout_pence, 950);
    }

    #[test]
    fn exact_half_rounds_up() {
        // 1p at 50% is 0.5p, which rounds up to 1p.
        let split = Rate::from_basis_points(5_000).unwrap().split(1);

        assert_eq!(split.commission_pence, 1);
        assert_eq!(split.payout_pence, 0);
    }

    #[test]
    fn below_half_rounds_down() {
        // 10p at 2.5% is 0.25p.
        let split = Rate::from_basis_points(250).unwrap().split(10);

        assert_eq!(split.commission_pence, 0);
        assert_eq!(split.payout_pence, 10);
    }

    #[test]
    fn split_always_sums_to_gross() {
        for bp in [0, 1, 250, 500, 3333, 9999, 10_000] {
            let rate = Rate::from_basis_points(bp).unwrap();

            for gross in [0, 1, 7, 99, 1300, 250_000, u64::from(u32::MAX)] {
                let split = rate.split(gross);

                assert_eq!(
                    split.commission_pence + split.payout_pence,
                    gross,
                    "split of {gross} at {bp}bp must balance"
                );
                assert!(
                    split.commission_pence <= gross,
                    "commission may never exceed gross"
                );
            }
        }
    }

    #[test]
    fn zero_rate_takes_nothing() {
        let split = Rate::from_basis_points(0).unwrap().split(5000);

        assert_eq!(split.commission_pence, 0);
        assert_eq!(split.payout_pence, 5000);
    }

    fn policy(from: Date, to: Option<Date>) -> Policy {
        Policy {
            rate: five_percent(),
            valid_from: from,
            valid_to: to,
        }
    }

    #[test]
    fn resolves_the_single_covering_policy() {
        let policies = [
            policy(date(2024, 1, 1), Some(date(2024, 12, 31))),
            policy(date(2025, 1, 1), None),
        ];

        let active = active_policy(&policies, date(2025, 6, 1)).unwrap();

        assert_eq!(active.valid_from, date(2025, 1, 1));
    }

    #[test]
    fn open_ended_policy_covers_far_future() {
        let policies = [policy(date(2025, 1, 1), None)];

        assert!(active_policy(&policies, date(2099, 1, 1)).is_ok());
    }

    #[test]
    fn uncovered_date_has_no_active_policy() {
        let policies = [policy(date(2025, 1, 1), Some(date(2025, 6, 30)))];

        assert_eq!(
            active_policy(&policies, date(2025, 7, 1)).copied(),
            Err(CommissionError::NoActivePolicy(date(2025, 7, 1)))
        );
    }

    #[test]
    fn overlapping_policies_are_a_configuration_error() {
        let policies = [
            policy(date(2025, 1, 1), None),
            policy(date(2025, 6, 1), Some(date(2025, 6, 30))),
        ];

        assert_eq!(
            active_policy(&policies, date(2025, 6, 15)).copied(),
            Err(CommissionError::OverlappingPolicies {
                on: date(2025, 6, 15),
                count: 2,
            })
        );
    }

    #[test]
    fn validity_bounds_are_inclusive() {
        let policies = [policy(date(2025, 1, 1), Some(date(2025, 1, 31)))];

        assert!(active_policy(&policies, date(2025, 1, 1)).is_ok());
        assert!(active_policy(&policies, date(2025, 1, 31)).is_ok());
        assert!(active_policy(&policies, date(2024, 12, 31)).is_err());
        assert!(active_policy(&policies, date(2025, 2, 1)).is_err());
    }
}
