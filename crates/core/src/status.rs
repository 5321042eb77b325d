//! Producer order status flow.
//!
//! A sub-order moves `pending → confirmed → ready → delivered`, with
//! cancellation possible from `pending` or `confirmed`. Nothing else is
//! legal, including self-transitions.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Lifecycle status of a producer sub-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, awaiting producer confirmation.
    Pending,
    /// Accepted by the producer.
    Confirmed,
    /// Ready for collection or delivery.
    Ready,
    /// Delivered; terminal.
    Delivered,
    /// Cancelled before becoming ready; terminal.
    Cancelled,
}

/// An attempted transition that the status flow forbids.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// The status the order was in.
    pub from: OrderStatus,
    /// The status that was requested.
    pub to: OrderStatus,
}

/// A status string from storage that matches no known status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    /// The statuses this one is allowed to move to.
    pub const fn allowed_next(self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Validates a transition to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `next` is not in the
    /// allowed-next set for the current status.
    pub fn transition_to(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.allowed_next().contains(&next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// The storage representation of this status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "ready" => Ok(Self::Ready),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{Cancelled, Confirmed, Delivered, Pending, Ready};
    use super::*;

    const ALL: [OrderStatus; 5] = [Pending, Confirmed, Ready, Delivered, Cancelled];

    #[test]
    fn pending_moves_to_confirmed_or_cancelled() {
        assert_eq!(Pending.transition_to(Confirmed), Ok(Confirmed));
        assert_eq!(Pending.transition_to(Cancelled), Ok(Cancelled));

        for to in [Pending, Ready, Delivered] {
            assert_eq!(
                Pending.transition_to(to),
                Err(InvalidTransition { from: Pending, to })
            );
        }
    }

    #[test]
    fn confirmed_moves_to_ready_or_cancelled() {
        assert_eq!(Confirmed.transition_to(Ready), Ok(Ready));
        assert_eq!(Confirmed.transition_to(Cancelled), Ok(Cancelled));
        assert!(Confirmed.transition_to(Delivered).is_err());
        assert!(Confirmed.transition_to(Pending).is_err());
    }

    #[test]
    fn ready_only_moves_to_delivered() {
        assert_eq!(Ready.transition_to(Delivered), Ok(Delivered));
        assert!(Ready.transition_to(Cancelled).is_err());
    }

    #[test]
    fn terminal_statuses_move_nowhere() {
        for from in [Delivered, Cancelled] {
            assert!(from.is_terminal());

            for to in ALL {
                assert!(
                    from.transition_to(to).is_err(),
                    "{from} -> {to} must be rejected"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL {
            assert!(
                status.transition_to(status).is_err(),
                "{status} -> {status} must be rejected"
            );
        }
    }

    #[test]
    fn round_trips_through_storage_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_string_is_an_error() {
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(UnknownStatus("shipped".to_string()))
        );
    }
}
