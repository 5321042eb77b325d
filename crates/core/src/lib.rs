//! Harvest
//!
//! Core domain rules for a regional food marketplace: commission
//! splitting, delivery lead-time validation and the producer-order
//! status flow. Everything here is pure, with no I/O and no clocks
//! other than the reference instants callers pass in.

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::indexing_slicing,
        clippy::panic
    )
)]

pub mod commission;
pub mod lead_time;
pub mod status;
