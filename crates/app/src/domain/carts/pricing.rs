//! Cart Pricing
//!
//! Read-only aggregation over fetched cart lines; nothing here touches
//! the database or mutates the cart.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{
    carts::models::CartLineDetail, identity::models::ProducerUuid, products::models::ProductUuid,
};

/// Errors raised while pricing a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartPricingError {
    /// A product in the cart has no producer to pay out to. Such
    /// products are rejected outright rather than grouped under a
    /// sentinel producer.
    #[error("product {0} has no assigned producer")]
    UnassignedProducer(ProductUuid),
}

/// Sum of unit price times quantity over all lines, in pence.
pub fn total_pence(lines: &[CartLineDetail]) -> u64 {
    lines.iter().map(CartLineDetail::line_total_pence).sum()
}

/// Partition lines by the owning producer of each line's product.
///
/// A `BTreeMap` keeps producer iteration deterministic, which in turn
/// keeps sub-order creation order stable. Lines within each producer
/// are ordered by product id; checkout takes its stock row locks in
/// that order, so two concurrent checkouts over the same products
/// cannot deadlock.
///
/// # Errors
///
/// Returns [`CartPricingError::UnassignedProducer`] for any line whose
/// product has no producer.
pub fn group_by_producer(
    lines: &[CartLineDetail],
) -> Result<BTreeMap<ProducerUuid, Vec<&CartLineDetail>>, CartPricingError> {
    let mut grouped: BTreeMap<ProducerUuid, Vec<&CartLineDetail>> = BTreeMap::new();

    for line in lines {
        let producer = line
            .producer
            .ok_or(CartPricingError::UnassignedProducer(line.product))?;

        grouped.entry(producer).or_default().push(line);
    }

    for producer_lines in grouped.values_mut() {
        producer_lines.sort_by_key(|line| line.product);
    }

    Ok(grouped)
}
