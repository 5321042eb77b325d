//! Payment Repositories

mod policies;
mod transactions;

pub(crate) use policies::PgCommissionPoliciesRepository;
pub(crate) use transactions::PgTransactionsRepository;
