//! Shared application domain and persistence modules.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;

mod rows;

#[cfg(test)]
mod test;

mod uuids;
