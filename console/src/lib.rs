//! Record console library: query-state synchronisation and mutation
//! coordination for a paginated remote collection.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;
