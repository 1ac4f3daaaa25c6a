//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest client for the remote collection service
//! - **memory**: in-process collection with the same read contract
//!
//! Adapters are thin translators between domain types and wire or storage
//! representations. They contain no business logic.

pub mod http;
pub mod memory;
