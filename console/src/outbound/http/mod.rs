//! HTTP outbound adapter for the record collection service.
//!
//! Provides a thin reqwest implementation of the `RecordCollection` port.

mod collection;
mod dto;

pub use collection::HttpRecordCollection;
