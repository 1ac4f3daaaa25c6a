//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod record_collection;

#[cfg(test)]
pub use record_collection::MockRecordCollection;
pub use record_collection::{RecordCollection, RecordCollectionError};
