//! Shared query and pagination primitives for the record console.
//!
//! The console keeps its interaction state (page, page size, column filters,
//! free-text filter, sort order) as a [`QueryDescriptor`]. Every descriptor
//! canonicalises to a [`Signature`], which is both the cache key used by the
//! query cache and the exact query string sent to the remote read endpoint.
//! Responses come back as a [`Page`] envelope.
//!
//! # Example
//!
//! ```
//! use pagination::{QueryDescriptor, SortOrder};
//!
//! let descriptor = QueryDescriptor::new(1, 10)
//!     .expect("page size is non-zero")
//!     .with_sort(SortOrder::desc("fullName"))
//!     .with_sort(SortOrder::asc("email"));
//!
//! assert_eq!(
//!     descriptor.signature("users").query(),
//!     "page=1&size=10&sort=fullName,desc&sort=email,asc",
//! );
//! ```

mod descriptor;
mod error;
mod page;
mod signature;
mod sort;

pub use descriptor::{GLOBAL_FILTER_PARAM, PAGE_PARAM, QueryDescriptor, SIZE_PARAM, SORT_PARAM};
pub use error::PaginationError;
pub use page::{Page, PageMetadata};
pub use signature::{Signature, build_signature};
pub use sort::{SortDirection, SortOrder};
