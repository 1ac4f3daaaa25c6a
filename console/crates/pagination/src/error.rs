//! Error types for query descriptor construction.

use thiserror::Error;

/// Errors raised while building or parsing query primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Page size must be at least one.
    #[error("page size must be greater than zero")]
    ZeroPageSize,

    /// Filter field names must be non-empty once trimmed.
    #[error("filter field must not be empty")]
    EmptyFilterField,

    /// Filter field collides with a paging, sorting, or global filter parameter.
    #[error("filter field '{field}' is reserved")]
    ReservedFilterField {
        /// The rejected field name.
        field: String,
    },

    /// Sort field names must be non-empty once trimmed.
    #[error("sort field must not be empty")]
    EmptySortField,

    /// Sort direction was neither `asc` nor `desc`.
    #[error("invalid sort direction '{value}': expected asc or desc")]
    InvalidSortDirection {
        /// The rejected direction text.
        value: String,
    },

    /// Sort text did not have the `field,direction` shape.
    #[error("invalid sort '{value}': expected field,direction")]
    InvalidSort {
        /// The rejected sort text.
        value: String,
    },

    /// Collection names must be non-empty and must not contain `?`.
    #[error("invalid collection name '{value}'")]
    InvalidCollection {
        /// The rejected collection name.
        value: String,
    },
}
