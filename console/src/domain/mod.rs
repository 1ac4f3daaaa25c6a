//! Record console domain.
//!
//! Purpose: hold the query-state synchronisation and mutation coordination
//! core. Adapters live in `crate::outbound`; this module only sees the
//! [`ports::RecordCollection`] port.
//!
//! Public surface:
//! - `Record`, `RecordDraft`, `RecordId`: record shapes and identity.
//! - `validate` and `ValidationResult`: per-field draft validation.
//! - `QueryCache`: cached, de-duplicated collection reads.
//! - `MutationCoordinator`: one-at-a-time writes per kind.
//! - `controller`: state container and interaction controller.

pub mod controller;
pub mod mutation;
pub mod ports;
pub mod query_cache;
mod record;
mod validation;

pub use self::mutation::{
    FALLBACK_FAILURE_MESSAGE, MutationCoordinator, MutationError, MutationKind, OperationState,
};
pub use self::query_cache::{FetchStatus, QueryCache, QuerySnapshot};
pub use self::record::{Record, RecordDraft, RecordId, RecordValidationError};
pub use self::validation::{
    FULL_NAME_REQUIRED, Field, INCORRECT_EMAIL_FORMAT, PASSWORD_REQUIRED, ValidationResult,
    is_valid_email, validate,
};
