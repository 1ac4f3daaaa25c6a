//! Mutation coordinator for create, update, and delete.
//!
//! Each [`MutationKind`] has at most one operation in flight. A request for a
//! busy kind is refused with [`MutationError::Busy`]. Successful writes
//! invalidate every cached read of the collection; failed writes leave the
//! cache alone and record a user-facing reason.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::domain::ports::{RecordCollection, RecordCollectionError};
use crate::domain::query_cache::QueryCache;
use crate::domain::{Record, RecordDraft, RecordId};

/// Reason shown when a failed write carries no usable server message.
pub const FALLBACK_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Kinds of write the coordinator sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationKind {
    /// `POST {base}/{collection}`.
    Create,
    /// `PUT {base}/{collection}/{id}`.
    Update,
    /// `DELETE {base}/{collection}/{id}`.
    Delete,
}

impl MutationKind {
    /// Every mutation kind.
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];

    /// Lowercase name used in logs.
    ///
    /// # Example
    ///
    /// ```
    /// # use console::domain::MutationKind;
    /// assert_eq!(MutationKind::Create.as_str(), "create");
    /// assert_eq!(MutationKind::Delete.as_str(), "delete");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown mutation kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mutation kind: {input}")]
pub struct ParseMutationKindError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for MutationKind {
    type Err = ParseMutationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseMutationKindError {
                input: s.to_owned(),
            })
    }
}

/// Observable state of one mutation kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OperationState {
    /// Nothing running.
    #[default]
    Idle,
    /// A call is pending.
    InFlight,
    /// The last call failed.
    Failed {
        /// User-facing reason.
        reason: String,
    },
}

/// Errors returned by the coordinator's write operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// Another operation of the same kind is still running.
    #[error("a {kind} operation is already in flight")]
    Busy {
        /// Kind that was busy.
        kind: MutationKind,
    },
    /// The remote collection refused or could not be reached.
    #[error("{kind} failed: {reason}")]
    Failed {
        /// Kind that failed.
        kind: MutationKind,
        /// Server message or the fallback reason.
        reason: String,
    },
}

impl MutationError {
    /// Kind the error belongs to.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Busy { kind } | Self::Failed { kind, .. } => *kind,
        }
    }

    /// Message suitable for display next to the form.
    pub fn reason(&self) -> String {
        match self {
            Self::Busy { kind } => format!("A {kind} is already in progress."),
            Self::Failed { reason, .. } => reason.clone(),
        }
    }
}

/// Reason recorded for a failed write.
pub fn failure_reason(error: &RecordCollectionError) -> String {
    error
        .server_message()
        .map_or_else(|| FALLBACK_FAILURE_MESSAGE.to_owned(), str::to_owned)
}

/// Sequences writes against the collection and keeps the cache honest.
pub struct MutationCoordinator {
    collection: Arc<dyn RecordCollection>,
    cache: Arc<QueryCache>,
    states: Mutex<HashMap<MutationKind, OperationState>>,
}

impl MutationCoordinator {
    /// Build a coordinator writing through `collection` and invalidating `cache`.
    pub fn new(collection: Arc<dyn RecordCollection>, cache: Arc<QueryCache>) -> Self {
        Self {
            collection,
            cache,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Current state of `kind`.
    pub fn state(&self, kind: MutationKind) -> OperationState {
        self.lock().get(&kind).cloned().unwrap_or_default()
    }

    /// Whether an operation of `kind` is pending.
    pub fn is_in_flight(&self, kind: MutationKind) -> bool {
        self.state(kind) == OperationState::InFlight
    }

    /// Create a record from `draft`.
    pub async fn create(&self, draft: &RecordDraft) -> Result<Record, MutationError> {
        let guard = self.begin(MutationKind::Create)?;
        let result = self.collection.create(draft).await;
        self.finish(guard, result)
    }

    /// Replace the editable fields of `id`.
    pub async fn update(&self, id: &RecordId, draft: &RecordDraft) -> Result<Record, MutationError> {
        let guard = self.begin(MutationKind::Update)?;
        let result = self.collection.update(id, draft).await;
        self.finish(guard, result)
    }

    /// Delete `id`. Confirmation is the caller's concern.
    pub async fn delete(&self, id: &RecordId) -> Result<(), MutationError> {
        let guard = self.begin(MutationKind::Delete)?;
        let result = self.collection.delete(id).await;
        self.finish(guard, result)
    }

    fn begin(&self, kind: MutationKind) -> Result<InFlightGuard<'_>, MutationError> {
        let mut states = self.lock();
        let state = states.entry(kind).or_default();
        if *state == OperationState::InFlight {
            debug!(kind = %kind, "refusing concurrent mutation");
            return Err(MutationError::Busy { kind });
        }
        *state = OperationState::InFlight;
        Ok(InFlightGuard {
            states: &self.states,
            kind,
            settled: false,
        })
    }

    fn finish<T>(
        &self,
        mut guard: InFlightGuard<'_>,
        result: Result<T, RecordCollectionError>,
    ) -> Result<T, MutationError> {
        let kind = guard.kind;
        guard.settled = true;
        match result {
            Ok(value) => {
                self.lock().insert(kind, OperationState::Idle);
                let invalidated = self.cache.invalidate(self.cache.collection_name());
                debug!(kind = %kind, invalidated, "mutation succeeded");
                Ok(value)
            }
            Err(error) => {
                let reason = failure_reason(&error);
                warn!(kind = %kind, error = %error, "mutation failed");
                self.lock().insert(
                    kind,
                    OperationState::Failed {
                        reason: reason.clone(),
                    },
                );
                Err(MutationError::Failed { kind, reason })
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MutationKind, OperationState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns a kind to `Idle` when its operation is dropped before `finish`.
///
/// The cache is not invalidated; the write's outcome is unknown.
struct InFlightGuard<'a> {
    states: &'a Mutex<HashMap<MutationKind, OperationState>>,
    kind: MutationKind,
    settled: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        if states.get(&self.kind) == Some(&OperationState::InFlight) {
            states.insert(self.kind, OperationState::Idle);
        }
        debug!(kind = %self.kind, "mutation cancelled before completion");
    }
}
