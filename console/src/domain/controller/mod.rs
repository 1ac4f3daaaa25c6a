//! Interaction controller tying user actions to reads and writes.
//!
//! [`ConsoleState`] is the pure state container. [`InteractionController`]
//! owns one, runs the reads and writes its transitions ask for, and folds
//! the results back in.

mod state;

use std::sync::Arc;

use pagination::PaginationError;
use tracing::debug;

use crate::domain::mutation::{MutationCoordinator, MutationError, MutationKind};
use crate::domain::ports::RecordCollection;
use crate::domain::query_cache::{QueryCache, QuerySnapshot};
use crate::domain::{Record, RecordId, ValidationResult};

pub use self::state::{
    ConsoleState, DialogMode, DialogState, Effect, MutationResolution, Submission, TableState,
    UserAction,
};

/// Gate asked before a record is deleted.
///
/// Closures of type `Fn(&RecordId) -> bool` implement it.
pub trait DeleteConfirmation {
    /// Whether the user agreed to delete `id`.
    fn confirm(&self, id: &RecordId) -> bool;
}

impl<F> DeleteConfirmation for F
where
    F: Fn(&RecordId) -> bool,
{
    fn confirm(&self, id: &RecordId) -> bool {
        self(id)
    }
}

/// Result of [`InteractionController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No form was open, or a save was already pending.
    Ignored,
    /// Validation failed; nothing was sent.
    Invalid(ValidationResult),
    /// The server stored the record and the form closed.
    Saved(Record),
    /// The write failed; the form stays open with its values.
    Rejected(MutationError),
}

/// Result of [`InteractionController::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent.
    Declined,
    /// The record was deleted.
    Deleted,
    /// The delete failed.
    Rejected(MutationError),
}

/// Drives one console session.
pub struct InteractionController {
    state: ConsoleState,
    cache: Arc<QueryCache>,
    mutations: Arc<MutationCoordinator>,
}

impl InteractionController {
    /// Build a controller for `collection_name`, reading and writing through `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `page_size` is zero.
    pub fn new(
        collection: Arc<dyn RecordCollection>,
        collection_name: impl Into<String>,
        page_size: u32,
    ) -> Result<Self, PaginationError> {
        Ok(Self::with_state(
            collection,
            collection_name,
            ConsoleState::new(page_size)?,
        ))
    }

    /// Build a controller that starts from a prepared state.
    pub fn with_state(
        collection: Arc<dyn RecordCollection>,
        collection_name: impl Into<String>,
        state: ConsoleState,
    ) -> Self {
        let cache = Arc::new(QueryCache::new(Arc::clone(&collection), collection_name));
        let mutations = Arc::new(MutationCoordinator::new(collection, Arc::clone(&cache)));
        Self::from_parts(state, cache, mutations)
    }

    /// Assemble a controller from existing parts.
    pub fn from_parts(
        state: ConsoleState,
        cache: Arc<QueryCache>,
        mutations: Arc<MutationCoordinator>,
    ) -> Self {
        Self {
            state,
            cache,
            mutations,
        }
    }

    /// Current state.
    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    /// What the table shows right now.
    pub fn view(&self) -> QuerySnapshot {
        self.cache.current_view()
    }

    /// Shared query cache.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Shared mutation coordinator.
    pub fn mutations(&self) -> &Arc<MutationCoordinator> {
        &self.mutations
    }

    /// Apply an action and perform the read it calls for.
    pub async fn dispatch(&mut self, action: UserAction) -> QuerySnapshot {
        match self.state.apply(action) {
            Effect::Refresh => self.refresh().await,
            Effect::None => self.view(),
        }
    }

    /// Read the table's current descriptor through the cache.
    pub async fn refresh(&self) -> QuerySnapshot {
        self.cache.ensure(self.state.table.query()).await
    }

    /// Explicitly retry the current read, including after a failure.
    pub async fn retry(&self) -> QuerySnapshot {
        match self.cache.refetch().await {
            Some(snapshot) => snapshot,
            None => self.refresh().await,
        }
    }

    /// Validate and save the open form.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(submission) = self.state.begin_submit() else {
            if self.state.dialog.field_errors.is_valid() {
                return SubmitOutcome::Ignored;
            }
            debug!(errors = self.state.dialog.field_errors.len(), "form failed validation");
            return SubmitOutcome::Invalid(self.state.dialog.field_errors.clone());
        };
        let kind = submission.kind();
        let result = match submission {
            Submission::Create(draft) => self.mutations.create(&draft).await,
            Submission::Update(id, draft) => self.mutations.update(&id, &draft).await,
        };
        self.state.resolve(kind, MutationResolution::from_result(&result));
        match result {
            Ok(record) => {
                self.refresh().await;
                SubmitOutcome::Saved(record)
            }
            Err(error) => SubmitOutcome::Rejected(error),
        }
    }

    /// Delete `id` once `confirmation` agrees.
    pub async fn delete(
        &mut self,
        id: &RecordId,
        confirmation: &dyn DeleteConfirmation,
    ) -> DeleteOutcome {
        if !confirmation.confirm(id) {
            debug!(id = %id, "delete declined");
            return DeleteOutcome::Declined;
        }
        let result = self.mutations.delete(id).await;
        self.state
            .resolve(MutationKind::Delete, MutationResolution::from_result(&result));
        match result {
            Ok(()) => {
                self.refresh().await;
                DeleteOutcome::Deleted
            }
            Err(error) => DeleteOutcome::Rejected(error),
        }
    }
}
