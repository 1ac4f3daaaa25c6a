//! Console state container and its transition function.
//!
//! The table slice drives reads; the dialog slice drives writes. No action
//! touches both.

use pagination::{PaginationError, QueryDescriptor, SortOrder};
use tracing::warn;

use crate::domain::mutation::{MutationError, MutationKind};
use crate::domain::{Field, Record, RecordDraft, RecordId, ValidationResult, validate};

/// Paging, filtering, and sorting chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    query: QueryDescriptor,
}

impl TableState {
    /// Start on the first page with no filters or sorting.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `page_size` is zero.
    pub fn new(page_size: u32) -> Result<Self, PaginationError> {
        Ok(Self {
            query: QueryDescriptor::new(0, page_size)?,
        })
    }

    /// Descriptor for the read this state asks for.
    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    /// Active column filters.
    pub fn filters(&self) -> &std::collections::BTreeMap<String, String> {
        self.query.filters()
    }

    /// Active free-text filter.
    pub fn global_filter(&self) -> Option<&str> {
        self.query.global_filter()
    }

    /// Sort pairs in priority order.
    pub fn sort(&self) -> &[SortOrder] {
        self.query.sort()
    }

    /// Zero-based page index.
    pub fn page_index(&self) -> u32 {
        self.query.page_index()
    }

    /// Rows per page.
    pub fn page_size(&self) -> u32 {
        self.query.page_size()
    }
}

/// Which form, if any, is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogMode {
    /// No form is shown.
    #[default]
    Closed,
    /// The create form is shown.
    Creating,
    /// The edit form for the given record is shown.
    Editing(RecordId),
}

/// Form contents and feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    /// Open form.
    pub mode: DialogMode,
    /// Values entered so far.
    pub draft: RecordDraft,
    /// Per-field validation messages.
    pub field_errors: ValidationResult,
    /// Message from the last failed save.
    pub server_error: Option<String>,
    /// Whether a save is pending.
    pub saving: bool,
}

impl DialogState {
    /// Whether a form is shown.
    pub fn is_open(&self) -> bool {
        self.mode != DialogMode::Closed
    }

    fn open(mode: DialogMode, draft: RecordDraft) -> Self {
        Self {
            mode,
            draft,
            ..Self::default()
        }
    }
}

/// Input events from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// Set or clear (blank value) a column filter.
    SetFilter {
        /// Record field name.
        field: String,
        /// Text to match.
        value: String,
    },
    /// Set or clear the free-text filter.
    SetGlobalFilter(Option<String>),
    /// Replace the sort pairs.
    SetSort(Vec<SortOrder>),
    /// Jump to a page.
    SetPage(u32),
    /// Change rows per page.
    SetPageSize(u32),
    /// Open the empty create form.
    OpenCreate,
    /// Open the edit form prefilled from a record.
    OpenEdit(Record),
    /// Type into a form field.
    EditField {
        /// Field being edited.
        field: Field,
        /// New value.
        value: String,
    },
    /// Focus a form field, clearing its error.
    FocusField(Field),
    /// Dismiss the form.
    CloseDialog,
}

/// Follow-up the caller must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The table changed; read the current descriptor.
    Refresh,
    /// Nothing to do.
    None,
}

/// Outcome of a write as seen by the state container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResolution {
    /// The server accepted the write.
    Succeeded,
    /// The write was refused or failed.
    Failed {
        /// Message to show the user.
        reason: String,
    },
}

impl MutationResolution {
    /// Map a coordinator result onto a resolution.
    pub fn from_result<T>(result: &Result<T, MutationError>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(error) => Self::Failed {
                reason: error.reason(),
            },
        }
    }
}

/// Write the dialog is ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Create a record.
    Create(RecordDraft),
    /// Update an existing record.
    Update(RecordId, RecordDraft),
}

impl Submission {
    /// Kind of write this submission performs.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create(_) => MutationKind::Create,
            Self::Update(..) => MutationKind::Update,
        }
    }
}

/// Complete console state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    /// Table slice.
    pub table: TableState,
    /// Dialog slice.
    pub dialog: DialogState,
    /// Message from the last failed delete.
    pub notice: Option<String>,
}

impl ConsoleState {
    /// Fresh state with the dialog closed and the table on its first page.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `page_size` is zero.
    pub fn new(page_size: u32) -> Result<Self, PaginationError> {
        Ok(Self {
            table: TableState::new(page_size)?,
            dialog: DialogState::default(),
            notice: None,
        })
    }

    /// Apply one user action.
    ///
    /// Filter, global filter, sort, and page size changes return to the
    /// first page. Actions the table cannot represent (a reserved filter
    /// name, a zero page size) leave the state unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use console::domain::controller::{ConsoleState, Effect, UserAction};
    ///
    /// let mut state = ConsoleState::new(10).expect("non-zero page size");
    /// assert_eq!(state.apply(UserAction::SetPage(3)), Effect::Refresh);
    /// let effect = state.apply(UserAction::SetGlobalFilter(Some("ada".into())));
    /// assert_eq!(effect, Effect::Refresh);
    /// assert_eq!(state.table.page_index(), 0);
    /// assert_eq!(state.apply(UserAction::OpenCreate), Effect::None);
    /// ```
    pub fn apply(&mut self, action: UserAction) -> Effect {
        match action {
            UserAction::SetFilter { field, value } => {
                match self.table.query.clone().with_filter(field, value) {
                    Ok(query) => self.replace_query(query.with_page_index(0)),
                    Err(error) => {
                        warn!(error = %error, "ignoring filter change");
                        Effect::None
                    }
                }
            }
            UserAction::SetGlobalFilter(text) => {
                let query = self.table.query.clone().with_global_filter(text);
                self.replace_query(query.with_page_index(0))
            }
            UserAction::SetSort(orders) => {
                let query = self.table.query.clone().without_sort().with_sorts(orders);
                self.replace_query(query.with_page_index(0))
            }
            UserAction::SetPage(page_index) => {
                let query = self.table.query.clone().with_page_index(page_index);
                self.replace_query(query)
            }
            UserAction::SetPageSize(page_size) => {
                match self.table.query.clone().with_page_size(page_size) {
                    Ok(query) => self.replace_query(query.with_page_index(0)),
                    Err(error) => {
                        warn!(error = %error, "ignoring page size change");
                        Effect::None
                    }
                }
            }
            UserAction::OpenCreate => {
                self.dialog = DialogState::open(DialogMode::Creating, RecordDraft::default());
                Effect::None
            }
            UserAction::OpenEdit(record) => {
                self.dialog = DialogState::open(DialogMode::Editing(record.id().clone()), record.draft());
                Effect::None
            }
            UserAction::EditField { field, value } => {
                if self.dialog.is_open() {
                    field.set(&mut self.dialog.draft, value);
                }
                Effect::None
            }
            UserAction::FocusField(field) => {
                self.dialog.field_errors.clear(field);
                Effect::None
            }
            UserAction::CloseDialog => {
                self.dialog = DialogState::default();
                Effect::None
            }
        }
    }

    /// Validate the open form and, when clean, mark it saving.
    ///
    /// Returns `None` when no form is open, a save is already pending, or
    /// validation failed; in the last case the field errors are attached.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if self.dialog.saving {
            return None;
        }
        let submission = match &self.dialog.mode {
            DialogMode::Closed => return None,
            DialogMode::Creating => Submission::Create(self.dialog.draft.clone()),
            DialogMode::Editing(id) => Submission::Update(id.clone(), self.dialog.draft.clone()),
        };
        let errors = validate(&self.dialog.draft);
        if !errors.is_valid() {
            self.dialog.field_errors = errors;
            return None;
        }
        self.dialog.field_errors = ValidationResult::default();
        self.dialog.server_error = None;
        self.dialog.saving = true;
        Some(submission)
    }

    /// Fold a write's outcome back into the state.
    ///
    /// A successful save closes the form; a failed save keeps the form and
    /// its values and attaches the reason. Delete outcomes land in
    /// [`Self::notice`].
    pub fn resolve(&mut self, kind: MutationKind, resolution: MutationResolution) {
        match (kind, resolution) {
            (MutationKind::Delete, MutationResolution::Succeeded) => self.notice = None,
            (MutationKind::Delete, MutationResolution::Failed { reason }) => {
                self.notice = Some(reason);
            }
            (_, MutationResolution::Succeeded) => self.dialog = DialogState::default(),
            (_, MutationResolution::Failed { reason }) => {
                self.dialog.saving = false;
                if self.dialog.is_open() {
                    self.dialog.server_error = Some(reason);
                }
            }
        }
    }

    fn replace_query(&mut self, query: QueryDescriptor) -> Effect {
        if query == self.table.query {
            return Effect::None;
        }
        self.table.query = query;
        Effect::Refresh
    }
}
