//! Query cache and fetch coordinator for collection reads.
//!
//! The cache owns every read of the remote collection. Callers never mutate
//! it directly: they go through [`QueryCache::ensure`], [`QueryCache::refetch`],
//! and [`QueryCache::invalidate`].
//!
//! Bookkeeping:
//! - an entry per [`Signature`] with the last page, the fetch status, the
//!   ticket of the applied response, and the last ticket covered by an
//!   invalidation;
//! - an in-flight registry mapping a signature to the shared future of its
//!   pending call, so concurrent reads of one signature make one call;
//! - the current signature, which alone feeds the displayed view.
//!
//! Every call gets a monotonically increasing ticket. A response is applied
//! to its own signature's entry only when its ticket is not older than the
//! one already applied, and data from a ticket issued before an
//! invalidation stays stale.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use pagination::{Page, QueryDescriptor, Signature};
use tracing::{debug, warn};

use crate::domain::Record;
use crate::domain::ports::{RecordCollection, RecordCollectionError};

type FetchResult = Result<Page<Record>, RecordCollectionError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Lifecycle of the read for one signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing has been requested yet.
    Idle,
    /// A call is pending.
    Loading,
    /// The last call succeeded.
    Success,
    /// The last call failed; no automatic retry follows.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl FetchStatus {
    /// Whether a call is pending.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Data and status of one signature at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySnapshot {
    /// Signature the snapshot describes; `None` before any read.
    pub signature: Option<Signature>,
    /// Last known page, or the empty placeholder.
    pub data: Page<Record>,
    /// Fetch status.
    pub status: FetchStatus,
    /// Whether the data predates the last invalidation.
    pub stale: bool,
}

impl QuerySnapshot {
    fn placeholder(signature: Option<Signature>, page_size: u32) -> Self {
        Self {
            signature,
            data: Page::placeholder(page_size),
            status: FetchStatus::Idle,
            stale: false,
        }
    }
}

struct CacheEntry {
    page_size: u32,
    page: Option<Page<Record>>,
    status: FetchStatus,
    applied_ticket: u64,
    invalidated_through: u64,
}

impl CacheEntry {
    const fn new(page_size: u32) -> Self {
        Self {
            page_size,
            page: None,
            status: FetchStatus::Idle,
            applied_ticket: 0,
            invalidated_through: 0,
        }
    }

    fn is_stale(&self) -> bool {
        self.invalidated_through > 0 && self.applied_ticket <= self.invalidated_through
    }

    fn is_settled(&self) -> bool {
        matches!(self.status, FetchStatus::Success | FetchStatus::Error { .. })
    }
}

struct InFlight {
    ticket: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    current: Option<(Signature, QueryDescriptor)>,
    entries: HashMap<Signature, CacheEntry>,
    in_flight: HashMap<Signature, InFlight>,
    last_ticket: u64,
}

impl CacheState {
    fn snapshot(&self, signature: &Signature) -> QuerySnapshot {
        match self.entries.get(signature) {
            Some(entry) => QuerySnapshot {
                signature: Some(signature.clone()),
                data: entry
                    .page
                    .clone()
                    .unwrap_or_else(|| Page::placeholder(entry.page_size)),
                status: entry.status.clone(),
                stale: entry.is_stale(),
            },
            None => QuerySnapshot::placeholder(Some(signature.clone()), 0),
        }
    }

    fn is_current(&self, signature: &Signature) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(current, _)| current == signature)
    }
}

enum Plan {
    Ready,
    Join(u64, SharedFetch),
    Start,
}

/// Coordinates reads of one collection and caches their results.
pub struct QueryCache {
    collection: Arc<dyn RecordCollection>,
    collection_name: String,
    state: Mutex<CacheState>,
}

impl QueryCache {
    /// Build a cache reading `collection_name` through `collection`.
    pub fn new(collection: Arc<dyn RecordCollection>, collection_name: impl Into<String>) -> Self {
        Self {
            collection,
            collection_name: collection_name.into(),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Name of the cached collection; also the invalidation prefix for every read.
    pub fn collection_name(&self) -> &str {
        self.collection_name.as_str()
    }

    /// Signature of `descriptor` for this collection.
    pub fn signature_of(&self, descriptor: &QueryDescriptor) -> Signature {
        descriptor.signature(&self.collection_name)
    }

    /// Synchronous snapshot of one signature.
    pub fn snapshot(&self, signature: &Signature) -> QuerySnapshot {
        self.lock().snapshot(signature)
    }

    /// Snapshot of the current signature; the empty placeholder before any read.
    pub fn current_view(&self) -> QuerySnapshot {
        let state = self.lock();
        match &state.current {
            Some((signature, _)) => state.snapshot(signature),
            None => QuerySnapshot::placeholder(None, 0),
        }
    }

    /// Whether `signature` is the one feeding the displayed view.
    pub fn is_current(&self, signature: &Signature) -> bool {
        self.lock().is_current(signature)
    }

    /// Make `descriptor` current and bring its entry up to date.
    ///
    /// Returns at once on a fresh result, joins a pending call for the same
    /// signature, and otherwise starts a call. Failed entries are not
    /// retried here; use [`Self::refetch`].
    pub async fn ensure(&self, descriptor: &QueryDescriptor) -> QuerySnapshot {
        let signature = self.signature_of(descriptor);
        let (ticket, fetch) = {
            let mut state = self.lock();
            state.current = Some((signature.clone(), descriptor.clone()));
            match plan(&state, &signature) {
                Plan::Ready => return state.snapshot(&signature),
                Plan::Join(ticket, fetch) => {
                    debug!(signature = %signature, ticket, "joining in-flight fetch");
                    (ticket, fetch)
                }
                Plan::Start => self.start_fetch(&mut state, &signature, descriptor),
            }
        };
        let result = fetch.await;
        self.complete(&signature, ticket, result)
    }

    /// Force a new call for the current signature, whatever its cache state.
    ///
    /// Returns `None` when nothing has been read yet.
    pub async fn refetch(&self) -> Option<QuerySnapshot> {
        let (signature, ticket, fetch) = {
            let mut state = self.lock();
            let (signature, descriptor) = state.current.clone()?;
            let (ticket, fetch) = self.start_fetch(&mut state, &signature, &descriptor);
            (signature, ticket, fetch)
        };
        let result = fetch.await;
        Some(self.complete(&signature, ticket, result))
    }

    /// Mark every entry under `prefix` stale and detach its pending calls.
    ///
    /// Returns the number of entries invalidated.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let mut state = self.lock();
        let through = state.last_ticket;
        let mut invalidated = 0;
        for (signature, entry) in &mut state.entries {
            if signature.matches_prefix(prefix) {
                entry.invalidated_through = through;
                invalidated += 1;
            }
        }
        state
            .in_flight
            .retain(|signature, _| !signature.matches_prefix(prefix));
        debug!(prefix, invalidated, through, "invalidated cached pages");
        invalidated
    }

    fn start_fetch(
        &self,
        state: &mut CacheState,
        signature: &Signature,
        descriptor: &QueryDescriptor,
    ) -> (u64, SharedFetch) {
        state.last_ticket += 1;
        let ticket = state.last_ticket;
        let collection = Arc::clone(&self.collection);
        let request = descriptor.clone();
        let fetch = async move { collection.fetch_page(&request).await }
            .boxed()
            .shared();
        state.in_flight.insert(
            signature.clone(),
            InFlight {
                ticket,
                fetch: fetch.clone(),
            },
        );
        let entry = state
            .entries
            .entry(signature.clone())
            .or_insert_with(|| CacheEntry::new(descriptor.page_size()));
        entry.status = FetchStatus::Loading;
        debug!(signature = %signature, ticket, "starting fetch");
        (ticket, fetch)
    }

    fn complete(&self, signature: &Signature, ticket: u64, result: FetchResult) -> QuerySnapshot {
        let mut state = self.lock();
        let newer_pending = match state.in_flight.get(signature) {
            Some(pending) if pending.ticket == ticket => {
                state.in_flight.remove(signature);
                false
            }
            Some(_) => true,
            None => false,
        };
        if !state.is_current(signature) {
            debug!(signature = %signature, ticket, "response arrived for a superseded signature");
        }

        let Some(entry) = state.entries.get_mut(signature) else {
            return state.snapshot(signature);
        };
        if ticket < entry.applied_ticket {
            debug!(signature = %signature, ticket, applied = entry.applied_ticket, "discarding out-of-order response");
            return state.snapshot(signature);
        }
        entry.applied_ticket = ticket;
        match result {
            Ok(page) => {
                entry.page = Some(page);
                entry.status = FetchStatus::Success;
            }
            Err(error) => {
                warn!(signature = %signature, ticket, error = %error, "fetch failed");
                entry.status = FetchStatus::Error {
                    message: error.to_string(),
                };
            }
        }
        if newer_pending {
            entry.status = FetchStatus::Loading;
        }
        state.snapshot(signature)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn plan(state: &CacheState, signature: &Signature) -> Plan {
    if let Some(pending) = state.in_flight.get(signature) {
        return Plan::Join(pending.ticket, pending.fetch.clone());
    }
    match state.entries.get(signature) {
        Some(entry) if entry.is_settled() && !entry.is_stale() => Plan::Ready,
        _ => Plan::Start,
    }
}
