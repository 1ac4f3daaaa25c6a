//! Test utilities shared by the console's unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pagination::{Page, QueryDescriptor};
use tokio::sync::Notify;

use crate::domain::ports::{RecordCollection, RecordCollectionError};
use crate::domain::{Record, RecordDraft, RecordId};
use crate::outbound::memory::InMemoryRecordCollection;

/// In-memory collection with call counters, held-open calls, and scripted failures.
///
/// Reads for a gated page index wait for one `notify_one` on that gate before
/// answering; writes wait on the write gate when one is installed.
#[derive(Default)]
pub(crate) struct ScriptedCollection {
    records: InMemoryRecordCollection,
    fetch_calls: AtomicUsize,
    write_calls: AtomicUsize,
    page_gates: Mutex<HashMap<u32, Arc<Notify>>>,
    write_gate: Mutex<Option<Arc<Notify>>>,
    fetch_failures: Mutex<VecDeque<RecordCollectionError>>,
    write_failures: Mutex<VecDeque<RecordCollectionError>>,
}

impl ScriptedCollection {
    pub(crate) async fn seeded(drafts: &[RecordDraft]) -> Self {
        let collection = Self::default();
        for draft in drafts {
            collection
                .records
                .create(draft)
                .await
                .expect("seed record");
        }
        collection
    }

    pub(crate) fn gate_page(&self, page_index: u32) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.page_gates
            .lock()
            .expect("gates mutex")
            .insert(page_index, Arc::clone(&gate));
        gate
    }

    pub(crate) fn gate_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock().expect("write gate mutex") = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn ungate_page(&self, page_index: u32) {
        self.page_gates
            .lock()
            .expect("gates mutex")
            .remove(&page_index);
    }

    pub(crate) fn ungate_writes(&self) {
        *self.write_gate.lock().expect("write gate mutex") = None;
    }

    pub(crate) fn fail_next_fetch(&self, error: RecordCollectionError) {
        self.fetch_failures
            .lock()
            .expect("failures mutex")
            .push_back(error);
    }

    pub(crate) fn fail_next_write(&self, error: RecordCollectionError) {
        self.write_failures
            .lock()
            .expect("failures mutex")
            .push_back(error);
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn records(&self) -> Vec<Record> {
        self.records.records()
    }

    async fn before_write(&self) -> Result<(), RecordCollectionError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.write_gate.lock().expect("write gate mutex").clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.write_failures.lock().expect("failures mutex").pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordCollection for ScriptedCollection {
    async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<Page<Record>, RecordCollectionError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .page_gates
            .lock()
            .expect("gates mutex")
            .get(&descriptor.page_index())
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failure = self.fetch_failures.lock().expect("failures mutex").pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        self.records.fetch_page(descriptor).await
    }

    async fn create(&self, draft: &RecordDraft) -> Result<Record, RecordCollectionError> {
        self.before_write().await?;
        self.records.create(draft).await
    }

    async fn update(
        &self,
        id: &RecordId,
        draft: &RecordDraft,
    ) -> Result<Record, RecordCollectionError> {
        self.before_write().await?;
        self.records.update(id, draft).await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordCollectionError> {
        self.before_write().await?;
        self.records.delete(id).await
    }
}

/// Drafts used to seed test collections.
pub(crate) fn sample_drafts() -> Vec<RecordDraft> {
    vec![
        RecordDraft::new("Ada Lovelace", "ada@example.com", "analytical"),
        RecordDraft::new("Grace Hopper", "grace@navy.mil", "cobol"),
        RecordDraft::new("Alan Turing", "alan@example.org", "enigma"),
    ]
}
