//! In-process record collection.
//!
//! Implements the same read contract as the remote service so the console can
//! run without a network and tests can observe real filter, sort, and paging
//! behaviour. Column filters and the global filter are case-insensitive
//! substring matches; the global filter matches `fullName` or `email`.
//! Unknown filter and sort fields are ignored.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use pagination::{Page, PageMetadata, QueryDescriptor, SortDirection, SortOrder};
use uuid::Uuid;

use crate::domain::ports::{RecordCollection, RecordCollectionError};
use crate::domain::{Record, RecordDraft, RecordId};

const NOT_FOUND_STATUS: u16 = 404;
const CONFLICT_STATUS: u16 = 409;

/// Record collection held in memory.
pub struct InMemoryRecordCollection {
    clock: Arc<dyn Clock>,
    records: Mutex<Vec<Record>>,
}

impl Default for InMemoryRecordCollection {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl InMemoryRecordCollection {
    /// Build an empty collection stamping records with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of stored records in insertion order.
    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_unique_email(
        records: &[Record],
        email: &str,
        except: Option<&RecordId>,
    ) -> Result<(), RecordCollectionError> {
        let taken = records.iter().any(|record| {
            Some(record.id()) != except && record.email().eq_ignore_ascii_case(email)
        });
        if taken {
            return Err(RecordCollectionError::rejected(
                CONFLICT_STATUS,
                Some(format!("A record with email {email} already exists")),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordCollection for InMemoryRecordCollection {
    async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<Page<Record>, RecordCollectionError> {
        let mut matching: Vec<Record> = self
            .lock()
            .iter()
            .filter(|record| matches_descriptor(record, descriptor))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_records(a, b, descriptor.sort()));
        Ok(paginate(matching, descriptor))
    }

    async fn create(&self, draft: &RecordDraft) -> Result<Record, RecordCollectionError> {
        let mut records = self.lock();
        Self::ensure_unique_email(&records, &draft.email, None)?;
        let id = RecordId::new(Uuid::new_v4().to_string())
            .map_err(|err| RecordCollectionError::decode(err.to_string()))?;
        let now = self.clock.utc();
        let record = Record::new(id, draft.clone(), now, now);
        records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &RecordId,
        draft: &RecordDraft,
    ) -> Result<Record, RecordCollectionError> {
        let mut records = self.lock();
        Self::ensure_unique_email(&records, &draft.email, Some(id))?;
        let now = self.clock.utc();
        let slot = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| not_found(id))?;
        let updated = slot.clone().with_fields(draft.clone(), now);
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordCollectionError> {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

fn not_found(id: &RecordId) -> RecordCollectionError {
    RecordCollectionError::rejected(NOT_FOUND_STATUS, Some(format!("Record {id} not found")))
}

fn field_text<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    match field {
        "id" => Some(record.id().as_ref()),
        "fullName" => Some(record.full_name()),
        "email" => Some(record.email()),
        "password" => Some(record.password()),
        _ => None,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_descriptor(record: &Record, descriptor: &QueryDescriptor) -> bool {
    let columns_match = descriptor.filters().iter().all(|(field, value)| {
        field_text(record, field).is_none_or(|text| contains_ignore_case(text, value))
    });
    let global_matches = descriptor.global_filter().is_none_or(|needle| {
        contains_ignore_case(record.full_name(), needle) || contains_ignore_case(record.email(), needle)
    });
    columns_match && global_matches
}

fn compare_records(a: &Record, b: &Record, sort: &[SortOrder]) -> Ordering {
    sort.iter()
        .map(|order| {
            let ordering = compare_field(a, b, order.field());
            match order.direction() {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_field(a: &Record, b: &Record, field: &str) -> Ordering {
    match field {
        "createdAt" => a.created_at().cmp(&b.created_at()),
        "updatedAt" => a.updated_at().cmp(&b.updated_at()),
        _ => match (field_text(a, field), field_text(b, field)) {
            (Some(left), Some(right)) => left.to_lowercase().cmp(&right.to_lowercase()),
            _ => Ordering::Equal,
        },
    }
}

fn paginate(records: Vec<Record>, descriptor: &QueryDescriptor) -> Page<Record> {
    let size = descriptor.page_size();
    let size_usize = usize::try_from(size).unwrap_or(usize::MAX);
    let index = usize::try_from(descriptor.page_index()).unwrap_or(usize::MAX);
    let total = records.len();
    let total_pages = u32::try_from(total.div_ceil(size_usize)).unwrap_or(u32::MAX);
    let items = records
        .into_iter()
        .skip(index.saturating_mul(size_usize))
        .take(size_usize)
        .collect();
    Page::new(
        items,
        PageMetadata {
            size,
            total_elements: u64::try_from(total).unwrap_or(u64::MAX),
            total_pages,
            number: descriptor.page_index(),
        },
    )
}
