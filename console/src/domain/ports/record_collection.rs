//! Driven port for the remote record collection.
//!
//! The domain owns the query descriptor and the record shapes; adapters own
//! transport, wire encoding, and status mapping.

use async_trait::async_trait;
use pagination::{Page, QueryDescriptor};

use super::define_port_error;
use crate::domain::{Record, RecordDraft, RecordId};

define_port_error! {
    /// Errors surfaced while calling the remote collection.
    pub enum RecordCollectionError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "record collection transport failed: {message}",
        /// The call exceeded the adapter's transport timeout.
        Timeout { message: String } =>
            "record collection timeout: {message}",
        /// The server answered with a non-success status.
        Rejected { status: u16, server_message: Option<String> } =>
            "record collection rejected the request with status {status}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "record collection response decode failed: {message}",
    }
}

impl RecordCollectionError {
    /// Human-readable message supplied by the server, when present and non-blank.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                server_message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Port for reading and writing the record collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordCollection: Send + Sync {
    /// Read one page matching the descriptor's filters and sort.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use console::domain::ports::RecordCollection;
    /// use console::outbound::memory::InMemoryRecordCollection;
    /// use pagination::QueryDescriptor;
    ///
    /// let collection = InMemoryRecordCollection::default();
    /// let page = collection.fetch_page(&QueryDescriptor::new(0, 10)?).await?;
    /// assert_eq!(page.metadata().total_elements, 0);
    /// ```
    async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<Page<Record>, RecordCollectionError>;

    /// Store a new record; the server assigns its id and timestamps.
    async fn create(&self, draft: &RecordDraft) -> Result<Record, RecordCollectionError>;

    /// Replace the editable fields of an existing record.
    async fn update(
        &self,
        id: &RecordId,
        draft: &RecordDraft,
    ) -> Result<Record, RecordCollectionError>;

    /// Remove a record.
    async fn delete(&self, id: &RecordId) -> Result<(), RecordCollectionError>;
}

#[cfg(test)]
mod tests {
    //! Server message extraction.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RecordCollectionError::rejected(422_u16, Some("Email already taken".to_owned())), Some("Email already taken"))]
    #[case(RecordCollectionError::rejected(500_u16, Some("   ".to_owned())), None)]
    #[case(RecordCollectionError::rejected(500_u16, None::<String>), None)]
    #[case(RecordCollectionError::transport("connection refused"), None)]
    fn extracts_only_non_blank_server_messages(
        #[case] error: RecordCollectionError,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(error.server_message(), expected);
    }
}
