//! Reqwest-backed record collection adapter.
//!
//! This adapter owns transport details only: URL layout, timeout and HTTP
//! error mapping, and JSON decoding into domain records.

use std::time::Duration;

use async_trait::async_trait;
use pagination::{Page, QueryDescriptor};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use super::dto::{ErrorBodyDto, HalPageDto};
use crate::domain::ports::{RecordCollection, RecordCollectionError};
use crate::domain::{Record, RecordDraft, RecordId};

/// Record collection served over HTTP at `{base_url}/{collection}`.
pub struct HttpRecordCollection {
    client: Client,
    base_url: Url,
    collection: String,
}

impl HttpRecordCollection {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let users = HttpRecordCollection::new(base_url, "users", Duration::from_secs(30))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            collection: collection.into(),
        })
    }

    /// Collection path segment.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, id: Option<&RecordId>) -> Result<Url, RecordCollectionError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                RecordCollectionError::transport(format!(
                    "base url {} cannot carry a path",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty().push(&self.collection);
            if let Some(record_id) = id {
                segments.push(record_id.as_ref());
            }
        }
        Ok(url)
    }

    fn read_url(&self, descriptor: &QueryDescriptor) -> Result<Url, RecordCollectionError> {
        let mut url = self.endpoint(None)?;
        let signature = descriptor.signature(&self.collection);
        url.set_query(Some(signature.query()));
        Ok(url)
    }
}

#[async_trait]
impl RecordCollection for HttpRecordCollection {
    async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<Page<Record>, RecordCollectionError> {
        let url = self.read_url(descriptor)?;
        debug!(url = %url, "fetching page");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        parse_page(body.as_ref(), &self.collection, descriptor)
    }

    async fn create(&self, draft: &RecordDraft) -> Result<Record, RecordCollectionError> {
        let response = self
            .client
            .post(self.endpoint(None)?)
            .json(draft)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        parse_record(body.as_ref())
    }

    async fn update(
        &self,
        id: &RecordId,
        draft: &RecordDraft,
    ) -> Result<Record, RecordCollectionError> {
        let response = self
            .client
            .put(self.endpoint(Some(id))?)
            .json(draft)
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        parse_record(body.as_ref())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordCollectionError> {
        let response = self
            .client
            .delete(self.endpoint(Some(id))?)
            .send()
            .await
            .map_err(map_transport_error)?;
        success_body(response).await.map(drop)
    }
}

async fn success_body(response: Response) -> Result<Vec<u8>, RecordCollectionError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn parse_page(
    body: &[u8],
    collection: &str,
    descriptor: &QueryDescriptor,
) -> Result<Page<Record>, RecordCollectionError> {
    let decoded: HalPageDto = serde_json::from_slice(body).map_err(|error| {
        RecordCollectionError::decode(format!("invalid page payload: {error}"))
    })?;
    Ok(decoded.into_page(collection, descriptor))
}

fn parse_record(body: &[u8]) -> Result<Record, RecordCollectionError> {
    serde_json::from_slice(body)
        .map_err(|error| RecordCollectionError::decode(format!("invalid record payload: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> RecordCollectionError {
    if error.is_timeout() {
        RecordCollectionError::timeout(error.to_string())
    } else {
        RecordCollectionError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RecordCollectionError {
    let server_message = serde_json::from_slice::<ErrorBodyDto>(body)
        .unwrap_or_default()
        .message
        .filter(|message| !message.trim().is_empty());
    RecordCollectionError::rejected(status.as_u16(), server_message)
}

#[cfg(test)]
mod tests {
    //! URL layout and payload mapping without a network.

    use super::*;
    use rstest::rstest;

    fn adapter(base: &str) -> HttpRecordCollection {
        let base_url = Url::parse(base).expect("valid url");
        HttpRecordCollection::new(base_url, "users", Duration::from_secs(5)).expect("client")
    }

    fn first_page() -> QueryDescriptor {
        QueryDescriptor::new(0, 10).expect("valid descriptor")
    }

    #[rstest]
    #[case("http://localhost:8080/api", "http://localhost:8080/api/users")]
    #[case("http://localhost:8080/api/", "http://localhost:8080/api/users")]
    #[case("http://localhost:8080", "http://localhost:8080/users")]
    fn joins_the_collection_onto_the_base_path(#[case] base: &str, #[case] expected: &str) {
        let url = adapter(base).endpoint(None).expect("endpoint");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn record_urls_escape_the_id() {
        let id = RecordId::new("a b/c").expect("valid id");
        let url = adapter("http://localhost/api")
            .endpoint(Some(&id))
            .expect("endpoint");
        assert_eq!(url.as_str(), "http://localhost/api/users/a%20b%2Fc");
    }

    #[test]
    fn read_urls_carry_the_canonical_query() {
        let descriptor = QueryDescriptor::new(1, 10)
            .and_then(|d| d.with_filter("email", "ada@example.com"))
            .expect("valid descriptor")
            .with_sort(pagination::SortOrder::desc("fullName"));
        let url = adapter("http://localhost/api")
            .read_url(&descriptor)
            .expect("read url");
        assert_eq!(
            url.query(),
            Some("page=1&size=10&email=ada%40example.com&sort=fullName,desc")
        );
    }

    #[rstest]
    #[case(br#"{"message":"Email already taken"}"#.as_slice(), Some("Email already taken"))]
    #[case(br#"{"message":"  "}"#.as_slice(), None)]
    #[case(br#"{"error":"conflict"}"#.as_slice(), None)]
    #[case(b"<html>Bad Gateway</html>".as_slice(), None)]
    #[case(b"".as_slice(), None)]
    fn status_errors_keep_only_usable_server_messages(
        #[case] body: &[u8],
        #[case] expected: Option<&str>,
    ) {
        let error = map_status_error(StatusCode::CONFLICT, body);
        assert!(matches!(
            error,
            RecordCollectionError::Rejected { status: 409, .. }
        ));
        assert_eq!(error.server_message(), expected);
    }

    #[test]
    fn parses_hal_pages() {
        let body = r#"{
            "_embedded": {
                "users": [
                    {
                        "id": "u-1",
                        "fullName": "Ada Lovelace",
                        "email": "ada@example.com",
                        "password": "analytical",
                        "createdAt": "2026-01-02T03:04:05Z",
                        "updatedAt": "2026-01-02T03:04:05Z",
                        "_links": { "self": { "href": "http://localhost/api/users/u-1" } }
                    }
                ]
            },
            "page": { "size": 10, "totalElements": 11, "totalPages": 2, "number": 0 }
        }"#;

        let page = parse_page(body.as_bytes(), "users", &first_page()).expect("page");

        assert_eq!(page.items().len(), 1);
        assert_eq!(page.items()[0].full_name(), "Ada Lovelace");
        assert_eq!(page.metadata().total_elements, 11);
        assert!(page.has_next_page());
    }

    #[test]
    fn missing_embedded_records_mean_an_empty_page() {
        let body = r#"{ "page": { "size": 10, "totalElements": 0, "totalPages": 0, "number": 0 } }"#;
        let page = parse_page(body.as_bytes(), "users", &first_page()).expect("page");
        assert!(page.items().is_empty());
        assert!(!page.has_next_page());
    }

    #[rstest]
    #[case(0, 1, 1, 1)]
    #[case(2, 1, 3, 21)]
    #[case(2, 0, 2, 20)]
    fn totals_are_derived_from_the_request_without_page_metadata(
        #[case] page_index: u32,
        #[case] items: usize,
        #[case] total_pages: u32,
        #[case] total_elements: u64,
    ) {
        let record = r#"{
            "id": "u-1",
            "fullName": "Ada Lovelace",
            "email": "ada@example.com",
            "password": "analytical",
            "createdAt": "2026-01-02T03:04:05Z",
            "updatedAt": "2026-01-02T03:04:05Z"
        }"#;
        let users = vec![record; items].join(",");
        let body = format!(r#"{{ "_embedded": {{ "users": [{users}] }} }}"#);
        let descriptor = QueryDescriptor::new(page_index, 10).expect("valid descriptor");

        let page = parse_page(body.as_bytes(), "users", &descriptor).expect("page");

        let metadata = page.metadata();
        assert_eq!(metadata.number, page_index);
        assert_eq!(metadata.total_pages, total_pages);
        assert_eq!(metadata.total_elements, total_elements);
        assert!(!page.has_next_page());
        assert_eq!(page.has_previous_page(), page_index > 0);
    }

    #[test]
    fn malformed_pages_are_decode_errors() {
        let error = parse_page(b"[1, 2, 3]", "users", &first_page()).expect_err("decode");
        assert!(matches!(error, RecordCollectionError::Decode { .. }));
    }
}
