//! Page envelope returned by collection reads.

use serde::{Deserialize, Serialize};

/// Collection-level metadata accompanying a page of results.
///
/// `total_elements` is authoritative for pagination controls even when the
/// current page holds no items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Requested page size.
    pub size: u32,
    /// Total number of records across every page.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u32,
    /// Zero-based index of this page.
    pub number: u32,
}

/// A window over a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    metadata: PageMetadata,
}

impl<T> Page<T> {
    /// Build a page from its items and metadata.
    #[must_use]
    pub const fn new(items: Vec<T>, metadata: PageMetadata) -> Self {
        Self { items, metadata }
    }

    /// Empty page with zero totals, shown before the first response.
    ///
    /// ```
    /// use pagination::Page;
    ///
    /// let page: Page<String> = Page::placeholder(10);
    /// assert!(page.items().is_empty());
    /// assert_eq!(page.metadata().total_elements, 0);
    /// assert!(!page.has_next_page());
    /// ```
    #[must_use]
    pub const fn placeholder(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            metadata: PageMetadata {
                size: page_size,
                total_elements: 0,
                total_pages: 0,
                number: 0,
            },
        }
    }

    /// Records on this page in server order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page, returning its records.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Collection-level metadata.
    #[must_use]
    pub const fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.metadata.number.saturating_add(1) < self.metadata.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.metadata.number > 0
    }

    /// Map every record, keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            metadata: self.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Pagination control derivation.
    use super::*;
    use rstest::rstest;

    fn page(number: u32, total_pages: u32, total_elements: u64) -> Page<u8> {
        Page::new(
            Vec::new(),
            PageMetadata {
                size: 10,
                total_elements,
                total_pages,
                number,
            },
        )
    }

    #[rstest]
    #[case(0, 3, true, false)]
    #[case(1, 3, true, true)]
    #[case(2, 3, false, true)]
    #[case(1, 0, false, true)]
    fn derives_navigation_from_metadata(
        #[case] number: u32,
        #[case] total_pages: u32,
        #[case] has_next: bool,
        #[case] has_previous: bool,
    ) {
        let page = page(number, total_pages, 25);
        assert_eq!(page.has_next_page(), has_next);
        assert_eq!(page.has_previous_page(), has_previous);
    }

    #[test]
    fn metadata_uses_the_wire_field_names() {
        let metadata: PageMetadata = serde_json::from_str(
            r#"{ "size": 10, "totalElements": 21, "totalPages": 3, "number": 2 }"#,
        )
        .expect("metadata");
        assert_eq!(metadata.total_elements, 21);
        assert_eq!(metadata.total_pages, 3);

        let page = Page::new(vec![7_u8], metadata);
        let json = serde_json::to_value(&page).expect("serialise page");
        assert_eq!(json["items"], serde_json::json!([7]));
        assert_eq!(json["metadata"]["totalElements"], 21);
    }

    #[test]
    fn empty_page_still_reports_collection_totals() {
        let page = page(2, 3, 20);
        assert!(page.items().is_empty());
        assert_eq!(page.metadata().total_elements, 20);
        assert!(page.has_previous_page());
    }
}
