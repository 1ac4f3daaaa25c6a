//! Immutable query descriptor built from table interaction state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PaginationError, Signature, SortOrder};

/// Query parameter carrying the zero-based page index.
pub const PAGE_PARAM: &str = "page";
/// Query parameter carrying the page size.
pub const SIZE_PARAM: &str = "size";
/// Query parameter carrying one `field,direction` sort pair.
pub const SORT_PARAM: &str = "sort";
/// Query parameter carrying the free-text filter.
pub const GLOBAL_FILTER_PARAM: &str = "globalFilter";

const RESERVED_PARAMS: [&str; 4] = [PAGE_PARAM, SIZE_PARAM, SORT_PARAM, GLOBAL_FILTER_PARAM];

/// Filter, sort, and paging state for one read of a collection.
///
/// ## Invariants
/// - `page_size` is at least one.
/// - Filters are keyed by field name in a [`BTreeMap`], so insertion order
///   never affects the canonical form.
/// - Blank filter values and a blank global filter are inactive and absent.
/// - Sort pairs keep insertion order; re-adding a field keeps its original
///   position and takes the new direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    page_index: u32,
    page_size: u32,
    sort: Vec<SortOrder>,
    filters: BTreeMap<String, String>,
    global_filter: Option<String>,
}

impl QueryDescriptor {
    /// Start a descriptor with no filters or sorting.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `page_size` is zero.
    pub const fn new(page_index: u32, page_size: u32) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self {
            page_index,
            page_size,
            sort: Vec::new(),
            filters: BTreeMap::new(),
            global_filter: None,
        })
    }

    /// Add or replace a column filter.
    ///
    /// # Errors
    ///
    /// Returns an error when the field is blank or names a reserved
    /// parameter (`page`, `size`, `sort`, `globalFilter`).
    pub fn with_filter(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, PaginationError> {
        let field_name = normalise_filter_field(field.into())?;
        let filter_value = value.into();
        if filter_value.trim().is_empty() {
            self.filters.remove(&field_name);
        } else {
            self.filters.insert(field_name, filter_value);
        }
        Ok(self)
    }

    /// Add several column filters in iteration order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Self::with_filter`].
    pub fn with_filters<I, K, V>(self, filters: I) -> Result<Self, PaginationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        filters
            .into_iter()
            .try_fold(self, |descriptor, (field, value)| {
                descriptor.with_filter(field, value)
            })
    }

    /// Set the free-text filter; blank text clears it.
    #[must_use]
    pub fn with_global_filter(mut self, global_filter: Option<impl Into<String>>) -> Self {
        self.global_filter = global_filter
            .map(Into::into)
            .filter(|text: &String| !text.trim().is_empty());
        self
    }

    /// Append a sort pair.
    #[must_use]
    pub fn with_sort(mut self, order: SortOrder) -> Self {
        if let Some(existing) = self
            .sort
            .iter_mut()
            .find(|current| current.field() == order.field())
        {
            *existing = order;
        } else {
            self.sort.push(order);
        }
        self
    }

    /// Append several sort pairs in order.
    #[must_use]
    pub fn with_sorts(self, orders: impl IntoIterator<Item = SortOrder>) -> Self {
        orders.into_iter().fold(self, Self::with_sort)
    }

    /// Drop every sort pair.
    #[must_use]
    pub fn without_sort(mut self) -> Self {
        self.sort.clear();
        self
    }

    /// Move to another page, keeping filters and sorting.
    #[must_use]
    pub fn with_page_index(mut self, page_index: u32) -> Self {
        self.page_index = page_index;
        self
    }

    /// Change the page size, keeping the page index.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::ZeroPageSize`] when `page_size` is zero.
    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn page_index(&self) -> u32 {
        self.page_index
    }

    /// Number of records per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sort pairs in significance order.
    #[must_use]
    pub fn sort(&self) -> &[SortOrder] {
        &self.sort
    }

    /// Active column filters ordered by field name.
    #[must_use]
    pub const fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// Active free-text filter, if any.
    #[must_use]
    pub fn global_filter(&self) -> Option<&str> {
        self.global_filter.as_deref()
    }

    /// Query parameters in canonical order.
    ///
    /// The order is `page`, `size`, filters sorted by field, `globalFilter`,
    /// then one `sort` entry per pair.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(3 + self.filters.len() + self.sort.len());
        pairs.push((PAGE_PARAM.to_owned(), self.page_index.to_string()));
        pairs.push((SIZE_PARAM.to_owned(), self.page_size.to_string()));
        pairs.extend(
            self.filters
                .iter()
                .map(|(field, value)| (field.clone(), value.clone())),
        );
        if let Some(global) = &self.global_filter {
            pairs.push((GLOBAL_FILTER_PARAM.to_owned(), global.clone()));
        }
        pairs.extend(
            self.sort
                .iter()
                .map(|order| (SORT_PARAM.to_owned(), order.to_string())),
        );
        pairs
    }

    /// Canonical signature of this descriptor for `collection`.
    ///
    /// ```
    /// use pagination::QueryDescriptor;
    ///
    /// let signature = QueryDescriptor::new(0, 25)
    ///     .and_then(|d| d.with_filter("email", "ada"))
    ///     .expect("valid descriptor")
    ///     .signature("users");
    /// assert_eq!(signature.to_string(), "users?page=0&size=25&email=ada");
    /// ```
    #[must_use]
    pub fn signature(&self, collection: &str) -> Signature {
        Signature::from_descriptor(collection, self)
    }
}

fn normalise_filter_field(field: String) -> Result<String, PaginationError> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(PaginationError::EmptyFilterField);
    }
    if RESERVED_PARAMS.contains(&trimmed) {
        return Err(PaginationError::ReservedFilterField {
            field: trimmed.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}
