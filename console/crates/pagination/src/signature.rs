//! Canonical request signatures used as cache keys.

use std::fmt;

use url::form_urlencoded::byte_serialize;

use crate::{PaginationError, QueryDescriptor, SortOrder};

/// Canonical, order-stable encoding of a collection read.
///
/// The query half is the exact `application/x-www-form-urlencoded` string
/// sent to the read endpoint, except that the comma inside a sort pair is
/// kept literal. Two descriptors with the same logical content always
/// produce equal signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    collection: String,
    query: String,
}

impl Signature {
    pub(crate) fn from_descriptor(collection: &str, descriptor: &QueryDescriptor) -> Self {
        let query = descriptor
            .query_pairs()
            .into_iter()
            .map(|(key, value)| {
                if key == crate::SORT_PARAM {
                    format!("{}={}", encode(&key), encode_sort(&value))
                } else {
                    format!("{}={}", encode(&key), encode(&value))
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        Self {
            collection: collection.to_owned(),
            query,
        }
    }

    /// Collection the read targets.
    #[must_use]
    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    /// Encoded query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    /// Whether this signature falls under an invalidation prefix.
    ///
    /// A bare collection name matches every read of that collection. Longer
    /// prefixes match whole query parameters only, so `users?page=1` does not
    /// match `users?page=10`.
    ///
    /// ```
    /// use pagination::QueryDescriptor;
    ///
    /// let signature = QueryDescriptor::new(0, 10).expect("valid").signature("users");
    /// assert!(signature.matches_prefix("users"));
    /// assert!(signature.matches_prefix("users?page=0"));
    /// assert!(!signature.matches_prefix("users?page=0&size=1"));
    /// assert!(!signature.matches_prefix("teams"));
    /// ```
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        if prefix == self.collection {
            return true;
        }
        let full = self.to_string();
        full.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with('&') || prefix.ends_with(['?', '&'])
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.collection, self.query)
    }
}

/// Build a signature directly from interaction state.
///
/// Filters may arrive in any order; sort pairs are kept as given.
///
/// # Errors
///
/// Returns an error when the collection name is blank or contains `?`, when
/// `page_size` is zero, or when a filter field is blank or reserved.
///
/// ```
/// use pagination::{SortOrder, build_signature};
///
/// let a = build_signature("users", [("email", "x"), ("fullName", "y")], None, &[], 0, 10)
///     .expect("valid");
/// let b = build_signature("users", [("fullName", "y"), ("email", "x")], None, &[], 0, 10)
///     .expect("valid");
/// assert_eq!(a, b);
/// ```
pub fn build_signature<I, K, V>(
    collection: &str,
    filters: I,
    global_filter: Option<&str>,
    sort: &[SortOrder],
    page_index: u32,
    page_size: u32,
) -> Result<Signature, PaginationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    if collection.trim().is_empty() || collection.contains('?') {
        return Err(PaginationError::InvalidCollection {
            value: collection.to_owned(),
        });
    }
    let descriptor = QueryDescriptor::new(page_index, page_size)?
        .with_filters(filters)?
        .with_global_filter(global_filter)
        .with_sorts(sort.iter().cloned());
    Ok(descriptor.signature(collection))
}

fn encode(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}

fn encode_sort(raw: &str) -> String {
    match raw.rsplit_once(',') {
        Some((field, direction)) => format!("{},{}", encode(field), encode(direction)),
        None => encode(raw),
    }
}
