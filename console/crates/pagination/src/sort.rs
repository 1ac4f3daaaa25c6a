//! Sort pairs sent to the read endpoint as `sort=field,direction`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PaginationError;

/// Direction applied to one sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Wire representation of the direction.
    ///
    /// ```
    /// use pagination::SortDirection;
    ///
    /// assert_eq!(SortDirection::Desc.as_str(), "desc");
    /// ```
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(PaginationError::InvalidSortDirection {
                value: s.to_owned(),
            }),
        }
    }
}

/// One `(field, direction)` pair.
///
/// Sort pairs are order significant: the server breaks ties using later
/// pairs, so a descriptor keeps them in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SortOrder {
    field: String,
    direction: SortDirection,
}

impl SortOrder {
    /// Build a sort pair.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::EmptySortField`] when `field` is blank.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Result<Self, PaginationError> {
        let raw = field.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PaginationError::EmptySortField);
        }
        Ok(Self {
            field: trimmed.to_owned(),
            direction,
        })
    }

    /// Ascending sort on `field`.
    ///
    /// # Panics
    ///
    /// Panics when `field` is blank. Intended for literal field names.
    #[must_use]
    pub fn asc(field: &str) -> Self {
        Self::literal(field, SortDirection::Asc)
    }

    /// Descending sort on `field`.
    ///
    /// # Panics
    ///
    /// Panics when `field` is blank. Intended for literal field names.
    #[must_use]
    pub fn desc(field: &str) -> Self {
        Self::literal(field, SortDirection::Desc)
    }

    fn literal(field: &str, direction: SortDirection) -> Self {
        match Self::new(field, direction) {
            Ok(value) => value,
            Err(err) => panic!("sort field literals must satisfy validation: {err}"),
        }
    }

    /// Field being sorted.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Direction of the sort.
    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction)
    }
}

impl FromStr for SortOrder {
    type Err = PaginationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.split_once(',').ok_or_else(|| PaginationError::InvalidSort {
            value: s.to_owned(),
        })?;
        Self::new(field, direction.parse()?)
    }
}
