//! Console configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_COLLECTION: &str = "users";

/// Errors raised while validating [`ConsoleSettings`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No base URL was configured for the remote collection.
    #[error("CONSOLE_BASE_URL must be set unless the in-memory collection is used")]
    MissingBaseUrl,
    /// The base URL could not be parsed or cannot carry a path.
    #[error("invalid base url {value}: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        value: String,
        /// Why it was refused.
        reason: String,
    },
    /// The collection name was blank or contained a query separator.
    #[error("collection name must be non-blank and must not contain '?' or '/'")]
    InvalidCollection,
    /// The page size was zero.
    #[error("page size must be greater than zero")]
    ZeroPageSize,
    /// The request timeout was zero.
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Configuration values for the record console.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CONSOLE")]
pub struct ConsoleSettings {
    /// Base URL of the collection service, e.g. `http://localhost:8080/api`.
    pub base_url: Option<String>,
    /// Collection path segment and cache prefix.
    pub collection: Option<String>,
    /// Rows per page.
    #[ortho_config(default = 10)]
    pub page_size: u32,
    /// Transport timeout for each HTTP call, in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

impl ConsoleSettings {
    /// Parsed base URL of the collection service.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingBaseUrl`] when unset and
    /// [`SettingsError::InvalidBaseUrl`] when unparsable or not hierarchical.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SettingsError::MissingBaseUrl)?;
        let url = Url::parse(raw).map_err(|error| SettingsError::InvalidBaseUrl {
            value: raw.to_owned(),
            reason: error.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::InvalidBaseUrl {
                value: raw.to_owned(),
                reason: "url cannot carry a path".to_owned(),
            });
        }
        Ok(url)
    }

    /// Configured collection name, falling back to `users`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidCollection`] for blank names or names
    /// containing `?` or `/`.
    pub fn collection(&self) -> Result<&str, SettingsError> {
        let name = self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION).trim();
        if name.is_empty() || name.contains(['?', '/']) {
            return Err(SettingsError::InvalidCollection);
        }
        Ok(name)
    }

    /// Configured page size.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroPageSize`] when zero.
    pub fn page_size(&self) -> Result<u32, SettingsError> {
        match self.page_size {
            0 => Err(SettingsError::ZeroPageSize),
            size => Ok(size),
        }
    }

    /// Configured transport timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroTimeout`] when zero.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}
