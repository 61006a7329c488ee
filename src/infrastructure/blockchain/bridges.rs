//! # Bridge Registry
//!
//! Loader for the bridge registry feed.
//!
//! The feed is a JSON array of [`BridgeRecord`]s. It is read once at
//! startup; the resulting [`BridgeRegistry`] is immutable and keeps the
//! feed's iteration order, which is the tie-break when several records
//! share a (home chain, home proxy) pair.

use crate::config::RegistryConfig;
use crate::domain::entities::BridgeRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Bridge registry loading error.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Feed file could not be read.
    #[error("failed to read bridge registry {path}: {source}")]
    Io {
        /// Path of the feed file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Feed content is not a valid record list.
    #[error("failed to parse bridge registry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Read-only set of bridge records in feed order.
#[derive(Debug, Clone, Default)]
pub struct BridgeRegistry {
    records: Vec<BridgeRecord>,
}

impl BridgeRegistry {
    /// Creates a registry from records, keeping their order.
    #[must_use]
    pub fn from_records(records: Vec<BridgeRecord>) -> Self {
        Self { records }
    }

    /// Parses a registry from the feed's JSON text.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Parse` if the text is not a record array.
    pub fn from_json_str(json: &str) -> RegistryResult<Self> {
        let records: Vec<BridgeRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Reads and parses a feed file.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the file cannot be read and
    /// `RegistryError::Parse` if it is malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            records = registry.len(),
            "Loaded bridge registry"
        );
        Ok(registry)
    }

    /// Loads the registry named by the configuration.
    ///
    /// Without a configured path the registry is empty and lookups fall back
    /// to the chain registry's known addresses.
    ///
    /// # Errors
    ///
    /// Same as [`BridgeRegistry::from_json_file`].
    pub fn load(config: &RegistryConfig) -> RegistryResult<Self> {
        match &config.bridges_path {
            Some(path) => Self::from_json_file(path),
            None => {
                info!("No bridge registry configured, starting empty");
                Ok(Self::default())
            }
        }
    }

    /// Returns the records in feed order.
    pub fn iter(&self) -> impl Iterator<Item = &BridgeRecord> {
        self.records.iter()
    }

    /// Returns the records as a slice.
    #[must_use]
    pub fn records(&self) -> &[BridgeRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the registry holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
