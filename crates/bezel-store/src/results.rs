use crate::error::{Result, StoreError};
use bezel_core::ListingRecord;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// The flat JSON result artifact.
#[derive(Debug, Clone)]
pub struct ResultsStore {
    path: PathBuf,
}

impl ResultsStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the artifact file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the full record sequence, overwriting any prior artifact.
    pub fn save(&self, records: &[ListingRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, contents)?;
        tracing::info!(
            count = records.len(),
            path = %self.path.display(),
            "result artifact written"
        );
        Ok(())
    }

    /// Load the persisted records. A missing artifact reads as empty, so
    /// maintenance operations work on a fresh install.
    pub fn load(&self) -> Result<Vec<ListingRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Delete the record whose URL exactly matches `url` after
    /// percent-decoding. Returns whether a record was removed.
    pub fn delete_by_url(&self, url: &str) -> Result<bool> {
        let decoded = urlencoding::decode(url)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| url.to_string());

        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.url != decoded);

        if records.len() == before {
            tracing::debug!(url = %decoded, "delete requested for unknown URL");
            return Ok(false);
        }

        self.save(&records)?;
        Ok(true)
    }

    /// Replace the whole artifact with an uploaded JSON value. Rejected
    /// unless the value is an array.
    pub fn replace_all(&self, value: &Value) -> Result<usize> {
        if !value.is_array() {
            return Err(StoreError::NotAnArray);
        }
        let records: Vec<ListingRecord> = serde_json::from_value(value.clone())?;
        self.save(&records)?;
        Ok(records.len())
    }
}
