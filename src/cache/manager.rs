//! Cache file for persisting fetched data to disk
//!
//! Provides a `CacheFile` that stores a single serializable document as JSON
//! at a fixed path. The whole document is rewritten on every save.

use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default cache file name, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "Cache.json";

/// Reads and writes a JSON document at a single path
///
/// A missing file is created empty on load. A file that exists but does not
/// parse (empty, `null`, or malformed JSON) is treated as an empty document
/// instead of an error, so a corrupt cache never blocks startup.
#[derive(Debug, Clone)]
pub struct CacheFile {
    /// Location of the cache file
    path: PathBuf,
}

impl CacheFile {
    /// Creates a CacheFile at `Cache.json` in the current working directory
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(DEFAULT_CACHE_FILE))
    }

    /// Creates a CacheFile at a custom path
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the document from disk
    ///
    /// # Returns
    /// * `Ok(T::default())` if the file was missing (an empty file is created)
    ///   or its contents could not be parsed
    /// * `Ok(T)` with the parsed document otherwise
    /// * `Err` if reading or creating the file fails
    pub async fn load<T: DeserializeOwned + Default>(&self) -> io::Result<T> {
        if !fs::try_exists(&self.path).await? {
            debug!("Cache file {} missing, creating it", self.path.display());
            fs::File::create(&self.path).await?;
            return Ok(T::default());
        }

        let content = fs::read_to_string(&self.path).await?;

        match serde_json::from_str::<Option<T>>(&content) {
            Ok(Some(document)) => Ok(document),
            Ok(None) => Ok(T::default()),
            Err(e) => {
                warn!(
                    "Cache file {} is corrupt, starting empty: {}",
                    self.path.display(),
                    e
                );
                Ok(T::default())
            }
        }
    }

    /// Serializes the document and overwrites the cache file
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if serialization or file writing fails
    pub async fn save<T: Serialize>(&self, document: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        fs::write(&self.path, json).await
    }
}

impl Default for CacheFile {
    fn default() -> Self {
        Self::new()
    }
}
