//! Directory of JSON documents keyed by file stem.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Errors that can occur while persisting or reading documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read or write to the filesystem.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize a document.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage directory could not be created.
    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(String),

    /// No document exists under the requested key.
    #[error("Document not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A directory of `{key}.json` documents.
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_path: PathBuf,
}

impl JsonStore {
    /// Creates a store rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the directory this store writes into.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Ensures the storage directory exists.
    async fn ensure_directory(&self) -> StorageResult<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).await.map_err(|e| {
                StorageError::DirectoryCreationFailed(format!(
                    "Failed to create directory {:?}: {}",
                    self.base_path, e
                ))
            })?;
        }
        Ok(())
    }

    /// Returns the path of the JSON document stored under `key`.
    pub fn document_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    /// Serializes `value` to `{key}.json`.
    ///
    /// # Returns
    ///
    /// The path the document was written to.
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_file(&format!("{}.json", key), &json).await
    }

    /// Writes a free-form text file next to the JSON documents.
    ///
    /// # Arguments
    ///
    /// * `file_name` - File name relative to the store directory
    /// * `contents` - Text to write
    pub async fn write_file(&self, file_name: &str, contents: &str) -> StorageResult<PathBuf> {
        self.ensure_directory().await?;

        let path = self.base_path.join(file_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;

        Ok(path)
    }

    /// Loads and deserializes the document stored under `key`.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<T> {
        let path = self.document_path(key);

        if !path.exists() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let mut file = fs::File::open(&path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        Ok(serde_json::from_str(&contents)?)
    }

    /// Lists the keys of every stored document, sorted.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }

    /// Checks whether a document exists under `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.document_path(key).exists()
    }
}
