//! Filesystem-based key-value backend.
//!
//! Stores each key as its own JSON file (`<key>.json`) under a base
//! directory. Used for both durable storage and session storage.
//!
//! # Security
//!
//! - **Path traversal**: keys are validated before they become file names
//! - **File size limits**: oversized files are refused instead of read
//!
//! Writes go to a temporary sibling file that is then renamed over the
//! target, so a crash mid-write leaves the previous value intact.

use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum file size for a stored value (8MB).
const MAX_FILE_SIZE: u64 = 8 * 1024 * 1024;

/// Extension of stored values.
const VALUE_EXTENSION: &str = "json";

/// Filesystem-based key-value backend.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    /// Base directory for storage.
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Creates a new filesystem store.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a new filesystem store with checked directory creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: format!("{}: {e}", base_path.display()),
        })?;

        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file path for a key.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_safe_key(key) {
            return Err(Error::InvalidInput(format!(
                "Storage key contains invalid characters: {key}"
            )));
        }

        Ok(self.base_path.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Checks if a key is safe to use as a file name.
    ///
    /// Only alphanumeric characters, dashes, and underscores are allowed.
    fn is_safe_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 200
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl KeyValueStore for FilesystemStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;

        if !path.exists() {
            return Ok(None);
        }

        let metadata = fs::metadata(&path).map_err(|e| Error::OperationFailed {
            operation: "read_file_metadata".to_string(),
            cause: e.to_string(),
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::InvalidInput(format!(
                "Stored value exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
                path.display()
            )));
        }

        let value = fs::read_to_string(&path).map_err(|e| Error::OperationFailed {
            operation: "read_value_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        fs::create_dir_all(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: format!("{}: {e}", self.base_path.display()),
        })?;

        let tmp_path = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));
        fs::write(&tmp_path, value).map_err(|e| Error::OperationFailed {
            operation: "write_value_file".to_string(),
            cause: format!("{}: {e}", tmp_path.display()),
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| Error::OperationFailed {
            operation: "replace_value_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        tracing::trace!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = self.key_path(key)?;

        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).map_err(|e| Error::OperationFailed {
            operation: "delete_value_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Ok(true)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        if !self.base_path.exists() {
            return Ok(keys);
        }

        let entries = fs::read_dir(&self.base_path).map_err(|e| Error::OperationFailed {
            operation: "read_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::OperationFailed {
                operation: "read_dir_entry".to_string(),
                cause: e.to_string(),
            })?;

            if let Some(key) = extract_key_from_path(&entry.path()) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Extracts a key from a value file path.
fn extract_key_from_path(path: &Path) -> Option<String> {
    if path.extension().is_none_or(|ext| ext != VALUE_EXTENSION) {
        return None;
    }

    let key = path.file_stem()?.to_str()?;
    FilesystemStore::is_safe_key(key).then(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        store.set("quotes", "[]").unwrap();
        assert_eq!(store.get("quotes").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("quotes.json").exists());
    }

    #[test]
    fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        assert!(store.get("selectedCategory").unwrap().is_none());
        assert!(!store.contains("selectedCategory").unwrap());
    }

    #[test]
    fn test_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        store.set("selectedCategory", "\"Wisdom\"").unwrap();
        store.set("selectedCategory", "\"all\"").unwrap();
        assert_eq!(
            store.get("selectedCategory").unwrap().as_deref(),
            Some("\"all\"")
        );
        assert!(!dir.path().join("selectedCategory.json.tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory_on_write() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FilesystemStore::new(&nested);

        store.set("lastQuote", "{}").unwrap();
        assert!(nested.join("lastQuote.json").exists());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        assert!(matches!(
            store.set("../escape", "x"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(store.get("a/b"), Err(Error::InvalidInput(_))));
        assert!(matches!(store.set("", "x"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        let file = fs::File::create(dir.path().join("quotes.json")).unwrap();
        file.set_len(MAX_FILE_SIZE + 1).unwrap();

        assert!(matches!(store.get("quotes"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_keys_remove_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(dir.path());

        store.set("quotes", "[]").unwrap();
        store.set("lastQuote", "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["lastQuote", "quotes"]);

        assert!(store.remove("quotes").unwrap());
        assert!(!store.remove("quotes").unwrap());

        assert_eq!(store.clear().unwrap(), 1);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_with_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data");
        let store = FilesystemStore::with_create(&path).unwrap();
        assert!(path.is_dir());
        assert_eq!(store.base_path(), path.as_path());
    }
}
