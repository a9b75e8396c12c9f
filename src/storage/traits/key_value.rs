//! Key-value storage trait.

use crate::Result;

/// A string-keyed store of string values.
///
/// Stands in for both the durable store (quotes, selected category) and the
/// session store (last viewed quote). Methods take `&self` so one backend
/// can be shared behind an `Arc` by every component that writes to it.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Returns true if it existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Lists all keys.
    fn keys(&self) -> Result<Vec<String>>;

    /// Checks if a key exists.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Removes every key. Returns the number removed.
    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for key in self.keys()? {
            if self.remove(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
