// src/shared/storage/key_value_store.rs

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error on key '{key}': {message}")]
    Io { key: String, message: String },

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Durable key-value cache holding one JSON document per key.
///
/// Calls are synchronous: every state mutation writes through before the
/// operation returns.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
