//! Key-value store trait and in-memory implementation.
#![allow(clippy::future_not_send)]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

/// Asynchronous string key-value store.
///
/// Each operation is independently atomic at single-key granularity;
/// there is no cross-key transaction. Callers must tolerate a token
/// persisted without its companion profile.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[trait_variant::make(KeyValueStore: Send)]
pub trait LocalKeyValueStore {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage read fails.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage write fails.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage write fails.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory key-value store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    /// Stored entries.
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(String::from(key), String::from(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
