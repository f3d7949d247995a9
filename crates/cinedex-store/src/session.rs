//! Typed session persistence: access token and cached user profile.

use cinedex_api::backend::{TokenStore, UserProfile};

use crate::kv::KeyValueStore;

/// Storage key for the access token.
const TOKEN_KEY: &str = "accessToken";

/// Storage key for the serialized user profile.
const PROFILE_KEY: &str = "userData";

/// Session facade over a key-value store.
///
/// Failure policy: reads degrade to `None` (a corrupted or unreadable
/// store is treated as logged out), writes are logged and swallowed.
/// Worst case the device re-prompts login on the next launch. Token and
/// profile are separate keys with no cross-key transaction; a token
/// without a cached profile is valid and the profile is re-fetched
/// lazily.
#[derive(Debug, Clone)]
pub struct SessionStore<K> {
    /// Underlying key-value store.
    kv: K,
}

impl<K: KeyValueStore + Sync> SessionStore<K> {
    /// Wraps a key-value store.
    pub const fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Returns the stored access token, if any.
    pub async fn token(&self) -> Option<String> {
        match self.kv.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read access token, treating as absent");
                None
            }
        }
    }

    /// Persists the access token.
    pub async fn set_token(&self, token: &str) {
        if let Err(err) = self.kv.set(TOKEN_KEY, token).await {
            tracing::warn!(error = %err, "failed to persist access token");
        }
    }

    /// Removes the access token.
    pub async fn clear_token(&self) {
        if let Err(err) = self.kv.remove(TOKEN_KEY).await {
            tracing::warn!(error = %err, "failed to clear access token");
        }
    }

    /// Returns the cached user profile, if present and decodable.
    pub async fn profile(&self) -> Option<UserProfile> {
        let raw = match self.kv.get(PROFILE_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read cached profile");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::warn!(error = %err, "cached profile is corrupted, ignoring");
                None
            }
        }
    }

    /// Caches the user profile.
    pub async fn set_profile(&self, profile: &UserProfile) {
        let raw = match serde_json::to_string(profile) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize profile");
                return;
            }
        };
        if let Err(err) = self.kv.set(PROFILE_KEY, &raw).await {
            tracing::warn!(error = %err, "failed to cache profile");
        }
    }

    /// Removes the cached user profile.
    pub async fn clear_profile(&self) {
        if let Err(err) = self.kv.remove(PROFILE_KEY).await {
            tracing::warn!(error = %err, "failed to clear cached profile");
        }
    }

    /// Clears both token and profile (logout).
    pub async fn clear(&self) {
        self.clear_token().await;
        self.clear_profile().await;
    }
}

impl<K: KeyValueStore + Sync + Send> TokenStore for SessionStore<K> {
    async fn access_token(&self) -> Option<String> {
        self.token().await
    }

    async fn store_token(&self, token: &str) {
        self.set_token(token).await;
    }

    async fn discard_token(&self) {
        self.clear_token().await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use anyhow::{Result, anyhow};

    use crate::kv::MemoryKv;

    use super::*;

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: String::from("u1"),
            full_name: String::from("Ada Lovelace"),
            email: String::from("ada@example.com"),
            profile_image: None,
        }
    }

    /// Store whose every operation fails.
    #[derive(Debug)]
    struct BrokenKv;

    impl KeyValueStore for BrokenKv {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("storage unavailable"))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("storage unavailable"))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow!("storage unavailable"))
        }
    }

    #[tokio::test]
    async fn test_token_round_trip() {
        // Arrange
        let store = SessionStore::new(MemoryKv::new());

        // Act
        store.set_token("tok-1").await;

        // Assert
        assert_eq!(store.token().await.as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_profile_round_trip() {
        // Arrange
        let store = SessionStore::new(MemoryKv::new());

        // Act
        store.set_profile(&sample_profile()).await;
        let loaded = store.profile().await.unwrap();

        // Assert
        assert_eq!(loaded, sample_profile());
    }

    #[tokio::test]
    async fn test_corrupted_profile_reads_as_none() {
        // Arrange
        let kv = MemoryKv::new();
        kv.set(PROFILE_KEY, "{not valid json").await.unwrap();
        let store = SessionStore::new(kv);

        // Act & Assert
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn test_token_without_profile_is_tolerated() {
        // Arrange
        let store = SessionStore::new(MemoryKv::new());

        // Act
        store.set_token("tok-1").await;

        // Assert
        assert!(store.token().await.is_some());
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_token_and_profile() {
        // Arrange
        let store = SessionStore::new(MemoryKv::new());
        store.set_token("tok-1").await;
        store.set_profile(&sample_profile()).await;

        // Act
        store.clear().await;

        // Assert
        assert!(store.token().await.is_none());
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_degrades_to_absent() {
        // Arrange
        let store = SessionStore::new(BrokenKv);

        // Act & Assert
        assert!(store.token().await.is_none());
        assert!(store.profile().await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed() {
        // Arrange
        let store = SessionStore::new(BrokenKv);

        // Act & Assert (no panic, no propagation)
        store.set_token("tok-1").await;
        store.set_profile(&sample_profile()).await;
        store.clear().await;
    }

    #[tokio::test]
    async fn test_token_store_trait_delegates() {
        // Arrange
        let store = SessionStore::new(MemoryKv::new());

        // Act
        TokenStore::store_token(&store, "tok-2").await;

        // Assert
        assert_eq!(
            TokenStore::access_token(&store).await.as_deref(),
            Some("tok-2")
        );
        TokenStore::discard_token(&store).await;
        assert!(TokenStore::access_token(&store).await.is_none());
    }
}
