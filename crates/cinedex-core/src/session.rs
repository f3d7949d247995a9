//! Session lifecycle: bootstrap, sign-in/out, and profile loading.

use cinedex_api::ApiError;
use cinedex_api::backend::{BackendClient, UserProfile};
use cinedex_store::kv::KeyValueStore;
use cinedex_store::session::SessionStore;
use tracing::instrument;

/// Authentication state as seen at bootstrap.
///
/// Bootstrap trusts local persistence: a stored token means
/// `Authenticated` without any network validation. A stale token is
/// discovered (and recovered or cleared) by the first real request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// A token is present locally.
    Authenticated,
    /// No token is stored.
    Unauthenticated,
}

/// Orchestrates authentication flows against the user backend.
///
/// Owns the backend client and a handle to the same session store the
/// client refreshes through, so tokens written by either path are
/// observed by both.
#[derive(Debug)]
pub struct SessionManager<K> {
    /// Backend client, refreshing through the shared store.
    backend: BackendClient<SessionStore<K>>,
    /// Session persistence handle.
    store: SessionStore<K>,
}

impl<K: KeyValueStore + Clone + Sync + Send> SessionManager<K> {
    /// Creates a manager over a backend client and its session store.
    ///
    /// `store` must share state with the store inside `backend`, or
    /// refreshed tokens will not be visible here.
    pub const fn new(backend: BackendClient<SessionStore<K>>, store: SessionStore<K>) -> Self {
        Self { backend, store }
    }

    /// Determines the startup state from local persistence alone.
    #[instrument(skip_all)]
    pub async fn bootstrap(&self) -> AppState {
        if self.store.token().await.is_some() {
            tracing::debug!("stored token found, starting authenticated");
            AppState::Authenticated
        } else {
            tracing::debug!("no stored token, starting unauthenticated");
            AppState::Unauthenticated
        }
    }

    /// Signs in and persists the returned credentials.
    ///
    /// The profile is cached only when the backend includes it in the
    /// login response; otherwise it is fetched lazily by
    /// [`load_profile`](Self::load_profile).
    ///
    /// # Errors
    ///
    /// Propagates the backend failure; local state is untouched on error.
    #[instrument(skip_all)]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, ApiError> {
        let auth = self.backend.login(email, password).await?;
        self.store.set_token(&auth.access_token).await;
        if let Some(profile) = &auth.user {
            self.store.set_profile(profile).await;
        }
        tracing::info!("signed in");
        Ok(auth.user)
    }

    /// Creates an account and persists the returned token.
    ///
    /// # Errors
    ///
    /// Propagates the backend failure (`Conflict` for an already-taken
    /// email); local state is untouched on error.
    #[instrument(skip_all)]
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let auth = self.backend.register(full_name, email, password).await?;
        self.store.set_token(&auth.access_token).await;
        tracing::info!("account created");
        Ok(())
    }

    /// Signs out by clearing all persisted session state.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) {
        self.store.clear().await;
        tracing::info!("signed out");
    }

    /// Returns the user profile, from cache when possible.
    ///
    /// A cache miss fetches from the backend and caches the result.
    /// `Ok(None)` means the backend has no record for this user.
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when the credential is invalid and refresh
    /// could not recover, or `Network`/`Decode`/`Status` for other
    /// backend failures.
    #[instrument(skip_all)]
    pub async fn load_profile(&self) -> Result<Option<UserProfile>, ApiError> {
        if let Some(cached) = self.store.profile().await {
            tracing::debug!("serving cached profile");
            return Ok(Some(cached));
        }

        match self.backend.current_user().await {
            Ok(profile) => {
                self.store.set_profile(&profile).await;
                Ok(Some(profile))
            }
            Err(ApiError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
