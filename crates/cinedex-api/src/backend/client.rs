//! `BackendClient` - user backend client with refresh-once recovery.
//!
//! Single choke point for all identity-bearing backend calls. Every
//! dispatch reads the current token from the store, attaches it as a
//! bearer header, and on a 401 performs at most one refresh-and-resubmit
//! before surfacing `AuthExpired`.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use tracing::instrument;
use url::Url;

use crate::error::ApiError;

use super::token::TokenStore;
use super::types::{AuthResponse, BackendErrorBody, MeResponse, RefreshResponse, UserProfile};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body shapes the backend accepts.
///
/// Kept as plain data (not a built `reqwest` body) so a retried request
/// can be rebuilt from scratch with the refreshed credential.
#[derive(Debug, Clone)]
enum Payload {
    /// No body.
    Empty,
    /// JSON body.
    Json(serde_json::Value),
    /// Multipart form fields (register).
    Form(Vec<(&'static str, String)>),
}

/// An outbound call moving through the dispatch loop.
///
/// `retried` is the one-shot recovery flag: a request is resubmitted at
/// most once for credential expiry, no matter how often expiry recurs.
#[derive(Debug)]
struct PendingRequest {
    method: Method,
    path: &'static str,
    payload: Payload,
    retried: bool,
}

impl PendingRequest {
    const fn new(method: Method, path: &'static str, payload: Payload) -> Self {
        Self {
            method,
            path,
            payload,
            retried: false,
        }
    }
}

/// User backend API client.
///
/// The HTTP client carries a cookie jar; the refresh endpoint relies on it
/// for the session-establishing credential and is called without a bearer
/// header. Concurrent requests that each hit a 401 each run their own
/// refresh; refreshes are not coalesced.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BackendClient<S> {
    /// HTTP client (cookie jar enabled).
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Access-token persistence.
    store: S,
}

/// Builder for `BackendClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BackendClientBuilder<S> {
    base_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    store: Option<S>,
}

impl<S> BackendClientBuilder<S> {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            timeout: None,
            store: None,
        }
    }

    /// Sets the backend base URL (required).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the request timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the token store (required).
    #[must_use]
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `base_url` is not set.
    /// - `user_agent` is not set.
    /// - `store` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<BackendClient<S>> {
        let base_url = self.base_url.context("base_url is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;
        let store = self.store.context("store is required")?;

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .cookie_store(true)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(BackendClient {
            http_client,
            base_url,
            store,
        })
    }
}

impl<S> BackendClient<S> {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> BackendClientBuilder<S> {
        BackendClientBuilder::new()
    }
}

impl<S: TokenStore + Sync> BackendClient<S> {
    /// Authenticates with email and password.
    ///
    /// The caller persists the returned token; this client only writes the
    /// store during refresh.
    ///
    /// # Errors
    ///
    /// Returns `Status` for rejected credentials, or `Network`/`Decode`
    /// for transport and body failures.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let payload = Payload::Json(serde_json::json!({
            "email": email,
            "password": password,
        }));
        self.dispatch(PendingRequest::new(Method::POST, "users/login", payload))
            .await
    }

    /// Creates a new account (multipart form, matching the backend's
    /// register contract).
    ///
    /// # Errors
    ///
    /// Returns `Status` for rejected registrations, or `Network`/`Decode`
    /// for transport and body failures.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let payload = Payload::Form(vec![
            ("fullName", String::from(full_name)),
            ("email", String::from(email)),
            ("password", String::from(password)),
        ]);
        self.dispatch(PendingRequest::new(Method::POST, "users/register", payload))
            .await
    }

    /// Fetches the authenticated user's record.
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when the token is invalid and refresh could
    /// not recover, `NotFound` when the backend has no matching user, or
    /// `Network`/`Decode` for transport and body failures.
    #[instrument(skip_all)]
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let me: MeResponse = self
            .dispatch(PendingRequest::new(Method::GET, "users/me", Payload::Empty))
            .await?;
        Ok(me.user)
    }

    /// Runs a request through the expiry-recovery state machine.
    ///
    /// On a 401 with the retry flag clear: refresh, then resubmit exactly
    /// once (rebuilt so the bearer header carries the newly stored token).
    /// A 401 on the resubmitted request propagates as `AuthExpired`
    /// without a second refresh.
    async fn dispatch<T: serde::de::DeserializeOwned>(
        &self,
        mut pending: PendingRequest,
    ) -> Result<T, ApiError> {
        loop {
            let response = self.submit(&pending).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !pending.retried {
                pending.retried = true;
                tracing::debug!(path = pending.path, "received 401, refreshing token");
                self.refresh_token().await?;
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Self::status_error(status, body));
            }

            let body = response.text().await?;
            let parsed = serde_json::from_str(&body)?;
            return Ok(parsed);
        }
    }

    /// Builds and sends one attempt, decorating it with the current token.
    async fn submit(&self, pending: &PendingRequest) -> Result<reqwest::Response, ApiError> {
        let url = self
            .base_url
            .join(pending.path)
            .map_err(|_| ApiError::NotFound)?;

        let mut builder = self.http_client.request(pending.method.clone(), url);

        // Absent token: the request goes out unauthenticated and the
        // server decides whether to reject it.
        if let Some(token) = self.store.access_token().await {
            builder = builder.bearer_auth(token);
        }

        builder = match &pending.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Form(fields) => {
                let mut form = reqwest::multipart::Form::new();
                for (name, value) in fields {
                    form = form.text(*name, value.clone());
                }
                builder.multipart(form)
            }
        };

        tracing::debug!(method = %pending.method, path = pending.path, "backend request");
        Ok(builder.send().await?)
    }

    /// Exchanges the refresh credential (cookie jar) for a new access
    /// token and persists it.
    ///
    /// Any rejection or decode failure clears the stored token and maps to
    /// `AuthExpired`, so the caller observes the original auth failure; a
    /// transport fault on the refresh call itself surfaces as `Network`.
    async fn refresh_token(&self) -> Result<(), ApiError> {
        let url = self
            .base_url
            .join("users/auth/refresh")
            .map_err(|_| ApiError::NotFound)?;

        // No bearer header: the cookie jar carries the session credential.
        let result = self.http_client.post(url).send().await;
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "token refresh transport fault, clearing token");
                self.store.discard_token().await;
                return Err(ApiError::Network(err));
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "token refresh rejected, clearing token");
            self.store.discard_token().await;
            return Err(ApiError::AuthExpired);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<RefreshResponse>(&body) {
            Ok(refreshed) => {
                self.store.store_token(&refreshed.access_token).await;
                tracing::debug!("token refreshed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "token refresh body undecodable, clearing token");
                self.store.discard_token().await;
                Err(ApiError::AuthExpired)
            }
        }
    }

    /// Maps a terminal non-success status to the shared taxonomy.
    fn status_error(status: StatusCode, body: String) -> ApiError {
        let message = serde_json::from_str::<BackendErrorBody>(&body).map_or(body, |e| e.message);
        match status {
            StatusCode::UNAUTHORIZED => ApiError::AuthExpired,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        }
    }
}
