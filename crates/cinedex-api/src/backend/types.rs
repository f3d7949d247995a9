//! User backend request/response types.

use serde::{Deserialize, Serialize};

/// A user record as returned by the backend.
///
/// Cached copies are eventually consistent with the backend and may be
/// absent even while a token is present; callers re-fetch lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user ID.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Account email address.
    pub email: String,
    /// Avatar image URL.
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Response body of `POST users/login` and `POST users/register`.
///
/// `register` omits the user record; only `login` includes it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Freshly issued bearer token.
    pub access_token: String,
    /// User record (login only).
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Response body of `POST users/auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// Freshly issued bearer token.
    pub access_token: String,
}

/// Response body of `GET users/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    /// The authenticated user's record.
    pub user: UserProfile,
}

/// Error body returned by the backend on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendErrorBody {
    /// Human-readable message.
    pub message: String,
}
