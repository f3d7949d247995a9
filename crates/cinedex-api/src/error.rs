//! Shared error taxonomy for all API clients.

/// Errors returned by the catalog, backend, and document-store clients.
///
/// `AuthExpired` is only surfaced after the backend client has already
/// attempted (and failed, or exhausted) its single refresh; callers never
/// observe a refresh-specific error. Timeouts are not distinguished from
/// other transport failures and map to `Network`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport failure: unreachable host, connection reset, or timeout.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected the credentials and refresh could not recover.
    #[error("authentication expired")]
    AuthExpired,

    /// A required credential or endpoint is missing from the configuration.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// No matching record or resource.
    #[error("not found")]
    NotFound,

    /// The store rejected a write as a duplicate.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success HTTP status.
    #[error("server error (HTTP {status}): {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body when unparseable.
        message: String,
    },

    /// The response body could not be decoded as the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns `true` for errors that repositories degrade to a safe
    /// default on (missing configuration or missing records).
    #[must_use]
    pub const fn is_degradable(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::NotFound)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_display_messages() {
        // Arrange & Act & Assert
        assert_eq!(ApiError::AuthExpired.to_string(), "authentication expired");
        assert_eq!(
            ApiError::NotConfigured("docstore").to_string(),
            "docstore is not configured"
        );
        assert_eq!(
            ApiError::Status {
                status: 500,
                message: String::from("boom"),
            }
            .to_string(),
            "server error (HTTP 500): boom"
        );
    }

    #[test]
    fn test_is_degradable() {
        // Arrange & Act & Assert
        assert!(ApiError::NotConfigured("docstore").is_degradable());
        assert!(ApiError::NotFound.is_degradable());
        assert!(!ApiError::AuthExpired.is_degradable());
    }
}
