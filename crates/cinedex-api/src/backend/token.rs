//! `TokenStore` trait definition.
#![allow(clippy::future_not_send)]

/// Access-token persistence consumed by the backend client.
///
/// The backend client reads the token before every dispatch and writes it
/// back after a successful refresh. Implementations are infallible by
/// contract: storage read failures degrade to `None` (treated as logged
/// out) and write failures are logged and swallowed by the implementor.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[trait_variant::make(TokenStore: Send)]
pub trait LocalTokenStore {
    /// Returns the current access token, if one is stored.
    async fn access_token(&self) -> Option<String>;

    /// Persists a new access token.
    async fn store_token(&self, token: &str);

    /// Removes the stored access token.
    async fn discard_token(&self);
}
