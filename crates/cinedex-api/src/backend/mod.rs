//! User backend client: login, register, profile, and the transparent
//! token-refresh pipeline every identity-bearing request goes through.

mod client;
mod token;
mod types;

pub use client::{BackendClient, BackendClientBuilder};
pub use token::{LocalTokenStore, TokenStore};
pub use types::{AuthResponse, BackendErrorBody, MeResponse, RefreshResponse, UserProfile};
