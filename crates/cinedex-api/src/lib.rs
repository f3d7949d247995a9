//! API client library for cinedex.
//!
//! Provides clients for the movie catalog API, the user backend
//! (login/refresh), and the hosted document store.

/// User backend client with transparent token refresh.
pub mod backend;

/// Movie catalog API client.
pub mod catalog;

/// Document-store REST client.
pub mod docstore;

mod error;

pub use error::ApiError;
