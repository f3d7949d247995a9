//! `CatalogApi` trait definition.
#![allow(clippy::future_not_send)]

use crate::error::ApiError;

use super::types::{MovieDetails, MovieListResponse};

/// Movie catalog API trait.
///
/// Abstracts catalog operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait,
/// which the search pipeline requires for spawned debounce tasks.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Searches for movies matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn search_movies(&self, query: &str) -> Result<MovieListResponse, ApiError>;

    /// Fetches the popularity-sorted discover listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    async fn discover_movies(&self) -> Result<MovieListResponse, ApiError>;

    /// Fetches full details for one movie.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown ID, or another error if
    /// the HTTP request or JSON decoding fails.
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails, ApiError>;
}
