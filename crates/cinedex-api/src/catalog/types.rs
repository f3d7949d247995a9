//! Catalog API response types.

use serde::{Deserialize, Serialize};

/// Image CDN base for `w500` posters.
const POSTER_CDN_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Placeholder shown when a movie has no poster.
const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750?text=No+Poster";

/// A movie as returned by search/discover listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Catalog movie ID.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Plot summary.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path (CDN-relative).
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path (CDN-relative).
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Release date (`YYYY-MM-DD`).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Average rating, 0-10.
    #[serde(default)]
    pub vote_average: f64,
    /// Number of votes.
    #[serde(default)]
    pub vote_count: u64,
}

/// Paged movie listing from `search/movie` or `discover/movie`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieListResponse {
    /// Page number.
    #[serde(default)]
    pub page: u32,
    /// Movies on this page.
    #[serde(default)]
    pub results: Vec<Movie>,
    /// Total page count.
    #[serde(default)]
    pub total_pages: u32,
    /// Total result count.
    #[serde(default)]
    pub total_results: u32,
}

/// A genre entry in movie details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u64,
    /// Genre name.
    pub name: String,
}

/// Full movie record from `movie/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetails {
    /// Catalog movie ID.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Plot summary.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path (CDN-relative).
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path (CDN-relative).
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Release date (`YYYY-MM-DD`).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Average rating, 0-10.
    #[serde(default)]
    pub vote_average: f64,
    /// Number of votes.
    #[serde(default)]
    pub vote_count: u64,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Production budget in USD.
    #[serde(default)]
    pub budget: u64,
    /// Box-office revenue in USD.
    #[serde(default)]
    pub revenue: u64,
}

/// Error body returned by the catalog API on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogErrorResponse {
    /// Catalog-internal error code.
    pub status_code: u32,
    /// Human-readable message.
    pub status_message: String,
    /// Always `false` on errors.
    #[serde(default)]
    pub success: bool,
}

/// Builds the full `w500` poster URL for a CDN-relative path, falling back
/// to a placeholder image when the path is absent.
#[must_use]
pub fn poster_url(poster_path: Option<&str>) -> String {
    poster_path.map_or_else(
        || String::from(POSTER_PLACEHOLDER),
        |path| format!("{POSTER_CDN_BASE}{path}"),
    )
}
