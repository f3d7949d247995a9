//! Movie catalog API client (TMDB wire format).

mod api;
mod client;
mod types;

pub use api::{CatalogApi, LocalCatalogApi};
pub use client::{CatalogClient, CatalogClientBuilder};
pub use types::{
    CatalogErrorResponse, Genre, Movie, MovieDetails, MovieListResponse, poster_url,
};
