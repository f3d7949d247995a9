//! `CatalogClient` - movie catalog API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::error::ApiError;

use super::api::CatalogApi;
use super::types::{CatalogErrorResponse, MovieDetails, MovieListResponse};

/// Default base URL for the catalog API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Movie catalog API client.
///
/// The API token is fixed at build time; every request carries it as a
/// bearer credential.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Bearer API token.
    api_token: String,
}

/// Builder for `CatalogClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClientBuilder {
    base_url: Option<Url>,
    api_token: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl CatalogClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_token: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API bearer token (required).
    #[must_use]
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
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

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_token` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<CatalogClient> {
        let api_token = self.api_token.context("api_token is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(CatalogClient {
            http_client,
            base_url,
            api_token,
        })
    }
}

impl CatalogClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::new()
    }

    /// Sends a GET request with Bearer auth and decodes the JSON response.
    ///
    /// Non-success statuses map to the shared taxonomy: 404 becomes
    /// `NotFound`, everything else becomes `Status` carrying the catalog's
    /// `status_message` when the error body is parseable.
    #[instrument(skip_all)]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.base_url.join(path).map_err(|_| ApiError::NotFound)?;

        tracing::debug!(%url, "catalog API request");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound);
            }
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CatalogErrorResponse>(&body)
                .map_or(body, |e| e.status_message);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}

impl CatalogApi for CatalogClient {
    #[instrument(skip_all)]
    async fn search_movies(&self, query: &str) -> Result<MovieListResponse, ApiError> {
        let params = [("query", String::from(query))];
        self.get_json("search/movie", &params).await
    }

    #[instrument(skip_all)]
    async fn discover_movies(&self) -> Result<MovieListResponse, ApiError> {
        let params = [("sort_by", String::from("popularity.desc"))];
        self.get_json("discover/movie", &params).await
    }

    #[instrument(skip_all)]
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails, ApiError> {
        let path = format!("movie/{movie_id}");
        self.get_json(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn test_client(mock_uri: &str) -> CatalogClient {
        let base_url = format!("{mock_uri}/3/");
        CatalogClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_token() {
        // Arrange & Act
        let result = CatalogClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("api_token is required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = CatalogClient::builder().api_token("test-token").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_custom_base_url() {
        // Arrange
        let custom_url = Url::parse("http://localhost:8080/3/").unwrap();

        // Act
        let client = CatalogClient::builder()
            .base_url(custom_url.clone())
            .api_token("test-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url, custom_url);
    }

    #[test]
    fn test_parse_search_movie_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/catalog/search_movie_inception.json");

        // Act
        let response: MovieListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.page, 1);
        assert!(!response.results.is_empty());
        let first = &response.results[0];
        assert_eq!(first.id, 27_205);
        assert_eq!(first.title, "Inception");
        assert!(first.poster_path.is_some());
    }

    #[test]
    fn test_parse_search_movie_empty_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/catalog/search_movie_empty.json");

        // Act
        let response: MovieListResponse = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(response.total_results, 0);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_parse_movie_details_fixture() {
        // Arrange
        let json = include_str!("../../../../fixtures/catalog/movie_details_27205.json");

        // Act
        let details: MovieDetails = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(details.id, 27_205);
        assert_eq!(details.title, "Inception");
        assert_eq!(details.runtime, Some(148));
        assert!(!details.genres.is_empty());
    }

    #[tokio::test]
    async fn test_search_movies_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/catalog/search_movie_inception.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/search/movie"))
            .and(wiremock::matchers::query_param("query", "inception"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let response = client.search_movies("inception").await.unwrap();

        // Assert
        assert!(!response.results.is_empty());
        assert_eq!(response.results[0].title, "Inception");
    }

    #[tokio::test]
    async fn test_discover_movies_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/catalog/discover_movies.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/discover/movie"))
            .and(wiremock::matchers::query_param(
                "sort_by",
                "popularity.desc",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let response = client.discover_movies().await.unwrap();

        // Assert
        assert!(!response.results.is_empty());
    }

    #[tokio::test]
    async fn test_movie_details_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/catalog/movie_details_27205.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/27205"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let details = client.movie_details(27_205).await.unwrap();

        // Assert
        assert_eq!(details.id, 27_205);
        assert_eq!(details.title, "Inception");
    }

    #[tokio::test]
    async fn test_bearer_token_is_sent() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/catalog/search_movie_empty.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::header(
                "Authorization",
                "Bearer my-secret-token",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let base_url = format!("{}/3/", mock_server.uri());
        let client = CatalogClient::builder()
            .base_url(base_url.parse().unwrap())
            .api_token("my-secret-token")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act & Assert (mock expect(1) verifies Authorization header)
        client.search_movies("test").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_movie_returns_not_found() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(404)
                    .set_body_string(r#"{"status_code":34,"status_message":"The resource you requested could not be found.","success":false}"#),
            )
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let result = client.movie_details(999_999_999).await;

        // Assert
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_error_body_maps_to_status() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let result = client.search_movies("test").await;

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_decode() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());

        // Act
        let result = client.search_movies("test").await;

        // Assert
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
