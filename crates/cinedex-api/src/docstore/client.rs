//! `DocStoreClient` - hosted document database REST driver.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::error::ApiError;

use super::types::{Document, DocumentList};

/// Default endpoint for the hosted document store.
const DEFAULT_ENDPOINT: &str = "https://cloud.appwrite.io/v1/";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by the document store.
#[derive(Debug, Deserialize)]
struct DocStoreErrorBody {
    message: String,
}

/// Document database client, addressed by project and database IDs.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct DocStoreClient {
    /// HTTP client.
    http_client: Client,
    /// API endpoint.
    endpoint: Url,
    /// Project ID, sent as a header on every request.
    project_id: String,
    /// Database containing the collections.
    database_id: String,
}

/// Builder for `DocStoreClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct DocStoreClientBuilder {
    endpoint: Option<Url>,
    project_id: Option<String>,
    database_id: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl DocStoreClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            endpoint: None,
            project_id: None,
            database_id: None,
            user_agent: None,
            timeout: None,
        }
    }

    /// Overrides the endpoint (for wiremock in tests or self-hosting).
    #[must_use]
    pub fn endpoint(mut self, url: Url) -> Self {
        self.endpoint = Some(url);
        self
    }

    /// Sets the project ID (required).
    #[must_use]
    pub fn project_id(mut self, id: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self
    }

    /// Sets the database ID (required).
    #[must_use]
    pub fn database_id(mut self, id: impl Into<String>) -> Self {
        self.database_id = Some(id.into());
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
    /// - `project_id` is not set.
    /// - `database_id` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<DocStoreClient> {
        let project_id = self.project_id.context("project_id is required")?;
        let database_id = self.database_id.context("database_id is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let endpoint = if let Some(url) = self.endpoint {
            url
        } else {
            let result = Url::parse(DEFAULT_ENDPOINT);
            result.context("invalid default endpoint")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(DocStoreClient {
            http_client,
            endpoint,
            project_id,
            database_id,
        })
    }
}

impl DocStoreClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> DocStoreClientBuilder {
        DocStoreClientBuilder::new()
    }

    /// Lists documents in a collection, filtered and ordered by `queries`
    /// (see [`super::Query`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request or JSON decoding fails.
    #[instrument(skip_all)]
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection_id: &str,
        queries: &[String],
    ) -> Result<DocumentList<T>, ApiError> {
        let path = format!(
            "databases/{}/collections/{collection_id}/documents",
            self.database_id
        );
        let params: Vec<(&str, &str)> = queries.iter().map(|q| ("queries[]", q.as_str())).collect();

        let response = self
            .request(Method::GET, &path)?
            .query(&params)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Creates a document with a store-generated ID.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the store rejects the write as a duplicate,
    /// or another error if the HTTP request or JSON decoding fails.
    #[instrument(skip_all)]
    pub async fn create_document<T: serde::Serialize, R: DeserializeOwned>(
        &self,
        collection_id: &str,
        data: &T,
    ) -> Result<Document<R>, ApiError> {
        let path = format!(
            "databases/{}/collections/{collection_id}/documents",
            self.database_id
        );
        let body = serde_json::json!({
            "documentId": "unique()",
            "data": data,
        });

        let response = self
            .request(Method::POST, &path)?
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Patches fields of an existing document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown document ID, or another error if
    /// the HTTP request or JSON decoding fails.
    #[instrument(skip_all)]
    pub async fn update_document<R: DeserializeOwned>(
        &self,
        collection_id: &str,
        document_id: &str,
        data: &serde_json::Value,
    ) -> Result<Document<R>, ApiError> {
        let path = format!(
            "databases/{}/collections/{collection_id}/documents/{document_id}",
            self.database_id
        );
        let body = serde_json::json!({ "data": data });

        let response = self
            .request(Method::PATCH, &path)?
            .json(&body)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Deletes a document.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown document ID, or another error if
    /// the HTTP request fails.
    #[instrument(skip_all)]
    pub async fn delete_document(
        &self,
        collection_id: &str,
        document_id: &str,
    ) -> Result<(), ApiError> {
        let path = format!(
            "databases/{}/collections/{collection_id}/documents/{document_id}",
            self.database_id
        );

        let response = self.request(Method::DELETE, &path)?.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::status_error(status, body))
        }
    }

    /// Starts a request builder with the project header attached.
    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ApiError> {
        let url = self.endpoint.join(path).map_err(|_| ApiError::NotFound)?;
        tracing::debug!(%method, %url, "document store request");
        Ok(self
            .http_client
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id))
    }

    /// Checks the status and decodes the JSON body.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, body));
        }
        let body = response.text().await?;
        let parsed = serde_json::from_str(&body)?;
        Ok(parsed)
    }

    /// Maps a non-success status to the shared taxonomy.
    fn status_error(status: StatusCode, body: String) -> ApiError {
        let message = serde_json::from_str::<DocStoreErrorBody>(&body).map_or(body, |e| e.message);
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::CONFLICT => ApiError::Conflict(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        }
    }
}
