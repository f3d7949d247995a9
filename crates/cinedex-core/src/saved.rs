//! Saved-items repository: a user's bookmarks in the document store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cinedex_api::ApiError;
use cinedex_api::catalog::MovieDetails;
use cinedex_api::docstore::{DocStoreClient, Document, Query};

/// A bookmarked movie.
///
/// Display fields are denormalized snapshots captured at save time; they
/// are not kept in sync with the catalog afterwards. `movie_id` is the
/// string-normalized catalog ID and is unique per user by a
/// look-before-write check (two racing saves can still slip a duplicate
/// through; tolerated without a storage-level constraint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMovie {
    /// Catalog ID, string-normalized.
    pub movie_id: String,
    /// Title at save time.
    pub title: String,
    /// Poster path at save time.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop path at save time.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Rating at save time.
    pub vote_average: f64,
    /// Release date at save time.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Overview at save time.
    #[serde(default)]
    pub overview: Option<String>,
    /// Save timestamp (RFC 3339).
    pub saved_at: String,
}

impl SavedMovie {
    /// Snapshots a catalog record for storage.
    fn from_details(details: &MovieDetails) -> Self {
        Self {
            movie_id: details.id.to_string(),
            title: details.title.clone(),
            poster_path: details.poster_path.clone(),
            backdrop_path: details.backdrop_path.clone(),
            vote_average: details.vote_average,
            release_date: details.release_date.clone(),
            overview: details.overview.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Repository over the saved-items collection.
///
/// `save` and `unsave` propagate failures so the caller can offer a
/// retry; `is_saved` and `list` degrade to `false` / empty instead, so
/// read paths never surface a missing or unreachable backend.
#[derive(Debug, Clone)]
pub struct SavedRepo {
    /// Document-store client, absent when not configured.
    docstore: Option<Arc<DocStoreClient>>,
    /// Saved-items collection ID, absent when not configured.
    collection_id: Option<String>,
}

impl SavedRepo {
    /// Creates a configured repository.
    #[must_use]
    pub const fn new(docstore: Arc<DocStoreClient>, collection_id: String) -> Self {
        Self {
            docstore: Some(docstore),
            collection_id: Some(collection_id),
        }
    }

    /// Creates a repository with no backing store.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            docstore: None,
            collection_id: None,
        }
    }

    /// Returns the client and collection, or `NotConfigured`.
    fn configured(&self) -> Result<(&DocStoreClient, &str), ApiError> {
        match (&self.docstore, &self.collection_id) {
            (Some(docstore), Some(collection)) => Ok((docstore, collection.as_str())),
            _ => Err(ApiError::NotConfigured("docstore")),
        }
    }

    /// Looks up the saved document for a movie ID, if any.
    async fn find(
        &self,
        docstore: &DocStoreClient,
        collection: &str,
        movie_id: u64,
    ) -> Result<Option<Document<SavedMovie>>, ApiError> {
        let queries = [Query::equal("movie_id", &movie_id.to_string())];
        let list = docstore
            .list_documents::<SavedMovie>(collection, &queries)
            .await?;
        Ok(list.documents.into_iter().next())
    }

    /// Saves a movie. Idempotent: an already-saved movie returns the
    /// existing record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when the document store is absent, or any
    /// store failure, so the caller can prompt a retry.
    #[instrument(skip_all, fields(movie_id = details.id))]
    pub async fn save(&self, details: &MovieDetails) -> Result<Document<SavedMovie>, ApiError> {
        let (docstore, collection) = self.configured()?;

        if let Some(existing) = self.find(docstore, collection, details.id).await? {
            tracing::debug!("movie already saved");
            return Ok(existing);
        }

        let record = SavedMovie::from_details(details);
        let doc = docstore.create_document(collection, &record).await?;
        tracing::debug!("movie saved");
        Ok(doc)
    }

    /// Removes a bookmark. Idempotent: unsaving a never-saved movie is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when the document store is absent, or any
    /// store failure, so the caller can prompt a retry.
    #[instrument(skip_all, fields(movie_id))]
    pub async fn unsave(&self, movie_id: u64) -> Result<(), ApiError> {
        let (docstore, collection) = self.configured()?;

        let Some(existing) = self.find(docstore, collection, movie_id).await? else {
            tracing::debug!("movie was not saved, nothing to remove");
            return Ok(());
        };

        docstore.delete_document(collection, &existing.id).await?;
        tracing::debug!("movie unsaved");
        Ok(())
    }

    /// Fallible half of `is_saved`.
    async fn lookup(&self, movie_id: u64) -> Result<Option<Document<SavedMovie>>, ApiError> {
        let (docstore, collection) = self.configured()?;
        self.find(docstore, collection, movie_id).await
    }

    /// Fallible half of `list`.
    async fn fetch_all(&self) -> Result<Vec<Document<SavedMovie>>, ApiError> {
        let (docstore, collection) = self.configured()?;
        let queries = [Query::order_desc("saved_at")];
        let list = docstore
            .list_documents::<SavedMovie>(collection, &queries)
            .await?;
        Ok(list.documents)
    }

    /// Returns whether a movie is bookmarked. Degrades to `false` on any
    /// failure (logged) and when the store is not configured.
    #[instrument(skip_all, fields(movie_id))]
    pub async fn is_saved(&self, movie_id: u64) -> bool {
        match self.lookup(movie_id).await {
            Ok(found) => found.is_some(),
            Err(err) if err.is_degradable() => {
                tracing::debug!(error = %err, "treating movie as not saved");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to check saved state");
                false
            }
        }
    }

    /// Returns all bookmarks ordered by save time, newest first. Degrades
    /// to empty on any failure (logged) and when the store is not
    /// configured.
    #[instrument(skip_all)]
    pub async fn list(&self) -> Vec<Document<SavedMovie>> {
        match self.fetch_all().await {
            Ok(documents) => documents,
            Err(err) if err.is_degradable() => {
                tracing::debug!(error = %err, "saved list unavailable");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to list saved movies");
                Vec::new()
            }
        }
    }
}
