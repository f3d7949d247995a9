//! Search-popularity aggregate: per-term hit counters in the document
//! store, read back as the trending list.
#![allow(clippy::future_not_send)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use cinedex_api::ApiError;
use cinedex_api::catalog::{Movie, poster_url};
use cinedex_api::docstore::{DocStoreClient, Document, Query};

/// Trending list page size.
const TRENDING_LIMIT: u32 = 10;

/// Records search popularity as a side effect of applied search results.
///
/// Abstracted so the search pipeline can be tested without a document
/// store. Uses `trait_variant::make` to generate a `Send`-bound async
/// trait for the pipeline's spawned fire-and-forget task.
#[trait_variant::make(SearchRecorder: Send)]
pub trait LocalSearchRecorder {
    /// Bumps (or creates) the popularity counter for `term`, snapshotting
    /// `movie` as the term's representative result.
    ///
    /// # Errors
    ///
    /// Returns an error if the document-store operation fails. An
    /// unconfigured store is a no-op, not an error.
    async fn record_search(&self, term: &str, movie: &Movie) -> Result<(), ApiError>;
}

/// One per-term popularity counter.
///
/// `count` is monotonically non-decreasing. The bump is a read-modify-
/// write against the remote store, so concurrent writers for the same
/// term can lose an update; tolerated for a single-user client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    /// The search term this counter aggregates.
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    /// Catalog ID of the representative movie.
    pub movie_id: u64,
    /// Representative movie title.
    pub title: String,
    /// Hit count.
    pub count: u64,
    /// Full poster URL captured at first record time.
    pub poster_url: String,
}

/// Repository over the search-popularity collection.
///
/// Construction with `unconfigured()` yields a repo whose operations
/// no-op (record) or return empty (trending) so the application stays
/// usable without the optional document store.
#[derive(Debug, Clone)]
pub struct TrendingRepo {
    /// Document-store client, absent when not configured.
    docstore: Option<Arc<DocStoreClient>>,
    /// Popularity collection ID, absent when not configured.
    collection_id: Option<String>,
}

impl TrendingRepo {
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

    /// Fallible half of `trending`.
    async fn fetch_top(&self) -> Result<Vec<Document<TrendingEntry>>, ApiError> {
        let (docstore, collection) = self.configured()?;
        let queries = [Query::order_desc("count"), Query::limit(TRENDING_LIMIT)];
        let list = docstore
            .list_documents::<TrendingEntry>(collection, &queries)
            .await?;
        Ok(list.documents)
    }

    /// Returns up to ten entries ordered by hit count, descending.
    ///
    /// Degrades to an empty list on any failure (logged) and when the
    /// store is not configured.
    #[instrument(skip_all)]
    pub async fn trending(&self) -> Vec<Document<TrendingEntry>> {
        match self.fetch_top().await {
            Ok(documents) => documents,
            Err(err) if err.is_degradable() => {
                tracing::debug!(error = %err, "trending list unavailable");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch trending entries");
                Vec::new()
            }
        }
    }
}

impl SearchRecorder for TrendingRepo {
    #[instrument(skip_all, fields(term))]
    async fn record_search(&self, term: &str, movie: &Movie) -> Result<(), ApiError> {
        let Ok((docstore, collection)) = self.configured() else {
            tracing::debug!("document store not configured, skipping search count update");
            return Ok(());
        };

        let queries = [Query::equal("searchTerm", term)];
        let existing = docstore
            .list_documents::<TrendingEntry>(collection, &queries)
            .await?;

        if let Some(doc) = existing.documents.first() {
            let bumped = doc.data.count.saturating_add(1);
            let _: Document<TrendingEntry> = docstore
                .update_document(collection, &doc.id, &serde_json::json!({ "count": bumped }))
                .await?;
            tracing::debug!(term, count = bumped, "search count bumped");
        } else {
            let entry = TrendingEntry {
                search_term: String::from(term),
                movie_id: movie.id,
                title: movie.title.clone(),
                count: 1,
                poster_url: poster_url(movie.poster_path.as_deref()),
            };
            let _: Document<TrendingEntry> =
                docstore.create_document(collection, &entry).await?;
            tracing::debug!(term, "search count created");
        }

        Ok(())
    }
}
