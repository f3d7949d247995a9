//! Debounced, race-safe search pipeline.
//!
//! Keystrokes collapse into at most one in-flight catalog query per
//! debounce window. Two counters make stale async completions harmless:
//! the *epoch* cancels debounce timers superseded by a newer keystroke,
//! and the *generation* tags each issued request so that only the latest
//! generation's completion is ever applied. The guarantee is "last
//! request issued wins", not "last request completed wins"; superseded
//! transport calls are not aborted, their results are simply ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use cinedex_api::catalog::{CatalogApi, Movie};

use crate::trending::SearchRecorder;

/// Debounce window between the last keystroke and the catalog call.
const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Minimum query length (trimmed) that triggers a network call.
const MIN_QUERY_CHARS: usize = 3;

/// Where the pipeline currently stands for its latest generation.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPhase {
    /// No active search; results and errors are cleared.
    Idle,
    /// A request for the snapshot's generation is in flight.
    Searching,
    /// Results applied from the snapshot's generation.
    Results(Vec<Movie>),
    /// The snapshot's generation failed; the message is user-facing.
    Failed(String),
}

/// Observable pipeline state, published over a watch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSnapshot {
    /// The query the snapshot belongs to.
    pub query: String,
    /// Generation that produced this snapshot.
    pub generation: u64,
    /// Current phase.
    pub phase: SearchPhase,
}

impl Default for SearchSnapshot {
    fn default() -> Self {
        Self {
            query: String::new(),
            generation: 0,
            phase: SearchPhase::Idle,
        }
    }
}

/// Mutable pipeline counters, guarded by one mutex.
#[derive(Debug, Default)]
struct PipelineState {
    /// Current query text.
    query: String,
    /// Bumped on every keystroke; a debounce task whose captured epoch is
    /// stale aborts without searching.
    epoch: u64,
    /// Bumped when a search is issued (and when a short query clears
    /// state, to invalidate in-flight completions).
    generation: u64,
    /// Outstanding popularity-update tasks; drained by `flush`.
    records: Vec<JoinHandle<()>>,
}

/// Shared pipeline internals.
#[derive(Debug)]
struct PipelineInner<C, R> {
    catalog: C,
    recorder: R,
    debounce: Duration,
    state: Mutex<PipelineState>,
    tx: watch::Sender<SearchSnapshot>,
}

/// Clone-able handle driving the search pipeline.
#[derive(Debug)]
pub struct SearchPipeline<C, R> {
    inner: Arc<PipelineInner<C, R>>,
}

impl<C, R> Clone for SearchPipeline<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, R> SearchPipeline<C, R>
where
    C: CatalogApi + Send + Sync + 'static,
    R: SearchRecorder + Send + Sync + 'static,
{
    /// Creates a pipeline with the default 500 ms debounce window.
    #[must_use]
    pub fn new(catalog: C, recorder: R) -> Self {
        Self::with_debounce(catalog, recorder, DEBOUNCE_WINDOW)
    }

    /// Creates a pipeline with a custom debounce window.
    #[must_use]
    pub fn with_debounce(catalog: C, recorder: R, debounce: Duration) -> Self {
        let (tx, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(PipelineInner {
                catalog,
                recorder,
                debounce,
                state: Mutex::new(PipelineState::default()),
                tx,
            }),
        }
    }

    /// Subscribes to pipeline snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.tx.subscribe()
    }

    /// Feeds one keystroke's worth of input.
    ///
    /// Short queries (under three trimmed characters) clear results and
    /// error state immediately without any network activity; longer ones
    /// restart the debounce window.
    pub async fn input(&self, text: &str) {
        let mut state = self.inner.state.lock().await;
        state.query = String::from(text);
        state.epoch = state.epoch.saturating_add(1);

        if text.trim().chars().count() < MIN_QUERY_CHARS {
            // Also invalidates any in-flight generation so a late
            // completion cannot resurrect cleared results. Published
            // under the state lock so no stale Searching snapshot can
            // slip in behind it.
            state.generation = state.generation.saturating_add(1);
            self.inner.tx.send_replace(SearchSnapshot {
                query: state.query.clone(),
                generation: state.generation,
                phase: SearchPhase::Idle,
            });
            drop(state);
            return;
        }

        let epoch = state.epoch;
        drop(state);

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.inner.debounce).await;
            this.run_search(epoch).await;
        });
    }

    /// Debounce-timer body: issues the search if no newer keystroke has
    /// superseded this timer, then applies the completion if no newer
    /// search has superseded this generation.
    async fn run_search(&self, epoch: u64) {
        // Every snapshot publish happens under the state lock, so the
        // published sequence follows generation order even on a
        // multi-thread runtime.
        let (generation, query) = {
            let mut state = self.inner.state.lock().await;
            if state.epoch != epoch {
                return;
            }
            state.generation = state.generation.saturating_add(1);
            let generation = state.generation;
            let query = state.query.clone();
            self.inner.tx.send_replace(SearchSnapshot {
                query: query.clone(),
                generation,
                phase: SearchPhase::Searching,
            });
            (generation, query)
        };

        tracing::debug!(query, generation, "issuing catalog search");
        let outcome = self.inner.catalog.search_movies(&query).await;

        let mut state = self.inner.state.lock().await;
        if state.generation != generation {
            tracing::debug!(query, generation, "discarding superseded completion");
            return;
        }

        let phase = match outcome {
            Ok(response) => {
                if let Some(first) = response.results.first() {
                    let handle = self.spawn_record(query.clone(), first.clone());
                    state.records.retain(|record| !record.is_finished());
                    state.records.push(handle);
                }
                SearchPhase::Results(response.results)
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "search failed");
                SearchPhase::Failed(err.to_string())
            }
        };

        self.inner.tx.send_replace(SearchSnapshot {
            query,
            generation,
            phase,
        });
        drop(state);
    }

    /// Waits for outstanding popularity updates to finish.
    ///
    /// The updates are fire-and-forget for interactive callers; a
    /// one-shot caller uses this to drain them before shutting its
    /// runtime down.
    pub async fn flush(&self) {
        let records = {
            let mut state = self.inner.state.lock().await;
            std::mem::take(&mut state.records)
        };
        for record in records {
            if record.await.is_err() {
                tracing::warn!("popularity update task did not complete");
            }
        }
    }

    /// Fire-and-forget popularity update for the first applied result.
    fn spawn_record(&self, query: String, first: Movie) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.inner.recorder.record_search(&query, &first).await {
                tracing::warn!(query, error = %err, "failed to record search popularity");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use cinedex_api::ApiError;
    use cinedex_api::catalog::{MovieDetails, MovieListResponse};

    use super::*;

    fn movie(id: u64, title: &str) -> Movie {
        Movie {
            id,
            title: String::from(title),
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 7.0,
            vote_count: 100,
        }
    }

    fn listing(results: Vec<Movie>) -> MovieListResponse {
        MovieListResponse {
            page: 1,
            total_results: u32::try_from(results.len()).unwrap(),
            total_pages: 1,
            results,
        }
    }

    /// Scripted catalog: per-query results, delays, and failures.
    #[derive(Debug, Default)]
    struct FakeCatalog {
        results: HashMap<String, Vec<Movie>>,
        delays: HashMap<String, Duration>,
        failures: HashMap<String, String>,
        calls: StdMutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogApi for &'static FakeCatalog {
        async fn search_movies(&self, query: &str) -> Result<MovieListResponse, ApiError> {
            self.calls.lock().unwrap().push(String::from(query));
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            if let Some(message) = self.failures.get(query) {
                return Err(ApiError::Status {
                    status: 500,
                    message: message.clone(),
                });
            }
            Ok(listing(self.results.get(query).cloned().unwrap_or_default()))
        }

        async fn discover_movies(&self) -> Result<MovieListResponse, ApiError> {
            Ok(listing(Vec::new()))
        }

        async fn movie_details(&self, _movie_id: u64) -> Result<MovieDetails, ApiError> {
            Err(ApiError::NotFound)
        }
    }

    /// Recorder that remembers every (term, movie id) it was handed,
    /// optionally after a delay.
    #[derive(Debug, Default)]
    struct SpyRecorder {
        delay: Duration,
        recorded: StdMutex<Vec<(String, u64)>>,
    }

    impl SpyRecorder {
        fn recorded(&self) -> Vec<(String, u64)> {
            self.recorded.lock().unwrap().clone()
        }
    }

    impl SearchRecorder for &'static SpyRecorder {
        async fn record_search(&self, term: &str, movie: &Movie) -> Result<(), ApiError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.recorded
                .lock()
                .unwrap()
                .push((String::from(term), movie.id));
            Ok(())
        }
    }

    /// Recorder that drops everything.
    #[derive(Debug, Default)]
    struct NullRecorder;

    impl SearchRecorder for NullRecorder {
        async fn record_search(&self, _term: &str, _movie: &Movie) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn leak<T>(value: T) -> &'static T {
        Box::leak(Box::new(value))
    }

    /// Lets spawned pipeline tasks run and paused time advance.
    async fn settle(duration: Duration) {
        tokio::time::sleep(duration).await;
        tokio::task::yield_now().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_burst_collapses_to_one_call() {
        // Arrange
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(String::from("abc"), vec![movie(1, "Abc")])]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        // Act: three keystrokes inside one debounce window
        pipeline.input("a").await;
        settle(Duration::from_millis(100)).await;
        pipeline.input("ab").await;
        settle(Duration::from_millis(100)).await;
        pipeline.input("abc").await;
        settle(Duration::from_millis(600)).await;

        // Assert: one call, for the final text only
        assert_eq!(catalog.calls(), vec![String::from("abc")]);
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.query, "abc");
        assert_eq!(snapshot.phase, SearchPhase::Results(vec![movie(1, "Abc")]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_input_clears_results_without_network() {
        // Arrange: establish results first
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(String::from("abc"), vec![movie(1, "Abc")])]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        pipeline.input("abc").await;
        settle(Duration::from_millis(600)).await;
        assert!(matches!(rx.borrow().phase, SearchPhase::Results(_)));

        // Act: deleting down to two characters
        pipeline.input("ab").await;
        settle(Duration::from_millis(600)).await;

        // Assert: cleared immediately, no second call
        assert_eq!(rx.borrow().phase, SearchPhase::Idle);
        assert_eq!(catalog.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_padding_does_not_count_toward_length() {
        // Arrange
        let catalog = leak(FakeCatalog::default());
        let pipeline = SearchPipeline::new(catalog, NullRecorder);

        // Act
        pipeline.input("  ab   ").await;
        settle(Duration::from_millis(600)).await;

        // Assert
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_order_completion_is_discarded() {
        // Arrange: the older generation resolves after the newer one
        let catalog = leak(FakeCatalog {
            results: HashMap::from([
                (String::from("slow query"), vec![movie(1, "Old")]),
                (String::from("fast query"), vec![movie(2, "New")]),
            ]),
            delays: HashMap::from([
                (String::from("slow query"), Duration::from_millis(5000)),
                (String::from("fast query"), Duration::from_millis(10)),
            ]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        // Act: first search goes in flight, then a second supersedes it
        pipeline.input("slow query").await;
        settle(Duration::from_millis(600)).await;
        pipeline.input("fast query").await;
        settle(Duration::from_millis(600)).await;
        let after_fast = rx.borrow().clone();
        settle(Duration::from_millis(6000)).await;

        // Assert: the slow completion changed nothing
        assert_eq!(after_fast.phase, SearchPhase::Results(vec![movie(2, "New")]));
        let final_snapshot = rx.borrow().clone();
        assert_eq!(final_snapshot, after_fast);
        assert_eq!(catalog.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_during_inflight_search_stays_cleared() {
        // Arrange: a slow search goes in flight, then the query is
        // deleted down to one character while it is still out
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(String::from("slow query"), vec![movie(1, "Old")])]),
            delays: HashMap::from([(String::from("slow query"), Duration::from_millis(5000))]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        // Act
        pipeline.input("slow query").await;
        settle(Duration::from_millis(600)).await;
        pipeline.input("s").await;
        let after_clear = rx.borrow().clone();
        settle(Duration::from_millis(6000)).await;

        // Assert: the clear published Idle and the late completion
        // never overwrote it
        assert_eq!(after_clear.phase, SearchPhase::Idle);
        assert_eq!(rx.borrow().clone(), after_clear);
        assert_eq!(catalog.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_error_is_discarded() {
        // Arrange: the failing generation resolves after its successor
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(String::from("good query"), vec![movie(2, "New")])]),
            delays: HashMap::from([
                (String::from("bad query"), Duration::from_millis(5000)),
                (String::from("good query"), Duration::from_millis(10)),
            ]),
            failures: HashMap::from([(String::from("bad query"), String::from("boom"))]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        // Act
        pipeline.input("bad query").await;
        settle(Duration::from_millis(600)).await;
        pipeline.input("good query").await;
        settle(Duration::from_millis(6000)).await;

        // Assert: no error surfaced for the dead generation
        assert!(matches!(rx.borrow().phase, SearchPhase::Results(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_surfaces_for_current_generation() {
        // Arrange
        let catalog = leak(FakeCatalog {
            failures: HashMap::from([(String::from("doomed"), String::from("catalog down"))]),
            ..FakeCatalog::default()
        });
        let pipeline = SearchPipeline::new(catalog, NullRecorder);
        let rx = pipeline.subscribe();

        // Act
        pipeline.input("doomed").await;
        settle(Duration::from_millis(600)).await;

        // Assert
        let snapshot = rx.borrow().clone();
        match snapshot.phase {
            SearchPhase::Failed(message) => assert!(message.contains("catalog down")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_popularity_recorded_for_first_result_only() {
        // Arrange
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(
                String::from("inception"),
                vec![movie(1, "First"), movie(2, "Second")],
            )]),
            ..FakeCatalog::default()
        });
        let recorder = leak(SpyRecorder::default());
        let pipeline = SearchPipeline::new(catalog, recorder);

        // Act
        pipeline.input("inception").await;
        settle(Duration::from_millis(600)).await;

        // Assert: one record, carrying the first result
        assert_eq!(recorder.recorded(), vec![(String::from("inception"), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_waits_for_pending_popularity_update() {
        // Arrange: the recorder lands well after the results apply
        let catalog = leak(FakeCatalog {
            results: HashMap::from([(String::from("inception"), vec![movie(1, "First")])]),
            ..FakeCatalog::default()
        });
        let recorder = leak(SpyRecorder {
            delay: Duration::from_millis(5000),
            ..SpyRecorder::default()
        });
        let pipeline = SearchPipeline::new(catalog, recorder);

        // Act
        pipeline.input("inception").await;
        settle(Duration::from_millis(600)).await;
        let before_flush = recorder.recorded();
        pipeline.flush().await;

        // Assert: nothing had landed yet; flush drained it
        assert!(before_flush.is_empty());
        assert_eq!(recorder.recorded(), vec![(String::from("inception"), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results_record_nothing() {
        // Arrange
        let catalog = leak(FakeCatalog::default());
        let recorder = leak(SpyRecorder::default());
        let pipeline = SearchPipeline::new(catalog, recorder);

        // Act
        pipeline.input("nothing here").await;
        settle(Duration::from_millis(600)).await;

        // Assert
        assert!(recorder.recorded().is_empty());
        assert_eq!(rx_phase(&pipeline), SearchPhase::Results(Vec::new()));
    }

    fn rx_phase<C, R>(pipeline: &SearchPipeline<C, R>) -> SearchPhase
    where
        C: CatalogApi + Send + Sync + 'static,
        R: SearchRecorder + Send + Sync + 'static,
    {
        pipeline.subscribe().borrow().phase.clone()
    }
}
