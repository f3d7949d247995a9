//! Core logic for cinedex.
//!
//! Orchestrates the session lifecycle (bootstrap, sign-in/out, profile),
//! the debounced race-safe search pipeline, the saved-items repository,
//! and the search-popularity (trending) repository.

/// Saved-items repository.
pub mod saved;

/// Debounced, generation-counted search pipeline.
pub mod search;

/// Session bootstrap and auth orchestration.
pub mod session;

/// Search-popularity (trending) repository.
pub mod trending;

pub use saved::{SavedMovie, SavedRepo};
pub use search::{SearchPhase, SearchPipeline, SearchSnapshot};
pub use session::{AppState, SessionManager};
pub use trending::{LocalSearchRecorder, SearchRecorder, TrendingEntry, TrendingRepo};
