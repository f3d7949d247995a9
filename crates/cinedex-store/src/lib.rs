//! Local persistence for cinedex.
//!
//! A small key-value store (`SQLite`-backed on device, in-memory for
//! tests) and the typed `SessionStore` facade over it that holds the
//! access token and the cached user profile.

/// Key-value store trait and in-memory implementation.
pub mod kv;

/// Locations of local files (config and database).
pub mod paths;

/// Typed session persistence over a key-value store.
pub mod session;

/// `SQLite`-backed key-value store.
pub mod sqlite;

pub use kv::{KeyValueStore, LocalKeyValueStore, MemoryKv};
pub use session::SessionStore;
pub use sqlite::{SqliteKv, open_store};
