//! Document-store REST client (hosted document database).

mod client;
mod query;
mod types;

pub use client::{DocStoreClient, DocStoreClientBuilder};
pub use query::Query;
pub use types::{Document, DocumentList};
