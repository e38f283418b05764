//! Persistence layer for domain packs
//!
//! - `record`: [`PersistenceRecord`] and the [`DocumentBuilder`] that
//!   produces it from a validated document
//! - `store`: the [`DocumentStore`] trait and an in-memory implementation
//! - `client`, `schema`, `documents`: the ScyllaDB-backed store

pub mod client;
pub mod documents;
pub mod error;
pub mod record;
pub mod schema;
pub mod store;

pub use client::{ScyllaClient, ScyllaConfig};
pub use documents::ScyllaDocumentStore;
pub use error::PersistenceError;
pub use record::{DocumentBuilder, DocumentMetadata, PersistenceRecord};
pub use store::{DocumentStore, InMemoryDocumentStore};

use std::sync::Arc;

use domain_pack_config::PersistenceConfig;

/// Store selected by configuration
///
/// Connects to ScyllaDB and ensures the schema when persistence is enabled,
/// otherwise falls back to the in-memory store.
pub async fn init(config: &PersistenceConfig) -> Result<Arc<dyn DocumentStore>, PersistenceError> {
    if !config.enabled {
        tracing::info!("Persistence disabled, using in-memory document store");
        return Ok(Arc::new(InMemoryDocumentStore::new()));
    }
    let client = ScyllaClient::connect(ScyllaConfig::from(config)).await?;
    client.ensure_schema().await?;
    Ok(Arc::new(ScyllaDocumentStore::new(client)))
}
