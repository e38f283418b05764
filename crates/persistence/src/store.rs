//! Document store abstraction

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::record::PersistenceRecord;
use crate::PersistenceError;

/// Storage for uploaded domain packs
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a record and return its assigned identifier
    async fn insert(&self, record: PersistenceRecord) -> Result<String, PersistenceError>;

    /// All records, newest upload first
    async fn list(&self) -> Result<Vec<PersistenceRecord>, PersistenceError>;

    async fn get(&self, identifier: &str) -> Result<Option<PersistenceRecord>, PersistenceError>;

    /// Backend name for health reporting
    fn backend_name(&self) -> &'static str;
}

/// Process-local store
#[derive(Default)]
pub struct InMemoryDocumentStore {
    records: RwLock<Vec<PersistenceRecord>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, record: PersistenceRecord) -> Result<String, PersistenceError> {
        let identifier = Uuid::new_v4().to_string();
        self.records
            .write()
            .push(record.with_identifier(identifier.clone()));
        tracing::debug!(identifier = %identifier, "Domain pack stored in memory");
        Ok(identifier)
    }

    async fn list(&self) -> Result<Vec<PersistenceRecord>, PersistenceError> {
        // Newest insert first among records sharing a timestamp
        let mut records: Vec<PersistenceRecord> =
            self.records.read().iter().rev().cloned().collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn get(&self, identifier: &str) -> Result<Option<PersistenceRecord>, PersistenceError> {
        Ok(self
            .records
            .read()
            .iter()
            .find(|r| r.identifier.as_deref() == Some(identifier))
            .cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
