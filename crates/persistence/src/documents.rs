//! Domain pack persistence using ScyllaDB
//!
//! Each record is written twice: into `domain_packs`, clustered by upload
//! time for listing, and into `domain_packs_by_id` for lookups. Both rows
//! carry the full record as JSON.

use async_trait::async_trait;
use scylla::frame::response::result::Row;
use uuid::Uuid;

use crate::record::PersistenceRecord;
use crate::schema::LIST_BUCKET;
use crate::store::DocumentStore;
use crate::{PersistenceError, ScyllaClient};

#[derive(Clone)]
pub struct ScyllaDocumentStore {
    client: ScyllaClient,
}

impl ScyllaDocumentStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    fn row_to_record(row: Row) -> Result<PersistenceRecord, PersistenceError> {
        let (record_json,): (String,) = row
            .into_typed()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
        Ok(serde_json::from_str(&record_json)?)
    }
}

#[async_trait]
impl DocumentStore for ScyllaDocumentStore {
    async fn insert(&self, record: PersistenceRecord) -> Result<String, PersistenceError> {
        let id = Uuid::new_v4();
        let record = record.with_identifier(id.to_string());
        let record_json = serde_json::to_string(&record)?;
        let uploaded_at = record.uploaded_at.timestamp_millis();
        let sections_count = i32::try_from(record.sections_count)
            .map_err(|_| PersistenceError::InvalidData("sections_count overflow".to_string()))?;

        let listing = format!(
            "INSERT INTO {}.domain_packs (
                bucket, uploaded_at, id, filename, name, description, version,
                sections_count, record_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(
                listing,
                (
                    LIST_BUCKET,
                    uploaded_at,
                    id,
                    &record.filename,
                    &record.metadata.name,
                    &record.metadata.description,
                    &record.metadata.version,
                    sections_count,
                    &record_json,
                ),
            )
            .await?;

        let by_id = format!(
            "INSERT INTO {}.domain_packs_by_id (id, uploaded_at, record_json) VALUES (?, ?, ?)",
            self.client.keyspace()
        );
        self.client
            .session()
            .query_unpaged(by_id, (id, uploaded_at, &record_json))
            .await?;

        tracing::info!(
            id = %id,
            filename = %record.filename,
            name = %record.metadata.name,
            "Domain pack stored in ScyllaDB"
        );
        Ok(id.to_string())
    }

    async fn list(&self) -> Result<Vec<PersistenceRecord>, PersistenceError> {
        let query = format!(
            "SELECT record_json FROM {}.domain_packs WHERE bucket = ?",
            self.client.keyspace()
        );
        let result = self
            .client
            .session()
            .query_unpaged(query, (LIST_BUCKET,))
            .await?;

        let mut records = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                records.push(Self::row_to_record(row)?);
            }
        }
        Ok(records)
    }

    async fn get(&self, identifier: &str) -> Result<Option<PersistenceRecord>, PersistenceError> {
        // Identifiers we never issued cannot be stored
        let Ok(id) = Uuid::parse_str(identifier) else {
            return Ok(None);
        };
        let query = format!(
            "SELECT record_json FROM {}.domain_packs_by_id WHERE id = ?",
            self.client.keyspace()
        );
        let result = self.client.session().query_unpaged(query, (id,)).await?;

        match result.rows.and_then(|rows| rows.into_iter().next()) {
            Some(row) => Ok(Some(Self::row_to_record(row)?)),
            None => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "scylla"
    }
}
