//! ScyllaDB schema creation

use scylla::Session;

use crate::error::PersistenceError;

/// Listing partition; every pack lands in the same one
pub const LIST_BUCKET: i32 = 0;

pub fn keyspace_statement(keyspace: &str, replication_factor: u8) -> String {
    format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    )
}

/// `(table, statement)` pairs in creation order
pub fn table_statements(keyspace: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "domain_packs",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.domain_packs (
            bucket INT,
            uploaded_at BIGINT,
            id UUID,
            filename TEXT,
            name TEXT,
            description TEXT,
            version TEXT,
            sections_count INT,
            record_json TEXT,
            PRIMARY KEY ((bucket), uploaded_at, id)
        ) WITH CLUSTERING ORDER BY (uploaded_at DESC, id DESC)
    "#,
                keyspace
            ),
        ),
        (
            "domain_packs_by_id",
            format!(
                r#"
        CREATE TABLE IF NOT EXISTS {}.domain_packs_by_id (
            id UUID,
            uploaded_at BIGINT,
            record_json TEXT,
            PRIMARY KEY (id)
        )
    "#,
                keyspace
            ),
        ),
    ]
}

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    session
        .query_unpaged(keyspace_statement(keyspace, replication_factor), &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;
    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    for (table, statement) in table_statements(keyspace) {
        session.query_unpaged(statement, &[]).await.map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create {} table: {}", table, e))
        })?;
    }
    tracing::info!("All tables created successfully");
    Ok(())
}
