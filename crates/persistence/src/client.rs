//! ScyllaDB client and connection management

use std::sync::Arc;

use domain_pack_config::PersistenceConfig;
use scylla::{Session, SessionBuilder};

use crate::error::PersistenceError;
use crate::schema;

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self::from(&PersistenceConfig::default())
    }
}

impl From<&PersistenceConfig> for ScyllaConfig {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            hosts: config.scylla_hosts.clone(),
            keyspace: config.keyspace.clone(),
            replication_factor: config.replication_factor,
        }
    }
}

#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "Connecting to ScyllaDB");

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Create the keyspace and tables when missing
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_keyspace(
            &self.session,
            &self.config.keyspace,
            self.config.replication_factor,
        )
        .await?;
        schema::create_tables(&self.session, &self.config.keyspace).await?;
        tracing::info!(keyspace = %self.config.keyspace, "Schema ensured");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}
