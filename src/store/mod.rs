//! Narrow interfaces to the backing services
//!
//! The engine never talks to a vendor SDK directly. It sees two traits:
//!
//! - [`DocumentStore`]: the document database (account → database →
//!   container → document hierarchy)
//! - [`ObjectStore`]: the blob store that holds snapshot objects
//!
//! Credential acquisition is the caller's problem; a store implementation
//! arrives already authenticated. The crate ships filesystem-backed
//! implementations of both traits ([`fs`]) so the tool runs end to end
//! without external services, and in-memory doubles with fault injection
//! ([`memory`]) for tests.

mod document;
pub mod fs;
pub mod memory;

pub use document::{Document, CONTAINER_NAME_FIELD, ID_FIELD, PARTITION_KEY_FIELD, PARTITION_KEY_PATH};

use async_trait::async_trait;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the backing stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service cannot be reached or its root is unusable. Fatal for
    /// the invocation when raised before any per-item work starts.
    #[error("cannot reach backing store: {0}")]
    Connectivity(String),

    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    #[error("container not found: {0}/{1}")]
    ContainerNotFound(String, String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A name or key the store refuses to accept.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A document the store refuses to accept (e.g. missing `id`).
    #[error("document rejected: {0}")]
    DocumentRejected(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Raised only by the in-memory doubles when a fault is injected.
    #[error("injected fault: {0}")]
    Injected(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// The document database, scoped to one account.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_databases(&self) -> StoreResult<Vec<String>>;

    async fn list_containers(&self, database: &str) -> StoreResult<Vec<String>>;

    async fn create_database_if_absent(&self, database: &str) -> StoreResult<()>;

    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<()>;

    /// Unbounded cross-partition scan of every document in a container.
    async fn scan_all(&self, database: &str, container: &str) -> StoreResult<Vec<Document>>;

    /// Insert-or-replace keyed by the document's `id` and partition key.
    async fn upsert(&self, database: &str, container: &str, document: &Document)
        -> StoreResult<()>;

    async fn delete_database(&self, database: &str) -> StoreResult<()>;
}

/// The blob object store holding snapshot objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Keys under the given prefix, in unspecified order.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
