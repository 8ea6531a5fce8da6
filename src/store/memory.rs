//! In-memory store doubles with fault injection
//!
//! These implement the store traits over plain maps and let tests inject
//! failures at exactly the boundaries the engine must isolate: one
//! container's scan, one document's upsert, one database's deletion, one
//! object put. They are ordinary library types (not test-gated) so both
//! unit tests and the integration suite can drive them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Document, DocumentStore, ObjectStore, StoreError, StoreResult};

/// Documents are keyed by (canonical partition key, id).
type DocKey = (String, String);

#[derive(Default)]
struct ContainerState {
    partition_key_path: String,
    documents: BTreeMap<DocKey, Document>,
}

#[derive(Default)]
struct DocState {
    databases: BTreeMap<String, BTreeMap<String, ContainerState>>,
    unreachable: bool,
    fail_scan: BTreeSet<(String, String)>,
    fail_upsert_ids: BTreeSet<String>,
    fail_delete: BTreeSet<String>,
}

fn canonical_partition_key(document: &Document) -> StoreResult<String> {
    serde_json::to_string(document.partition_key()).map_err(Into::into)
}

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocState>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fixture document, creating its database and container.
    pub fn seed(&self, database: &str, container: &str, document: Document) {
        let id = document
            .id()
            .expect("seeded document must have an id")
            .to_string();
        let pk = canonical_partition_key(&document).expect("partition key must serialize");

        let mut state = self.state.lock().unwrap();
        let container = state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(container.to_string())
            .or_default();
        container.documents.insert((pk, id), document);
    }

    /// Make every listing call fail as unreachable.
    pub fn set_unreachable(&self) {
        self.state.lock().unwrap().unreachable = true;
    }

    /// Make `scan_all` fail for one container.
    pub fn fail_scan(&self, database: &str, container: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_scan
            .insert((database.to_string(), container.to_string()));
    }

    /// Make `upsert` fail for one document id.
    pub fn fail_upsert(&self, id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_upsert_ids
            .insert(id.to_string());
    }

    /// Make `delete_database` fail for one database.
    pub fn fail_delete(&self, database: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete
            .insert(database.to_string());
    }

    pub fn database_names(&self) -> Vec<String> {
        self.state.lock().unwrap().databases.keys().cloned().collect()
    }

    pub fn container_exists(&self, database: &str, container: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(database)
            .map(|db| db.contains_key(container))
            .unwrap_or(false)
    }

    pub fn partition_key_path(&self, database: &str, container: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(database)
            .and_then(|db| db.get(container))
            .map(|c| c.partition_key_path.clone())
    }

    /// All documents in one container, in key order.
    pub fn documents(&self, database: &str, container: &str) -> Vec<Document> {
        self.state
            .lock()
            .unwrap()
            .databases
            .get(database)
            .and_then(|db| db.get(container))
            .map(|c| c.documents.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(StoreError::Connectivity("store is unreachable".to_string()));
        }
        Ok(state.databases.keys().cloned().collect())
    }

    async fn list_containers(&self, database: &str) -> StoreResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.unreachable {
            return Err(StoreError::Connectivity("store is unreachable".to_string()));
        }
        state
            .databases
            .get(database)
            .map(|db| db.keys().cloned().collect())
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))
    }

    async fn create_database_if_absent(&self, database: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.databases.entry(database.to_string()).or_default();
        Ok(())
    }

    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let db = state
            .databases
            .get_mut(database)
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))?;
        db.entry(container.to_string())
            .or_insert_with(|| ContainerState {
                partition_key_path: partition_key_path.to_string(),
                documents: BTreeMap::new(),
            });
        Ok(())
    }

    async fn scan_all(&self, database: &str, container: &str) -> StoreResult<Vec<Document>> {
        let state = self.state.lock().unwrap();
        if state
            .fail_scan
            .contains(&(database.to_string(), container.to_string()))
        {
            return Err(StoreError::Injected(format!(
                "scan of {}/{} failed",
                database, container
            )));
        }
        state
            .databases
            .get(database)
            .and_then(|db| db.get(container))
            .map(|c| c.documents.values().cloned().collect())
            .ok_or_else(|| {
                StoreError::ContainerNotFound(database.to_string(), container.to_string())
            })
    }

    async fn upsert(
        &self,
        database: &str,
        container: &str,
        document: &Document,
    ) -> StoreResult<()> {
        let id = document
            .id()
            .ok_or_else(|| StoreError::DocumentRejected("missing id field".to_string()))?
            .to_string();
        let pk = canonical_partition_key(document)?;

        let mut state = self.state.lock().unwrap();
        if state.fail_upsert_ids.contains(&id) {
            return Err(StoreError::Injected(format!("upsert of {} failed", id)));
        }
        let target = state
            .databases
            .get_mut(database)
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))?
            .get_mut(container)
            .ok_or_else(|| {
                StoreError::ContainerNotFound(database.to_string(), container.to_string())
            })?;
        target.documents.insert((pk, id), document.clone());
        Ok(())
    }

    async fn delete_database(&self, database: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete.contains(database) {
            return Err(StoreError::Injected(format!(
                "delete of {} failed",
                database
            )));
        }
        state
            .databases
            .remove(database)
            .map(|_| ())
            .ok_or_else(|| StoreError::DatabaseNotFound(database.to_string()))
    }
}

#[derive(Default)]
struct ObjState {
    objects: BTreeMap<String, Vec<u8>>,
    fail_put_containing: Vec<String>,
}

/// In-memory [`ObjectStore`].
#[derive(Default)]
pub struct MemoryObjectStore {
    state: Mutex<ObjState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `put` fail for any key containing the fragment.
    pub fn fail_put_containing(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_put_containing
            .push(fragment.to_string());
    }

    /// Store an object directly, bypassing fault injection.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(key.to_string(), bytes);
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().objects.keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_put_containing.iter().any(|f| key.contains(f)) {
            return Err(StoreError::Injected(format!("put of {} failed", key)));
        }
        state.objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::ObjectNotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
