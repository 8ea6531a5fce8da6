//! Filesystem-backed store implementations
//!
//! These back the CLI when no remote services are wired in, and keep the
//! whole engine runnable end to end on a local disk:
//!
//! - [`FsDocumentStore`]: one directory per account under a data root,
//!   one directory per database, one per container, one JSON file per
//!   document. Container metadata (the partition key path) lives in a
//!   dotfile inside the container directory.
//! - [`FsObjectStore`]: snapshot keys map directly to relative file
//!   paths under a backup root.
//!
//! Writes go through a temp file followed by a rename, so a snapshot
//! object is either fully present or absent; readers never observe a
//! half-written object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Document, DocumentStore, ObjectStore, StoreError, StoreResult};

const CONTAINER_META_FILE: &str = ".container.json";

/// Per-container metadata persisted alongside its documents.
#[derive(Debug, Serialize, Deserialize)]
struct ContainerMeta {
    partition_key_path: String,
}

fn checked_name(name: &str) -> StoreResult<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('.')
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(name)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Io(format!("no parent directory: {}", path.display())))?;
    tokio::fs::create_dir_all(parent).await?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?;
    let tmp = parent.join(format!(".tmp-{}", file_name));

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

async fn list_dirs(path: &Path) -> StoreResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(path).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Document store rooted at `{data_root}/{account}`.
///
/// Documents are keyed by `id` alone within a container; the filesystem
/// backend requires ids to be unique per container.
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn open(data_root: &Path, account: &str) -> Self {
        FsDocumentStore {
            root: data_root.join(account),
        }
    }

    fn database_path(&self, database: &str) -> StoreResult<PathBuf> {
        Ok(self.root.join(checked_name(database)?))
    }

    fn container_path(&self, database: &str, container: &str) -> StoreResult<PathBuf> {
        Ok(self.database_path(database)?.join(checked_name(container)?))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn list_databases(&self) -> StoreResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(StoreError::Connectivity(format!(
                "account directory not found: {}",
                self.root.display()
            )));
        }
        list_dirs(&self.root).await
    }

    async fn list_containers(&self, database: &str) -> StoreResult<Vec<String>> {
        let path = self.database_path(database)?;
        if !path.is_dir() {
            return Err(StoreError::DatabaseNotFound(database.to_string()));
        }
        list_dirs(&path).await
    }

    async fn create_database_if_absent(&self, database: &str) -> StoreResult<()> {
        tokio::fs::create_dir_all(self.database_path(database)?).await?;
        Ok(())
    }

    async fn create_container_if_absent(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> StoreResult<()> {
        let path = self.container_path(database, container)?;
        tokio::fs::create_dir_all(&path).await?;

        let meta_path = path.join(CONTAINER_META_FILE);
        if !meta_path.is_file() {
            let meta = ContainerMeta {
                partition_key_path: partition_key_path.to_string(),
            };
            write_atomic(&meta_path, &serde_json::to_vec(&meta)?).await?;
        }
        Ok(())
    }

    async fn scan_all(&self, database: &str, container: &str) -> StoreResult<Vec<Document>> {
        let path = self.container_path(database, container)?;
        if !path.is_dir() {
            return Err(StoreError::ContainerNotFound(
                database.to_string(),
                container.to_string(),
            ));
        }

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with('.') || !name.ends_with(".json") {
                continue;
            }
            files.push(entry.path());
        }
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let bytes = tokio::fs::read(&file).await?;
            documents.push(serde_json::from_slice(&bytes)?);
        }
        Ok(documents)
    }

    async fn upsert(
        &self,
        database: &str,
        container: &str,
        document: &Document,
    ) -> StoreResult<()> {
        let id = document
            .id()
            .ok_or_else(|| StoreError::DocumentRejected("missing id field".to_string()))?;
        checked_name(id)?;

        let path = self.container_path(database, container)?;
        if !path.is_dir() {
            return Err(StoreError::ContainerNotFound(
                database.to_string(),
                container.to_string(),
            ));
        }

        write_atomic(
            &path.join(format!("{}.json", id)),
            &serde_json::to_vec(document)?,
        )
        .await
    }

    async fn delete_database(&self, database: &str) -> StoreResult<()> {
        let path = self.database_path(database)?;
        if !path.is_dir() {
            return Err(StoreError::DatabaseNotFound(database.to_string()));
        }
        tokio::fs::remove_dir_all(&path).await?;
        Ok(())
    }
}

/// Object store mapping keys to relative paths under a backup root.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: &Path) -> Self {
        FsObjectStore {
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StoreError::InvalidName(key.to_string()));
        }
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(StoreError::InvalidName(key.to_string()));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        write_atomic(&self.resolve(key)?, bytes).await
    }

    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        match tokio::fs::read(self.resolve(key)?).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::ObjectNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        // An empty root is an empty store, not an error
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(rel) = path.strip_prefix(&self.root) else { continue };
                let segments: Vec<&str> = rel
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect();
                // Skip in-flight temp files
                if segments.iter().any(|s| s.starts_with(".tmp-")) {
                    continue;
                }

                let key = segments.join("/");
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(value: serde_json::Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_object_store_put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("acct/2026-08-27-0930/db/c/x.json", b"[1,2]").await.unwrap();
        let bytes = store.get("acct/2026-08-27-0930/db/c/x.json").await.unwrap();
        assert_eq!(bytes, b"[1,2]");
    }

    #[tokio::test]
    async fn test_object_store_get_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        let err = store.get("nope/x.json").await.unwrap_err();
        assert!(matches!(err, StoreError::ObjectNotFound(_)));
    }

    #[tokio::test]
    async fn test_object_store_list_filters_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        store.put("acct1/t1/a.json", b"{}").await.unwrap();
        store.put("acct1/t2/b.json", b"{}").await.unwrap();
        store.put("acct2/t1/c.json", b"{}").await.unwrap();

        let keys = store.list("acct1/t1/").await.unwrap();
        assert_eq!(keys, vec!["acct1/t1/a.json".to_string()]);

        let all = store.list("").await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_object_store_list_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(&dir.path().join("never-created"));
        assert!(store.list("acct1/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_object_store_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        assert!(store.put("../escape.json", b"{}").await.is_err());
        assert!(store.put("/absolute.json", b"{}").await.is_err());
        assert!(store.put("a//b.json", b"{}").await.is_err());
    }

    #[tokio::test]
    async fn test_document_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "acct1");

        store.create_database_if_absent("sales").await.unwrap();
        store
            .create_container_if_absent("sales", "orders", "/partitionKey")
            .await
            .unwrap();

        let d = doc(json!({"id": "1", "partitionKey": "p", "v": 7}));
        store.upsert("sales", "orders", &d).await.unwrap();

        assert_eq!(store.list_databases().await.unwrap(), vec!["sales"]);
        assert_eq!(store.list_containers("sales").await.unwrap(), vec!["orders"]);
        assert_eq!(store.scan_all("sales", "orders").await.unwrap(), vec![d]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "acct1");
        store.create_database_if_absent("db").await.unwrap();
        store
            .create_container_if_absent("db", "c", "/partitionKey")
            .await
            .unwrap();

        store
            .upsert("db", "c", &doc(json!({"id": "1", "v": 1})))
            .await
            .unwrap();
        store
            .upsert("db", "c", &doc(json!({"id": "1", "v": 2})))
            .await
            .unwrap();

        let docs = store.scan_all("db", "c").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("v"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_upsert_rejects_missing_id() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "acct1");
        store.create_database_if_absent("db").await.unwrap();
        store
            .create_container_if_absent("db", "c", "/partitionKey")
            .await
            .unwrap();

        let err = store
            .upsert("db", "c", &doc(json!({"v": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentRejected(_)));
    }

    #[tokio::test]
    async fn test_list_databases_without_account_dir_is_connectivity() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "ghost");

        let err = store.list_databases().await.unwrap_err();
        assert!(matches!(err, StoreError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_scan_skips_container_metadata() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "acct1");
        store.create_database_if_absent("db").await.unwrap();
        store
            .create_container_if_absent("db", "c", "/partitionKey")
            .await
            .unwrap();

        assert!(store.scan_all("db", "c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_database_removes_everything() {
        let dir = TempDir::new().unwrap();
        let store = FsDocumentStore::open(dir.path(), "acct1");
        store.create_database_if_absent("db").await.unwrap();
        store
            .create_container_if_absent("db", "c", "/partitionKey")
            .await
            .unwrap();

        store.delete_database("db").await.unwrap();
        assert!(store.list_databases().await.unwrap().is_empty());

        let err = store.delete_database("db").await.unwrap_err();
        assert!(matches!(err, StoreError::DatabaseNotFound(_)));
    }
}
