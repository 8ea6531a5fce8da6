use std::collections::BTreeSet;

use crate::naming::{BackupTimestamp, SnapshotKey};
use crate::observability::Logger;
use crate::store::{ObjectStore, StoreResult};

/// A snapshot object found in the store, with its parsed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub key: SnapshotKey,
    pub object_path: String,
}

/// Find every snapshot of one backup set (source account + timestamp).
///
/// Listing is prefix-scoped, then re-checked against the prefix and the
/// full naming scheme, so stores with loose `list` semantics still yield
/// only matching snapshots. Duplicate paths collapse to one reference.
/// No matches is an empty result, not an error.
pub async fn select(
    objects: &dyn ObjectStore,
    account: &str,
    timestamp: BackupTimestamp,
) -> StoreResult<Vec<SnapshotRef>> {
    let prefix = SnapshotKey::backup_set_prefix(account, timestamp);

    let mut seen = BTreeSet::new();
    let mut refs = Vec::new();
    for path in objects.list(&prefix).await? {
        if !path.starts_with(&prefix) || !seen.insert(path.clone()) {
            continue;
        }
        match SnapshotKey::parse(&path) {
            Ok(key) => refs.push(SnapshotRef {
                key,
                object_path: path,
            }),
            Err(e) => {
                let reason = e.to_string();
                Logger::warn(
                    "selector.skip",
                    &[("key", path.as_str()), ("reason", reason.as_str())],
                );
            }
        }
    }
    Ok(refs)
}
