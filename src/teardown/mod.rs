//! Account teardown
//!
//! Deletes every database under an account. Destructive and without
//! undo; intended only for ephemeral and test accounts. Each database is
//! deleted independently: one failed deletion is logged and recorded,
//! the remaining databases are still attempted.

use crate::observability::Logger;
use crate::report::{ItemOutcome, OperationReport};
use crate::store::{DocumentStore, StoreResult};

/// Delete all databases in the account. Fails only when the database
/// list itself cannot be fetched.
pub async fn delete_all_databases(documents: &dyn DocumentStore) -> StoreResult<OperationReport> {
    let databases = documents.list_databases().await?;

    let mut report = OperationReport::new();
    for database in databases {
        match documents.delete_database(&database).await {
            Ok(()) => {
                Logger::info("teardown.database", &[("database", database.as_str())]);
                report.record(database, ItemOutcome::Succeeded);
            }
            Err(e) => {
                let error = e.to_string();
                Logger::error(
                    "teardown.database",
                    &[("database", database.as_str()), ("error", error.as_str())],
                );
                report.record(database, ItemOutcome::Failed(error));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryDocumentStore;
    use crate::store::Document;
    use serde_json::json;

    fn doc(id: &str) -> Document {
        Document::from_value(json!({"id": id, "partitionKey": "p"})).unwrap()
    }

    #[tokio::test]
    async fn test_deletes_every_database() {
        let store = MemoryDocumentStore::new();
        store.seed("x", "c", doc("1"));
        store.seed("y", "c", doc("2"));

        let report = delete_all_databases(&store).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(report.succeeded(), 2);
        assert!(store.database_names().is_empty());
    }

    #[tokio::test]
    async fn test_one_failed_deletion_does_not_block_the_rest() {
        let store = MemoryDocumentStore::new();
        store.seed("x", "c", doc("1"));
        store.seed("y", "c", doc("2"));
        store.fail_delete("x");

        let report = delete_all_databases(&store).await.unwrap();

        assert!(matches!(report.outcome("x"), Some(ItemOutcome::Failed(_))));
        assert_eq!(report.outcome("y"), Some(&ItemOutcome::Succeeded));
        assert_eq!(store.database_names(), vec!["x"]);
        assert_eq!(report.exit_code(), crate::report::EXIT_PARTIAL);
    }

    #[tokio::test]
    async fn test_empty_account_is_clean() {
        let store = MemoryDocumentStore::new();
        let report = delete_all_databases(&store).await.unwrap();
        assert!(report.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_unreachable_account_is_fatal() {
        let store = MemoryDocumentStore::new();
        store.set_unreachable();
        assert!(delete_all_databases(&store).await.is_err());
    }
}
