//! CLI command implementations
//!
//! `run` is the whole program: parse arguments, build the runtime, load
//! configuration, execute one operation, map the outcome to an exit
//! status. Components receive their stores and configuration explicitly;
//! nothing here reads the environment except `Config::from_env`.

use crate::backup::{BackupScope, SnapshotWriter, WriterOptions};
use crate::config::Config;
use crate::naming::{BackupTimestamp, SnapshotKey};
use crate::observability::Logger;
use crate::report::{OperationReport, EXIT_FATAL};
use crate::restore::{select, ApplierOptions, RestoreApplier, SnapshotRef};
use crate::store::fs::{FsDocumentStore, FsObjectStore};
use crate::teardown;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments, run one operation, return the process exit status.
pub fn run() -> i32 {
    let cli = Cli::parse_args();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = e.to_string();
            Logger::fatal("runtime.failed", &[("error", error.as_str())]);
            return EXIT_FATAL;
        }
    };

    // Commands that act on the configured account fold its absence into
    // the same configuration error as the missing roots.
    let require_account = matches!(
        cli.command,
        Command::Backup { .. }
            | Command::FullBackup
            | Command::RestoreFile { .. }
            | Command::Teardown
    );

    let result = runtime.block_on(async {
        let config = Config::from_env(require_account)?;
        execute(&config, cli.command).await
    });

    match result {
        Ok(report) => report.exit_code(),
        Err(e) => {
            let error = e.to_string();
            Logger::fatal("invocation.failed", &[("error", error.as_str())]);
            EXIT_FATAL
        }
    }
}

/// Execute one operation against the configured stores.
pub async fn execute(config: &Config, command: Command) -> CliResult<OperationReport> {
    match command {
        Command::Backup {
            database,
            container,
        } => {
            backup(
                config,
                BackupScope::Container {
                    database,
                    container,
                },
            )
            .await
        }
        Command::FullBackup => backup(config, BackupScope::Account).await,
        Command::Restore {
            date,
            source,
            destination,
        } => restore(config, &date, &source, &destination).await,
        Command::RestoreFile {
            file,
            database,
            container,
        } => restore_file(config, &file, &database, &container).await,
        Command::Teardown => teardown_account(config).await,
    }
}

async fn backup(config: &Config, scope: BackupScope) -> CliResult<OperationReport> {
    let account = config.require_account()?;
    let documents = FsDocumentStore::open(&config.data_root, account);
    let objects = FsObjectStore::new(&config.backup_root);

    let timestamp = BackupTimestamp::now();
    let rendered = timestamp.to_string();
    Logger::info(
        "backup.start",
        &[("account", account), ("timestamp", rendered.as_str())],
    );

    let options = WriterOptions {
        concurrency: config.concurrency,
        deadline: config.deadline,
    };
    let report = SnapshotWriter::new(&documents, &objects, account)
        .with_options(options)
        .run(&scope, timestamp)
        .await?;

    report.log_summary("backup");
    Ok(report)
}

async fn restore(
    config: &Config,
    date: &str,
    source: &str,
    destination: &str,
) -> CliResult<OperationReport> {
    let timestamp = BackupTimestamp::parse(date)
        .map_err(|e| CliError::Usage(format!("--date {}: {}", date, e)))?;

    let objects = FsObjectStore::new(&config.backup_root);
    let snapshots = select(&objects, source, timestamp).await?;

    let count = snapshots.len().to_string();
    Logger::info(
        "restore.start",
        &[
            ("destination", destination),
            ("snapshots", count.as_str()),
            ("source", source),
            ("timestamp", date),
        ],
    );

    // No backups for this account and timestamp is a normal outcome
    if snapshots.is_empty() {
        Logger::warn(
            "restore.empty",
            &[("source", source), ("timestamp", date)],
        );
        return Ok(OperationReport::new());
    }

    let destination_store = FsDocumentStore::open(&config.data_root, destination);
    let options = ApplierOptions {
        concurrency: config.concurrency,
        deadline: config.deadline,
    };
    let report = RestoreApplier::new(&destination_store, &objects)
        .with_options(options)
        .run(&snapshots)
        .await;

    report.log_summary("restore");
    Ok(report)
}

async fn restore_file(
    config: &Config,
    file: &str,
    database: &str,
    container: &str,
) -> CliResult<OperationReport> {
    let account = config.require_account()?;
    let key = SnapshotKey::parse_local(file, account, database, container)
        .map_err(|e| CliError::Usage(format!("--file {}: {}", file, e)))?;

    Logger::info(
        "restore.start",
        &[
            ("container", container),
            ("database", database),
            ("destination", account),
            ("file", file),
        ],
    );

    let objects = FsObjectStore::new(&config.backup_root);
    let destination = FsDocumentStore::open(&config.data_root, account);
    let snapshot = SnapshotRef {
        key,
        object_path: file.to_string(),
    };
    let options = ApplierOptions {
        concurrency: config.concurrency,
        deadline: config.deadline,
    };
    let report = RestoreApplier::new(&destination, &objects)
        .with_options(options)
        .run(std::slice::from_ref(&snapshot))
        .await;

    report.log_summary("restore");
    Ok(report)
}

async fn teardown_account(config: &Config) -> CliResult<OperationReport> {
    let account = config.require_account()?;
    let documents = FsDocumentStore::open(&config.data_root, account);

    Logger::info("teardown.start", &[("account", account)]);
    let report = teardown::delete_all_databases(&documents).await?;

    report.log_summary("teardown");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::report::{EXIT_PARTIAL, EXIT_SUCCESS};
    use crate::store::{Document, DocumentStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, account: Option<&str>) -> Config {
        Config {
            data_root: dir.path().join("data"),
            backup_root: dir.path().join("backups"),
            account: account.map(String::from),
            concurrency: 1,
            deadline: None,
        }
    }

    async fn seed_account(config: &Config, account: &str) {
        let store = FsDocumentStore::open(&config.data_root, account);
        store.create_database_if_absent("sales").await.unwrap();
        store
            .create_container_if_absent("sales", "orders", "/partitionKey")
            .await
            .unwrap();
        store
            .upsert(
                "sales",
                "orders",
                &Document::from_value(json!({"id": "1", "partitionKey": "p", "v": 7})).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_backup_requires_account() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None);

        let err = execute(&config, Command::FullBackup).await.unwrap_err();
        let CliError::Config(ConfigError::Missing(names)) = err else {
            panic!("expected missing configuration");
        };
        assert_eq!(names, vec![crate::config::ENV_ACCOUNT.to_string()]);
    }

    #[tokio::test]
    async fn test_full_backup_then_restore_into_other_account() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));
        seed_account(&config, "acct1").await;

        let report = execute(&config, Command::FullBackup).await.unwrap();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);

        // Find the timestamp the backup ran under from the object key
        let objects = FsObjectStore::new(&config.backup_root);
        let keys = crate::store::ObjectStore::list(&objects, "acct1/").await.unwrap();
        assert_eq!(keys.len(), 1);
        let date = crate::naming::SnapshotKey::parse(&keys[0])
            .unwrap()
            .timestamp
            .to_string();

        let report = execute(
            &config,
            Command::Restore {
                date,
                source: "acct1".to_string(),
                destination: "acct2".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);

        let restored = FsDocumentStore::open(&config.data_root, "acct2");
        let docs = restored.scan_all("sales", "orders").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), Some("1"));
        assert_eq!(docs[0].container_name(), Some("orders"));
    }

    #[tokio::test]
    async fn test_restore_without_backups_is_clean_zero_work() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None);

        let report = execute(
            &config,
            Command::Restore {
                date: "2026-08-27-0930".to_string(),
                source: "acct1".to_string(),
                destination: "acct2".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(report.is_empty());
        assert_eq!(report.exit_code(), EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_restore_rejects_bad_date() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None);

        let err = execute(
            &config,
            Command::Restore {
                date: "yesterday".to_string(),
                source: "acct1".to_string(),
                destination: "acct2".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn test_backup_of_unreachable_account_is_fatal() {
        let dir = TempDir::new().unwrap();
        // Account directory was never created
        let config = test_config(&dir, Some("ghost"));

        let err = execute(&config, Command::FullBackup).await.unwrap_err();
        assert!(matches!(err, CliError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_teardown_deletes_databases() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));
        seed_account(&config, "acct1").await;

        let report = execute(&config, Command::Teardown).await.unwrap();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);

        let store = FsDocumentStore::open(&config.data_root, "acct1");
        assert!(store.list_databases().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_container_backup_writes_local_name() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));
        seed_account(&config, "acct1").await;

        let report = execute(
            &config,
            Command::Backup {
                database: "sales".to_string(),
                container: "orders".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);

        let objects = FsObjectStore::new(&config.backup_root);
        let keys = crate::store::ObjectStore::list(&objects, "backup_sales_orders_")
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn test_single_container_backup_round_trips_through_restore_file() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));
        seed_account(&config, "acct1").await;

        execute(
            &config,
            Command::Backup {
                database: "sales".to_string(),
                container: "orders".to_string(),
            },
        )
        .await
        .unwrap();

        let objects = FsObjectStore::new(&config.backup_root);
        let keys = crate::store::ObjectStore::list(&objects, "backup_sales_orders_")
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);

        // Replay the file into a different account sharing the stores
        let restore_config = test_config(&dir, Some("acct2"));
        let report = execute(
            &restore_config,
            Command::RestoreFile {
                file: keys[0].clone(),
                database: "sales".to_string(),
                container: "orders".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(report.exit_code(), EXIT_SUCCESS);

        let restored = FsDocumentStore::open(&config.data_root, "acct2");
        let docs = restored.scan_all("sales", "orders").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id(), Some("1"));
        assert_eq!(docs[0].get("v"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn test_restore_file_rejects_name_for_other_container() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));

        let err = execute(
            &config,
            Command::RestoreFile {
                file: "backup_sales_orders_2026-08-27-0930.json".to_string(),
                database: "hr".to_string(),
                container: "people".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[tokio::test]
    async fn test_restore_file_requires_account() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, None);

        let err = execute(
            &config,
            Command::RestoreFile {
                file: "backup_sales_orders_2026-08-27-0930.json".to_string(),
                database: "sales".to_string(),
                container: "orders".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Missing(_))));
    }

    #[tokio::test]
    async fn test_partial_backup_maps_to_exit_partial() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, Some("acct1"));
        seed_account(&config, "acct1").await;

        // A second, unreadable container: a file where a directory of
        // documents should be breaks that container's scan only.
        let store = FsDocumentStore::open(&config.data_root, "acct1");
        store.create_database_if_absent("hr").await.unwrap();
        store
            .create_container_if_absent("hr", "people", "/partitionKey")
            .await
            .unwrap();
        tokio::fs::write(
            config.data_root.join("acct1/hr/people/broken.json"),
            b"not valid json",
        )
        .await
        .unwrap();

        let report = execute(&config, Command::FullBackup).await.unwrap();
        assert_eq!(report.exit_code(), EXIT_PARTIAL);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }
}
