use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};

use crate::naming::{BackupTimestamp, SnapshotKey};
use crate::observability::Logger;
use crate::report::{ItemOutcome, OperationReport};
use crate::store::{DocumentStore, ObjectStore, StoreResult};

/// Which part of the account a backup run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupScope {
    /// Every container in every database (full-hierarchy export).
    Account,
    /// Every container in one database.
    Database(String),
    /// One container.
    Container { database: String, container: String },
}

impl BackupScope {
    /// Full-hierarchy exports use the account/timestamp object layout and
    /// tag documents with their source container; a single-container
    /// export writes one plainly named local object and skips tagging.
    fn is_full_hierarchy(&self) -> bool {
        !matches!(self, BackupScope::Container { .. })
    }
}

/// Knobs for the container fan-out.
#[derive(Debug, Clone, Copy)]
pub struct WriterOptions {
    /// Bounded worker pool width. 1 means strictly sequential.
    pub concurrency: usize,
    /// Overall deadline. On expiry no new container export starts;
    /// in-flight exports finish and report their real outcome.
    pub deadline: Option<Duration>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            concurrency: 1,
            deadline: None,
        }
    }
}

/// Exports container snapshots from one account into the object store.
pub struct SnapshotWriter<'a> {
    documents: &'a dyn DocumentStore,
    objects: &'a dyn ObjectStore,
    account: String,
    options: WriterOptions,
}

impl<'a> SnapshotWriter<'a> {
    pub fn new(
        documents: &'a dyn DocumentStore,
        objects: &'a dyn ObjectStore,
        account: impl Into<String>,
    ) -> Self {
        SnapshotWriter {
            documents,
            objects,
            account: account.into(),
            options: WriterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one backup. Fails only when the hierarchy itself cannot be
    /// enumerated; per-container errors land in the report.
    pub async fn run(
        &self,
        scope: &BackupScope,
        timestamp: BackupTimestamp,
    ) -> StoreResult<OperationReport> {
        let targets = self.enumerate(scope).await?;
        let full_hierarchy = scope.is_full_hierarchy();
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        let width = self.options.concurrency.max(1);

        let units = targets.into_iter().map(|(database, container)| {
            self.export_unit(database, container, timestamp, full_hierarchy, deadline)
        });
        let outcomes: Vec<(String, ItemOutcome)> =
            stream::iter(units).buffer_unordered(width).collect().await;

        let mut report = OperationReport::new();
        for (item, outcome) in outcomes {
            report.record(item, outcome);
        }
        Ok(report)
    }

    async fn enumerate(&self, scope: &BackupScope) -> StoreResult<Vec<(String, String)>> {
        match scope {
            BackupScope::Container {
                database,
                container,
            } => Ok(vec![(database.clone(), container.clone())]),
            BackupScope::Database(database) => {
                let containers = self.documents.list_containers(database).await?;
                Ok(containers
                    .into_iter()
                    .map(|c| (database.clone(), c))
                    .collect())
            }
            BackupScope::Account => {
                let mut targets = Vec::new();
                for database in self.documents.list_databases().await? {
                    for container in self.documents.list_containers(&database).await? {
                        targets.push((database.clone(), container));
                    }
                }
                Ok(targets)
            }
        }
    }

    async fn export_unit(
        &self,
        database: String,
        container: String,
        timestamp: BackupTimestamp,
        full_hierarchy: bool,
        deadline: Option<Instant>,
    ) -> (String, ItemOutcome) {
        let item = format!("{}/{}", database, container);

        if deadline.is_some_and(|d| Instant::now() >= d) {
            Logger::error(
                "backup.container",
                &[
                    ("container", item.as_str()),
                    ("error", "deadline expired before export started"),
                ],
            );
            return (item, ItemOutcome::TimedOut);
        }

        match self
            .export_container(&database, &container, timestamp, full_hierarchy)
            .await
        {
            Ok(count) => {
                let count = count.to_string();
                Logger::info(
                    "backup.container",
                    &[("container", item.as_str()), ("documents", count.as_str())],
                );
                (item, ItemOutcome::Succeeded)
            }
            Err(e) => {
                let error = e.to_string();
                Logger::error(
                    "backup.container",
                    &[("container", item.as_str()), ("error", error.as_str())],
                );
                (item, ItemOutcome::Failed(error))
            }
        }
    }

    /// Export one container: scan everything, tag provenance, write the
    /// whole document list as one object.
    async fn export_container(
        &self,
        database: &str,
        container: &str,
        timestamp: BackupTimestamp,
        full_hierarchy: bool,
    ) -> StoreResult<usize> {
        let mut documents = self.documents.scan_all(database, container).await?;
        if full_hierarchy {
            for document in &mut documents {
                document.tag_container(container);
            }
        }

        let key = SnapshotKey::new(&self.account, database, container, timestamp);
        let object_key = if full_hierarchy {
            key.object_key()
        } else {
            key.local_file_name()
        };

        let body = serde_json::to_vec(&documents)?;
        self.objects.put(&object_key, &body).await?;
        Ok(documents.len())
    }
}
