use std::time::{Duration, Instant};

use futures_util::stream::{self, StreamExt};

use crate::observability::Logger;
use crate::report::{ItemOutcome, OperationReport};
use crate::store::{DocumentStore, ObjectStore, StoreResult, PARTITION_KEY_PATH};

use super::SnapshotRef;

/// Knobs for the container fan-out, mirroring the writer's.
#[derive(Debug, Clone, Copy)]
pub struct ApplierOptions {
    pub concurrency: usize,
    pub deadline: Option<Duration>,
}

impl Default for ApplierOptions {
    fn default() -> Self {
        ApplierOptions {
            concurrency: 1,
            deadline: None,
        }
    }
}

/// Replays a backup set into a destination account.
pub struct RestoreApplier<'a> {
    destination: &'a dyn DocumentStore,
    objects: &'a dyn ObjectStore,
    options: ApplierOptions,
}

impl<'a> RestoreApplier<'a> {
    pub fn new(destination: &'a dyn DocumentStore, objects: &'a dyn ObjectStore) -> Self {
        RestoreApplier {
            destination,
            objects,
            options: ApplierOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ApplierOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply every snapshot. Each snapshot is one independent unit; the
    /// report is keyed by `database/container`.
    pub async fn run(&self, snapshots: &[SnapshotRef]) -> OperationReport {
        let deadline = self.options.deadline.map(|d| Instant::now() + d);
        let width = self.options.concurrency.max(1);

        let units = snapshots
            .iter()
            .map(|snapshot| self.apply_unit(snapshot, deadline));
        let outcomes: Vec<(String, ItemOutcome)> =
            stream::iter(units).buffer_unordered(width).collect().await;

        let mut report = OperationReport::new();
        for (item, outcome) in outcomes {
            report.record(item, outcome);
        }
        report
    }

    async fn apply_unit(
        &self,
        snapshot: &SnapshotRef,
        deadline: Option<Instant>,
    ) -> (String, ItemOutcome) {
        let item = format!("{}/{}", snapshot.key.database, snapshot.key.container);

        if deadline.is_some_and(|d| Instant::now() >= d) {
            Logger::error(
                "restore.container",
                &[
                    ("container", item.as_str()),
                    ("error", "deadline expired before restore started"),
                ],
            );
            return (item, ItemOutcome::TimedOut);
        }

        match self.apply_snapshot(snapshot).await {
            Ok((applied, 0)) => {
                let applied = applied.to_string();
                Logger::info(
                    "restore.container",
                    &[("container", item.as_str()), ("documents", applied.as_str())],
                );
                (item, ItemOutcome::Succeeded)
            }
            Ok((applied, failed)) => {
                let error = format!("{} of {} documents failed", failed, applied + failed);
                Logger::error(
                    "restore.container",
                    &[("container", item.as_str()), ("error", error.as_str())],
                );
                (item, ItemOutcome::Failed(error))
            }
            Err(e) => {
                // Fetch, deserialization, or create-if-absent failed;
                // only this snapshot's restoration is abandoned.
                let error = e.to_string();
                Logger::error(
                    "restore.container",
                    &[("container", item.as_str()), ("error", error.as_str())],
                );
                (item, ItemOutcome::Failed(error))
            }
        }
    }

    /// Returns (documents applied, documents failed).
    async fn apply_snapshot(&self, snapshot: &SnapshotRef) -> StoreResult<(usize, usize)> {
        let bytes = self.objects.get(&snapshot.object_path).await?;
        let documents: Vec<crate::store::Document> = serde_json::from_slice(&bytes)?;

        // Destination names come from the snapshot identity, never from
        // the destination account.
        let database = &snapshot.key.database;
        let container = &snapshot.key.container;

        self.destination.create_database_if_absent(database).await?;
        self.destination
            .create_container_if_absent(database, container, PARTITION_KEY_PATH)
            .await?;

        let mut failed = 0usize;
        for document in &documents {
            if let Err(e) = self.destination.upsert(database, container, document).await {
                failed += 1;
                let error = e.to_string();
                Logger::error(
                    "restore.document",
                    &[
                        ("container", container.as_str()),
                        ("database", database.as_str()),
                        ("error", error.as_str()),
                        ("id", document.id().unwrap_or("<missing>")),
                    ],
                );
            }
        }
        Ok((documents.len() - failed, failed))
    }
}
