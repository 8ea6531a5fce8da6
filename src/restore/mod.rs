//! Snapshot selection and restore
//!
//! Restore runs in two stages:
//!
//! 1. [`selector`]: find the backup set, every snapshot object whose key
//!    matches one (source account, timestamp) pair. Keys that do not
//!    parse under the naming scheme are skipped with a warning; an empty
//!    selection is a normal, reportable condition, not an error.
//! 2. [`applier`]: replay each snapshot into the destination account.
//!    Database and container names come from the snapshot's identity
//!    tuple, never from the destination, so a backup set moves between
//!    accounts unchanged. Replay is idempotent: every document is
//!    upserted by its own id and partition key, so running the same
//!    restore twice leaves the same document set as running it once.
//!
//! Single-file restore skips stage 1: the snapshot identity is
//! reconstructed from the file name and fed to the applier as a one-item
//! backup set.
//!
//! Nothing wraps the restore in a transaction. A document or container
//! failure is recovered at its own boundary and reported; partial
//! completion is an accepted, reported outcome.

mod applier;
mod selector;

pub use applier::{ApplierOptions, RestoreApplier};
pub use selector::{select, SnapshotRef};
