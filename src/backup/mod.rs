//! Snapshot writer
//!
//! Walks the database → container → document hierarchy of one account and
//! writes one snapshot object per container. A snapshot is the complete,
//! ordered document list of a container, serialized as a JSON array and
//! written in a single put, so each container's export is atomic as a
//! unit: either the whole object exists or nothing does.
//!
//! Failure isolation: an error exporting one container is caught at that
//! container's boundary, logged, and recorded in the aggregate report;
//! sibling containers are unaffected. Only a failure enumerating the
//! hierarchy itself (the account is unreachable) aborts the operation.

mod writer;

pub use writer::{BackupScope, SnapshotWriter, WriterOptions};
