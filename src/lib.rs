//! cosback - backup, restore, and teardown for document database accounts
//!
//! Walks an account → database → container → document hierarchy, writes
//! one immutable snapshot object per container into an object store, and
//! replays those snapshots idempotently into a possibly different
//! account. Built for CI: structured one-line JSON logs, exhaustive
//! configuration validation, and exit codes that distinguish total
//! success (0), an invocation that never started (1), and partial
//! per-item failure (2).

pub mod backup;
pub mod cli;
pub mod config;
pub mod naming;
pub mod observability;
pub mod report;
pub mod restore;
pub mod store;
pub mod teardown;
