//! Observability for cosback
//!
//! Every operation emits one structured log line per item visited and a
//! final summary line before the process exits. Logs are synchronous and
//! unbuffered so CI captures them even if the process dies mid-run.

mod logger;

pub use logger::{Logger, Severity};
