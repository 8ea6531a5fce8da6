//! Command-line interface
//!
//! Four operations, one invocation each:
//! - `cosback backup --database D --container C`: one snapshot
//! - `cosback full-backup`: one snapshot per container in the account
//! - `cosback restore --date T --source A --destination B`: replay a
//!   backup set
//! - `cosback teardown`: delete every database in the account
//!
//! Exit status: 0 total success, 1 the invocation could not start
//! (configuration, usage, or connectivity), 2 one or more per-item
//! failures with the rest completed.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{execute, run};
pub use errors::{CliError, CliResult};
