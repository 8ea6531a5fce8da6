//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

/// cosback - backup, restore, and teardown for document database accounts
#[derive(Parser, Debug)]
#[command(name = "cosback")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Back up one container to a single snapshot
    Backup {
        /// Source database name
        #[arg(long)]
        database: String,

        /// Source container name
        #[arg(long)]
        container: String,
    },

    /// Back up every container across all databases in the account
    FullBackup,

    /// Replay the backup set for a source account and timestamp
    Restore {
        /// Backup timestamp (YYYY-MM-DD-HHMM)
        #[arg(long)]
        date: String,

        /// Account the backup was taken from
        #[arg(long)]
        source: String,

        /// Account to restore into
        #[arg(long)]
        destination: String,
    },

    /// Replay one backup file into a database and container of the
    /// configured account
    RestoreFile {
        /// Backup file name (backup_{database}_{container}_{timestamp}.json)
        #[arg(long)]
        file: String,

        /// Destination database name
        #[arg(long)]
        database: String,

        /// Destination container name
        #[arg(long)]
        container: String,
    },

    /// Delete every database in the configured account (destructive, no undo)
    Teardown,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
