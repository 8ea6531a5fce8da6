//! cosback CLI entry point
//!
//! Minimal entrypoint: argument parsing, configuration, and dispatch all
//! live in the cli module. main only forwards the mapped exit status.

use cosback::cli;

fn main() {
    std::process::exit(cli::run());
}
