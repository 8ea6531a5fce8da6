//! Runtime configuration
//!
//! All settings come from the environment, which is how CI pipelines
//! inject them. The whole set is read and validated once at startup;
//! components receive the resulting struct by reference and never touch
//! the environment themselves.
//!
//! Validation is exhaustive: every missing required value is collected
//! and reported in one error, so an operator fixes the pipeline in one
//! pass instead of replaying it once per missing variable.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Root directory of the document store (one subdirectory per account).
pub const ENV_DATA_ROOT: &str = "COSBACK_DATA_ROOT";
/// Root directory of the snapshot object store.
pub const ENV_BACKUP_ROOT: &str = "COSBACK_BACKUP_ROOT";
/// Account identity for backup, teardown, and single-file restore
/// (backup-set restore names its accounts on the command line).
pub const ENV_ACCOUNT: &str = "COSBACK_ACCOUNT";
/// Container fan-out width; defaults to 1 (strictly sequential).
pub const ENV_CONCURRENCY: &str = "COSBACK_CONCURRENCY";
/// Overall deadline in seconds; unset means no deadline.
pub const ENV_DEADLINE_SECS: &str = "COSBACK_DEADLINE_SECS";

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal configuration problems, raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Every missing required setting, not just the first.
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {name}: {value} ({reason})")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub backup_root: PathBuf,
    pub account: Option<String>,
    pub concurrency: usize,
    pub deadline: Option<Duration>,
}

impl Config {
    /// Load from the process environment. `require_account` marks the
    /// account variable required for this invocation, so an account-less
    /// pipeline learns about it in the same error as the other gaps.
    pub fn from_env(require_account: bool) -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), require_account)
    }

    /// Load from an arbitrary lookup function. Empty values count as
    /// missing; CI systems routinely export blank variables.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        require_account: bool,
    ) -> ConfigResult<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_root = get(ENV_DATA_ROOT);
        let backup_root = get(ENV_BACKUP_ROOT);
        let account = get(ENV_ACCOUNT);

        let mut missing = Vec::new();
        if data_root.is_none() {
            missing.push(ENV_DATA_ROOT.to_string());
        }
        if backup_root.is_none() {
            missing.push(ENV_BACKUP_ROOT.to_string());
        }
        if require_account && account.is_none() {
            missing.push(ENV_ACCOUNT.to_string());
        }

        match (data_root, backup_root) {
            (Some(data_root), Some(backup_root)) if missing.is_empty() => {
                let concurrency = match get(ENV_CONCURRENCY) {
                    None => 1,
                    Some(raw) => parse_positive(ENV_CONCURRENCY, &raw)?,
                };
                let deadline = match get(ENV_DEADLINE_SECS) {
                    None => None,
                    Some(raw) => Some(Duration::from_secs(
                        parse_positive(ENV_DEADLINE_SECS, &raw)? as u64,
                    )),
                };

                Ok(Config {
                    data_root: PathBuf::from(data_root),
                    backup_root: PathBuf::from(backup_root),
                    account,
                    concurrency,
                    deadline,
                })
            }
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    /// The configured account, for callers holding a config loaded
    /// without the account requirement.
    pub fn require_account(&self) -> ConfigResult<&str> {
        self.account
            .as_deref()
            .ok_or_else(|| ConfigError::Missing(vec![ENV_ACCOUNT.to_string()]))
    }
}

fn parse_positive(name: &str, raw: &str) -> ConfigResult<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}
