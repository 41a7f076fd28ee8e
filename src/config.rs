//! Environment configuration: the recognized options a search run is tuned with.
//!
//! Mirrors the `batch_size` / `loglevel` / `deterministic` knobs from the
//! external interface, plus the resource limits that back `OutOfResources`.
//! `EnvironmentConfig::default()` reproduces sequential, non-deterministic,
//! unlimited-resource behavior (i.e. what [`crate::driver::LocalEnvironment`]
//! does with no tuning at all).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{MachetliError, Result};

/// Log verbosity for the driver and the evaluator shim. Passed explicitly
/// rather than read from ambient/global state, per the "process-wide log
/// level" design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Critical,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl LogLevel {
    /// Translate to a `tracing` level filter, once, at driver/shim construction.
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warning => tracing::Level::WARN,
            LogLevel::Critical => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Recognized environment configuration options (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Cap on concurrent evaluations per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Affects the shim's and driver's log output only.
    #[serde(default)]
    pub loglevel: LogLevel,
    /// Selects sequential-simulating mode.
    #[serde(default)]
    pub deterministic: bool,
    /// Per-candidate wall-clock budget. `None` means unenforced.
    #[serde(default, with = "duration_secs_opt")]
    pub wall_clock_limit: Option<Duration>,
    /// Accepted for forward compatibility; not enforced by either shipped
    /// environment (host-OS-specific disk accounting is out of scope here).
    #[serde(default)]
    pub disk_limit_bytes: Option<u64>,
}

fn default_batch_size() -> usize {
    1
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            loglevel: LogLevel::default(),
            deterministic: false,
            wall_clock_limit: None,
            disk_limit_bytes: None,
        }
    }
}

impl EnvironmentConfig {
    /// Load configuration from a TOML file on disk, falling back to documented
    /// defaults for any option left unspecified.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| MachetliError::CriticalError(format!("invalid config file: {e}")))
    }

    /// Load configuration from a JSON file on disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| MachetliError::CriticalError(format!("invalid config file: {e}")))
    }
}

/// Install a process-wide `tracing` subscriber at `level`. Call this once,
/// at process start (the driver and shim never touch ambient log state
/// themselves — see the "process-wide log level" design note).
pub fn init_tracing(level: LogLevel) {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.as_tracing_level());
    tracing_subscriber::fmt().with_max_level(filter).init();
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<u64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs))
    }
}
