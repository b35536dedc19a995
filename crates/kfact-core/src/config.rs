//! Configuration system for kfact.
//!
//! Resolution order: environment variables → config file → defaults.
//! Command-line flags, where a binary offers them, override all three.
//!
//! Config file location:
//!   1. $KFACT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/kfact/config.toml
//!   3. ~/.config/kfact/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::wire::DEFAULT_WORKER_PORT;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KfactConfig {
    pub coordinator: CoordinatorConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Per-server TCP connect timeout.
    pub connect_timeout_secs: u64,
    /// Per-server send and receive timeout, applied to each separately.
    pub io_timeout_secs: u64,
    /// Wall-clock budget for collecting every partial result.
    pub job_timeout_secs: u64,
    /// Largest `k` the sequential cross-check is run for.
    pub verify_max_k: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// TCP port the worker daemon listens on.
    pub port: u16,
    /// Local fan-out per request. 0 = available parallelism.
    pub threads: usize,
    /// How long a connection may take to deliver its 24-byte request.
    pub read_timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            io_timeout_secs: 10,
            job_timeout_secs: 30,
            verify_max_k: 10_000_000,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_WORKER_PORT,
            threads: 0,
            read_timeout_secs: 10,
        }
    }
}

impl CoordinatorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

impl WorkerConfig {
    /// Resolved thread count, never zero.
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.threads
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("kfact")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl KfactConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            KfactConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file without applying env overrides.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("KFACT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Apply KFACT_* overrides. Unparseable values are ignored with a warning.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parse_into<T: std::str::FromStr>(key: &str, value: Option<String>, slot: &mut T) {
            if let Some(v) = value {
                match v.trim().parse() {
                    Ok(parsed) => *slot = parsed,
                    Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable override"),
                }
            }
        }

        const CONNECT: &str = "KFACT_COORDINATOR__CONNECT_TIMEOUT_SECS";
        const IO: &str = "KFACT_COORDINATOR__IO_TIMEOUT_SECS";
        const JOB: &str = "KFACT_COORDINATOR__JOB_TIMEOUT_SECS";
        const VERIFY_MAX_K: &str = "KFACT_COORDINATOR__VERIFY_MAX_K";
        const PORT: &str = "KFACT_WORKER__PORT";
        const THREADS: &str = "KFACT_WORKER__THREADS";

        parse_into(CONNECT, lookup(CONNECT), &mut self.coordinator.connect_timeout_secs);
        parse_into(IO, lookup(IO), &mut self.coordinator.io_timeout_secs);
        parse_into(JOB, lookup(JOB), &mut self.coordinator.job_timeout_secs);
        parse_into(VERIFY_MAX_K, lookup(VERIFY_MAX_K), &mut self.coordinator.verify_max_k);
        parse_into(PORT, lookup(PORT), &mut self.worker.port);
        parse_into(THREADS, lookup(THREADS), &mut self.worker.threads);
    }
}
