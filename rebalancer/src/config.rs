//! TOML configuration loading and validation.

use std::path::Path;

use driftguard::Address;
use driftguard_engine::Strictness;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub agent: AgentConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub strictness: Strictness,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The identity this rebalancer acts as.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub address: Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Most trades one run may execute.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Pause between trades.
    #[serde(default = "default_step_interval")]
    pub step_interval_ms: u64,
}

fn default_max_steps() -> usize {
    20
}
fn default_step_interval() -> u64 {
    0
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            step_interval_ms: default_step_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.agent.address.is_zero() {
            return Err(Error::Config("agent address must not be null".into()));
        }
        if self.execution.max_steps == 0 {
            return Err(Error::Config("max_steps must be > 0".into()));
        }
        if self.execution.max_steps > 10_000 {
            return Err(Error::Config("max_steps must be <= 10000".into()));
        }
        if self.logging.audit_file.is_empty() {
            return Err(Error::Config("audit_file must not be empty".into()));
        }
        Ok(())
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> std::path::PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
