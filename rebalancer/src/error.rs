//! Error types for the rebalancer.

use std::path::PathBuf;

use driftguard::{ArithmeticError, SignatureError};
use driftguard_engine::PolicyError;

/// All errors that can occur during rebalancer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("holding file error: {0}")]
    Holding(String),

    #[error("failed to read holding file {path}: {source}")]
    HoldingRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write holding file {path}: {source}")]
    HoldingWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse holding JSON: {0}")]
    HoldingParse(#[from] serde_json::Error),

    #[error("signing key error: {0}")]
    Key(String),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("execution aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
