//! Port error types.

use driftguard::{Address, ArithmeticError, U256};

/// Errors reported by a token ledger, price source or exchange venue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("insufficient {asset} balance for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        asset: Address,
        holder: Address,
        available: U256,
        required: U256,
    },

    #[error("insufficient {asset} allowance from {owner} to {spender}: have {available}, need {required}")]
    InsufficientAllowance {
        asset: Address,
        owner: Address,
        spender: Address,
        available: U256,
        required: U256,
    },

    #[error("no price for asset {0}")]
    NoPrice(Address),

    #[error("unknown price source {0}")]
    UnknownPriceSource(Address),

    #[error("unknown venue {0}")]
    UnknownVenue(Address),

    #[error("swap deadline {deadline} passed (now {now})")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("swap output {amount_out} below minimum {min_amount_out}")]
    InsufficientOutput {
        amount_out: U256,
        min_amount_out: U256,
    },

    #[error("swap rejected: {0}")]
    SwapRejected(String),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

pub type PortResult<T> = Result<T, PortError>;
