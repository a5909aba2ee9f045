//! Policy engine errors.

use driftguard::{Address, ArithmeticError, SignatureError, U256};
use driftguard_ports::PortError;

use crate::gate::Role;

/// Every way a policy operation can fail. A failed operation leaves no
/// partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy is already initialized")]
    AlreadyInitialized,

    #[error("policy is not initialized")]
    NotInitialized,

    #[error("authorization failed: {0}")]
    AuthorizationFailure(String),

    #[error("{caller} is not the {role}")]
    Unauthorized { role: Role, caller: Address },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("trade of {amount_in} exceeds cap of {cap}")]
    TradeTooLarge { amount_in: U256, cap: U256 },

    #[error("valuation failed: {0}")]
    ValuationFailure(String),

    #[error("transfer failed: {0}")]
    TransferFailure(#[source] PortError),
}

pub type Result<T> = std::result::Result<T, PolicyError>;

impl From<ArithmeticError> for PolicyError {
    fn from(e: ArithmeticError) -> Self {
        PolicyError::ValuationFailure(e.to_string())
    }
}

impl From<SignatureError> for PolicyError {
    fn from(e: SignatureError) -> Self {
        PolicyError::AuthorizationFailure(e.to_string())
    }
}

impl From<PortError> for PolicyError {
    fn from(e: PortError) -> Self {
        PolicyError::TransferFailure(e)
    }
}
