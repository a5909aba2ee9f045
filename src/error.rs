//! Error types for valuation arithmetic and signature handling.

use crate::types::Address;

/// Fixed-point arithmetic failure.
///
/// All amount math is checked; an overflow is reported instead of wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

/// Failure to parse, recover or match a setup signature.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature must be 64 or 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery byte {0}")]
    InvalidRecoveryId(u8),

    #[error("signature s value is in the upper half of the curve order")]
    HighS,

    #[error("malformed signature: {0}")]
    Malformed(String),

    #[error("public key recovery failed")]
    RecoveryFailed,

    #[error("recovered signer {recovered} does not match {expected}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },

    #[error("invalid signing key")]
    InvalidKey,
}
