//! secp256k1 signature recovery for setup proofs.
//!
//! A proof is accepted in either encoding of the same signature:
//!
//! - 65 bytes: `r ++ s ++ v`, with `v` in `{0, 1}` or `{27, 28}`
//! - 64 bytes: `r ++ vs`, where the top bit of `vs` carries the y parity
//!   and the remaining 255 bits are `s` (EIP-2098 compact form)
//!
//! Signatures with `s` in the upper half of the curve order are rejected so
//! that each logical signature has exactly one accepted `(r, s)` pair.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::SignatureError;
use crate::policy::PolicyParams;
use crate::typed_data::{keccak256, setup_digest};
use crate::types::Address;

/// A parsed `(r, s)` signature plus the y parity needed for key recovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Parse a 65-byte or 64-byte encoded signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let (rs, y_odd) = match bytes.len() {
            65 => {
                let y_odd = match bytes[64] {
                    0 | 27 => false,
                    1 | 28 => true,
                    other => return Err(SignatureError::InvalidRecoveryId(other)),
                };
                let mut rs = [0u8; 64];
                rs.copy_from_slice(&bytes[..64]);
                (rs, y_odd)
            }
            64 => {
                let mut rs = [0u8; 64];
                rs.copy_from_slice(bytes);
                let y_odd = rs[32] & 0x80 != 0;
                rs[32] &= 0x7f;
                (rs, y_odd)
            }
            n => return Err(SignatureError::InvalidLength(n)),
        };

        let signature =
            Signature::from_slice(&rs).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        // normalize_s returns Some only when s was in the upper half
        if signature.normalize_s().is_some() {
            return Err(SignatureError::HighS);
        }

        Ok(Self {
            signature,
            recovery_id: RecoveryId::new(y_odd, false),
        })
    }

    /// 65-byte `r ++ s ++ v` with `v` in `{27, 28}`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&self.signature.to_bytes());
        out[64] = 27 + u8::from(self.recovery_id.is_y_odd());
        out
    }

    /// 64-byte compact `r ++ vs` form.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out.copy_from_slice(&self.signature.to_bytes());
        if self.recovery_id.is_y_odd() {
            out[32] |= 0x80;
        }
        out
    }

    pub fn is_y_odd(&self) -> bool {
        self.recovery_id.is_y_odd()
    }

    /// Recover the signer address of a 32-byte prehashed digest.
    pub fn recover(&self, digest: &[u8; 32]) -> Result<Address, SignatureError> {
        let key = VerifyingKey::recover_from_prehash(digest, &self.signature, self.recovery_id)
            .map_err(|_| SignatureError::RecoveryFailed)?;
        Ok(address_of(&key))
    }
}

/// Address controlled by a public key: last 20 bytes of
/// `keccak256(uncompressed_point[1..])`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

/// Parse a 32-byte hex private key (with or without `0x`).
pub fn signing_key_from_hex(hex_key: &str) -> Result<SigningKey, SignatureError> {
    let trimmed = hex_key.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| SignatureError::InvalidKey)?;
    SigningKey::from_slice(&bytes).map_err(|_| SignatureError::InvalidKey)
}

/// Sign a prehashed digest, producing a low-`s` recoverable signature.
pub fn sign_digest(key: &SigningKey, digest: &[u8; 32]) -> Result<RecoverableSignature, SignatureError> {
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest)
        .map_err(|e| SignatureError::Malformed(e.to_string()))?;
    Ok(RecoverableSignature {
        signature,
        recovery_id,
    })
}

/// Produce the setup proof for `params` on behalf of `holding`.
pub fn sign_setup(
    key: &SigningKey,
    params: &PolicyParams,
    holding: &Address,
) -> Result<RecoverableSignature, SignatureError> {
    sign_digest(key, &setup_digest(params, holding))
}

/// Verify that `proof` was produced by the key controlling `holding` over
/// exactly `params`.
pub fn verify_setup_proof(
    params: &PolicyParams,
    holding: &Address,
    proof: &[u8],
) -> Result<(), SignatureError> {
    let signature = RecoverableSignature::from_bytes(proof)?;
    let recovered = signature.recover(&setup_digest(params, holding))?;
    if recovered != *holding {
        return Err(SignatureError::SignerMismatch {
            expected: *holding,
            recovered,
        });
    }
    Ok(())
}
