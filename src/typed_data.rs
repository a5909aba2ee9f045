//! Structured, domain-separated encoding of the setup parameters.
//!
//! The digest a holding key signs is built in three steps:
//!
//! 1. `assets_hash = keccak256(word(asset_0) ++ word(bps_0) ++ word(asset_1) ++ ...)`
//! 2. `struct_hash = keccak256(typehash ++ assets_hash ++ word(tolerance) ++ word(cap)
//!    ++ word(venue) ++ word(price_source) ++ word(agent) ++ word(administrator) ++ word(holding))`
//! 3. `digest = keccak256("\x19Ethereum Signed Message:\n32" ++ struct_hash)`
//!
//! where `word` is the 32-byte big-endian ABI encoding and `typehash` is the
//! keccak of [`POLICY_SETUP_TYPE`]. Including the holding's own address
//! stops a proof for one holding from being replayed against another.

use sha3::{Digest, Keccak256};

use crate::policy::{AssetPolicy, PolicyParams};
use crate::types::{uint_word, Address, U256};

/// Schema of one asset policy entry.
pub const ASSET_POLICY_TYPE: &str = "AssetPolicy(address asset,uint256 targetShareBps)";

/// Schema of the setup struct, followed by its referenced struct type.
pub const POLICY_SETUP_TYPE: &str = concat!(
    "PolicySetup(AssetPolicy[] assets,uint256 imbalanceToleranceBps,",
    "uint256 maxTradeFractionBps,address venue,address priceSource,",
    "address agent,address administrator,address holding)",
    "AssetPolicy(address asset,uint256 targetShareBps)"
);

/// Prefix of the personal-message envelope for a 32-byte payload.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// `keccak256(POLICY_SETUP_TYPE)`.
pub fn policy_setup_typehash() -> [u8; 32] {
    keccak256(POLICY_SETUP_TYPE.as_bytes())
}

/// Hash of the concatenated `(asset, target_share_bps)` pairs, in order.
pub fn assets_hash(assets: &[AssetPolicy]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for policy in assets {
        hasher.update(policy.asset.to_word());
        hasher.update(uint_word(U256::from(policy.target_share_bps)));
    }
    hasher.finalize().into()
}

/// Struct hash binding every parameter to `holding`.
pub fn setup_struct_hash(params: &PolicyParams, holding: &Address) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(policy_setup_typehash());
    hasher.update(assets_hash(&params.assets));
    hasher.update(uint_word(U256::from(params.imbalance_tolerance_bps)));
    hasher.update(uint_word(U256::from(params.max_trade_fraction_bps)));
    hasher.update(params.venue.to_word());
    hasher.update(params.price_source.to_word());
    hasher.update(params.agent.to_word());
    hasher.update(params.administrator.to_word());
    hasher.update(holding.to_word());
    hasher.finalize().into()
}

/// Wrap a 32-byte hash in the signed-message envelope.
pub fn eth_signed_message_hash(hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(hash);
    hasher.finalize().into()
}

/// The digest whose signature authorizes `params` for `holding`.
pub fn setup_digest(params: &PolicyParams, holding: &Address) -> [u8; 32] {
    eth_signed_message_hash(&setup_struct_hash(params, holding))
}
