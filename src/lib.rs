//! # driftguard
//!
//! Deterministic allocation-drift detection and signed policy binding for
//! self-custodied multi-asset holdings.
//!
//! This crate holds the pure parts of the policy engine:
//!
//! - **Valuation**: balances to a common unit of account, 18-decimal fixed point
//! - **Imbalance detection**: current value shares vs targets ± a tolerance band
//! - **Typed-data hashing**: the canonical digest a holding key signs at setup
//! - **Signature recovery**: secp256k1 recovery of that digest's signer
//!
//! The stateful engine (setup lifecycle, role checks, trade execution,
//! administration) lives in `driftguard-engine`; the collaborator ports
//! (token ledger, price source, exchange venue) in `driftguard-ports`.
//!
//! ## Quick Start
//!
//! ```
//! use driftguard::{imbalance, price_unit, Address, AssetPolicy, ValuationSnapshot, U256};
//!
//! let dai = Address::repeat_byte(0xd1);
//! let eth = Address::repeat_byte(0xe7);
//! let one = price_unit();
//!
//! // 7000 DAI at $1, 3000 ETH-units at $1 against a 50/50 target
//! let snapshot = ValuationSnapshot::from_quotes([
//!     (dai, U256::from(7000u64) * one, one),
//!     (eth, U256::from(3000u64) * one, one),
//! ])
//! .unwrap();
//!
//! let policies = [AssetPolicy::new(dai, 5000), AssetPolicy::new(eth, 5000)];
//! assert!(imbalance::is_disbalanced(&snapshot, &policies, 500).unwrap());
//! ```
//!
//! ## Fixed-Point Arithmetic
//!
//! Amounts are [`U256`]. Every multiplication is checked and every division
//! truncates toward zero:
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | value | `balance * price / 10^18` |
//! | target value | `total * target_bps / 10000` |
//! | band | `total * tolerance_bps / 10000` |
//! | trade cap | `balance * max_trade_fraction_bps / 10000` |
//!
//! ## Setup Proofs
//!
//! ```
//! use driftguard::signature::{address_of, sign_setup, signing_key_from_hex, verify_setup_proof};
//! use driftguard::{Address, AssetPolicy, PolicyParams};
//!
//! let key = signing_key_from_hex(&"46".repeat(32)).unwrap();
//! let holding = address_of(key.verifying_key());
//! let params = PolicyParams {
//!     assets: vec![AssetPolicy::new(Address::repeat_byte(1), 10_000)],
//!     imbalance_tolerance_bps: 500,
//!     max_trade_fraction_bps: 100,
//!     venue: Address::repeat_byte(2),
//!     price_source: Address::repeat_byte(3),
//!     agent: Address::repeat_byte(4),
//!     administrator: Address::repeat_byte(5),
//! };
//!
//! let proof = sign_setup(&key, &params, &holding).unwrap();
//! assert!(verify_setup_proof(&params, &holding, &proof.to_bytes()).is_ok());
//! ```

mod error;
pub mod imbalance;
mod policy;
pub mod signature;
pub mod typed_data;
pub mod types;
pub mod valuation;

pub use error::{ArithmeticError, SignatureError};
pub use imbalance::{AssetDrift, Band, BandPosition};
pub use policy::{AssetPolicy, PolicyParams};
pub use signature::RecoverableSignature;
pub use types::{price_unit, Address, AddressParseError, Bps, BPS_DENOMINATOR, U256};
pub use valuation::{AssetValuation, ValuationSnapshot};
