//! Collaborator ports for driftguard.
//!
//! The policy engine never talks to a ledger, price feed or exchange
//! directly. It sees them through these traits:
//!
//! - [`TokenLedger`]: balances, allowances and transfers of fungible assets
//! - [`PriceSource`]: unit prices at 18-decimal fixed point
//! - [`ExchangeVenue`]: exact-input swaps along a path
//! - [`Host`]: the environment a holding lives in, resolving price sources
//!   and venues by identity
//!
//! [`local::LocalHost`] implements all of them in memory for tests and
//! paper runs.

pub mod error;
pub mod local;
pub mod types;

pub use error::{PortError, PortResult};
pub use types::*;

use driftguard::{Address, U256};

/// Fungible-asset ledger with standard approve/transfer semantics.
pub trait TokenLedger {
    fn balance_of(&self, asset: &Address, holder: &Address) -> PortResult<U256>;

    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> PortResult<U256>;

    /// Set (not add to) `spender`'s allowance over `owner`'s `asset`.
    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> PortResult<()>;

    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> PortResult<()>;

    /// Move `amount` from `from` to `to`, consuming `spender`'s allowance.
    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> PortResult<()>;
}

/// Trusted, always-available unit prices (`10^18` scale).
pub trait PriceSource {
    fn price(&self, asset: &Address) -> PortResult<U256>;
}

/// An exchange that converts one asset into another.
pub trait ExchangeVenue {
    /// Sell exactly `request.amount_in` of `path[0]` pulled from `sender`,
    /// credit the output to `request.recipient`, and return the amount at
    /// every hop. Must be atomic: on error no balance or allowance moves.
    fn swap_exact_input(
        &mut self,
        ledger: &mut dyn TokenLedger,
        sender: &Address,
        request: &SwapRequest,
        now: u64,
    ) -> PortResult<Vec<U256>>;
}

/// The environment a holding operates in.
///
/// Price sources and venues are resolved by identity on every call, so a
/// changed identity takes effect on the next operation.
pub trait Host {
    fn balance_of(&self, asset: &Address, holder: &Address) -> PortResult<U256>;

    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> PortResult<U256>;

    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> PortResult<()>;

    /// Price of `asset` according to the price source identified by `source`.
    fn price(&self, source: &Address, asset: &Address) -> PortResult<U256>;

    /// Forward a swap to the venue identified by `venue`.
    fn swap_exact_input(
        &mut self,
        venue: &Address,
        sender: &Address,
        request: &SwapRequest,
    ) -> PortResult<Vec<U256>>;

    /// Current time, unix seconds.
    fn now(&self) -> u64;
}
