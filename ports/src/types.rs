//! Shared port types: swap requests and receipts.

use driftguard::{Address, U256};

/// An exact-input swap along `path`.
///
/// `path[0]` is sold, `path[last]` is bought; intermediate hops are routed
/// by the venue and not interpreted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SwapRequest {
    #[cfg_attr(feature = "serde", serde(with = "driftguard::types::decimal"))]
    pub amount_in: U256,
    #[cfg_attr(feature = "serde", serde(with = "driftguard::types::decimal"))]
    pub min_amount_out: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    /// Unix seconds after which the venue must refuse the swap.
    pub deadline: u64,
}

impl SwapRequest {
    pub fn sell_asset(&self) -> Option<&Address> {
        self.path.first()
    }

    pub fn buy_asset(&self) -> Option<&Address> {
        self.path.last()
    }
}

/// A swap the in-process host forwarded to a venue, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSwap {
    pub venue: Address,
    pub sender: Address,
    pub request: SwapRequest,
    /// Per-hop amounts on success, `None` if the venue refused.
    pub amounts: Option<Vec<U256>>,
}
