//! Allocation policy: per-asset target shares and the signed parameter tuple.

use crate::types::{Address, Bps};

/// Target share for one tracked asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetPolicy {
    pub asset: Address,
    /// Fraction of total value this asset should hold, in bps of 10000.
    pub target_share_bps: Bps,
}

impl AssetPolicy {
    pub fn new(asset: Address, target_share_bps: Bps) -> Self {
        Self {
            asset,
            target_share_bps,
        }
    }
}

/// The full parameter tuple a holding authorizes at setup.
///
/// Field order matters: it is the order of the signed struct encoding in
/// [`crate::typed_data`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyParams {
    /// Tracked assets. Order is significant for iteration and for the signed
    /// encoding, not for detection semantics.
    pub assets: Vec<AssetPolicy>,
    /// Allowed deviation band, in bps of total value.
    pub imbalance_tolerance_bps: Bps,
    /// Max fraction of the sell asset's own balance one trade may move.
    pub max_trade_fraction_bps: Bps,
    pub venue: Address,
    pub price_source: Address,
    pub agent: Address,
    pub administrator: Address,
}

impl PolicyParams {
    /// Sum of all target shares (not required to equal 10000).
    pub fn total_target_bps(&self) -> u64 {
        self.assets.iter().map(|p| u64::from(p.target_share_bps)).sum()
    }

    /// The policy entry for `asset`, if it is tracked.
    pub fn policy_for(&self, asset: &Address) -> Option<&AssetPolicy> {
        self.assets.iter().find(|p| p.asset == *asset)
    }

    pub fn tracks(&self, asset: &Address) -> bool {
        self.policy_for(asset).is_some()
    }

    /// Identity fields that must be non-null, with their names.
    pub fn identities(&self) -> [(&'static str, Address); 4] {
        [
            ("administrator", self.administrator),
            ("agent", self.agent),
            ("venue", self.venue),
            ("price source", self.price_source),
        ]
    }
}
