//! Imbalance detection: current value shares vs target shares ± tolerance.
//!
//! For each asset, with `T` the total value:
//!
//! - `target = T * target_bps / 10000`
//! - `band   = T * tolerance_bps / 10000`
//!
//! The asset is out of band if `current > target + band` or
//! `current + band < target`. Both comparisons are strict, so a value sitting
//! exactly on the band edge is still in band.

use std::fmt;

use crate::error::ArithmeticError;
use crate::policy::AssetPolicy;
use crate::types::{Address, Bps, U256, BPS_DENOMINATOR};
use crate::valuation::ValuationSnapshot;

/// `total * bps / 10000`, truncating.
pub fn bps_of(total: U256, bps: Bps) -> Result<U256, ArithmeticError> {
    total
        .checked_mul(U256::from(bps))
        .map(|n| n / U256::from(BPS_DENOMINATOR))
        .ok_or(ArithmeticError::Overflow("total * bps"))
}

/// Where an asset's current value sits relative to its tolerance band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BandPosition {
    Within,
    /// Above `target + band`.
    Over,
    /// Below `target - band`.
    Under,
}

impl fmt::Display for BandPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandPosition::Within => write!(f, "OK"),
            BandPosition::Over => write!(f, "OVER"),
            BandPosition::Under => write!(f, "UNDER"),
        }
    }
}

/// Target value and half-width of the allowed band for one asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Band {
    pub target_value: U256,
    pub band: U256,
}

impl Band {
    pub fn new(total: U256, target_bps: Bps, tolerance_bps: Bps) -> Result<Self, ArithmeticError> {
        Ok(Self {
            target_value: bps_of(total, target_bps)?,
            band: bps_of(total, tolerance_bps)?,
        })
    }

    /// Classify `current` without ever forming `target + band` (no overflow).
    pub fn classify(&self, current: U256) -> BandPosition {
        if current > self.target_value && current - self.target_value > self.band {
            BandPosition::Over
        } else if self.target_value > current && self.target_value - current > self.band {
            BandPosition::Under
        } else {
            BandPosition::Within
        }
    }
}

/// Per-asset drift assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetDrift {
    pub asset: Address,
    pub target_share_bps: Bps,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub current_value: U256,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub target_value: U256,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub band: U256,
    pub position: BandPosition,
}

impl AssetDrift {
    /// Value above target (zero if at or below).
    pub fn excess_value(&self) -> U256 {
        self.current_value.saturating_sub(self.target_value)
    }

    /// Value below target (zero if at or above).
    pub fn deficit_value(&self) -> U256 {
        self.target_value.saturating_sub(self.current_value)
    }
}

/// True if any policy asset is out of band. Stops at the first match.
pub fn is_disbalanced(
    snapshot: &ValuationSnapshot,
    policies: &[AssetPolicy],
    tolerance_bps: Bps,
) -> Result<bool, ArithmeticError> {
    let total = snapshot.total_value;
    for policy in policies {
        let band = Band::new(total, policy.target_share_bps, tolerance_bps)?;
        if band.classify(snapshot.value_of(&policy.asset)) != BandPosition::Within {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Full per-asset assessment in policy order.
pub fn assess(
    snapshot: &ValuationSnapshot,
    policies: &[AssetPolicy],
    tolerance_bps: Bps,
) -> Result<Vec<AssetDrift>, ArithmeticError> {
    let total = snapshot.total_value;
    policies
        .iter()
        .map(|policy| {
            let band = Band::new(total, policy.target_share_bps, tolerance_bps)?;
            let current_value = snapshot.value_of(&policy.asset);
            Ok(AssetDrift {
                asset: policy.asset,
                target_share_bps: policy.target_share_bps,
                current_value,
                target_value: band.target_value,
                band: band.band,
                position: band.classify(current_value),
            })
        })
        .collect()
}
