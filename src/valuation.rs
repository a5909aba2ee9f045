//! Valuation: asset balances to a common unit of account.
//!
//! `value = balance * unit_price / 10^18`, truncating. The truncation is a
//! small systematic undervaluation and is part of the contract: every
//! consumer must see exactly the same integers.

use crate::error::ArithmeticError;
use crate::types::{price_unit, Address, U256};

/// Value of `balance` units at `unit_price` (18-decimal fixed point).
///
/// ```
/// use driftguard::valuation::value_of;
/// use driftguard::U256;
///
/// let one = U256::exp10(18);
/// // 1 token at $2000 is worth 2000 * 10^18 units of account
/// assert_eq!(value_of(one, one * 2000).unwrap(), one * 2000);
/// ```
pub fn value_of(balance: U256, unit_price: U256) -> Result<U256, ArithmeticError> {
    balance
        .checked_mul(unit_price)
        .map(|scaled| scaled / price_unit())
        .ok_or(ArithmeticError::Overflow("balance * price"))
}

/// One asset's line in a [`ValuationSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssetValuation {
    pub asset: Address,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub balance: U256,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub unit_price: U256,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub value: U256,
}

/// Point-in-time valuation of every tracked asset.
///
/// Ephemeral: built from live balances and prices, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ValuationSnapshot {
    pub assets: Vec<AssetValuation>,
    #[cfg_attr(feature = "serde", serde(with = "crate::types::decimal"))]
    pub total_value: U256,
}

impl ValuationSnapshot {
    /// Build from `(asset, balance, unit_price)` quotes in policy order.
    pub fn from_quotes<I>(quotes: I) -> Result<Self, ArithmeticError>
    where
        I: IntoIterator<Item = (Address, U256, U256)>,
    {
        let mut assets = Vec::new();
        let mut total_value = U256::zero();
        for (asset, balance, unit_price) in quotes {
            let value = value_of(balance, unit_price)?;
            total_value = total_value
                .checked_add(value)
                .ok_or(ArithmeticError::Overflow("total value"))?;
            assets.push(AssetValuation {
                asset,
                balance,
                unit_price,
                value,
            });
        }
        Ok(Self {
            assets,
            total_value,
        })
    }

    pub fn get(&self, asset: &Address) -> Option<&AssetValuation> {
        self.assets.iter().find(|a| a.asset == *asset)
    }

    /// Value held in `asset`; zero when the asset is not in the snapshot.
    pub fn value_of(&self, asset: &Address) -> U256 {
        self.get(asset).map(|a| a.value).unwrap_or_default()
    }

    /// Current share of total value held in `asset`, in bps (truncated).
    pub fn share_bps(&self, asset: &Address) -> U256 {
        if self.total_value.is_zero() {
            return U256::zero();
        }
        // value <= total, so value * 10000 cannot overflow unless total is near U256::MAX / 10000
        self.value_of(asset)
            .saturating_mul(U256::from(crate::types::BPS_DENOMINATOR))
            / self.total_value
    }
}
