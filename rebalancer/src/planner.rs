//! Trade planning: pick the next corrective trade from a drift report.
//!
//! One trade per step. The most overweight asset is sold into the most
//! underweight one, for the smaller of the engine's cap and the excess value
//! converted back into sell-asset units.

use std::fmt;

use driftguard::imbalance::bps_of;
use driftguard::{price_unit, Address, Bps, U256};
use driftguard_engine::report::format_units;
use driftguard_engine::DriftReport;
use serde::Serialize;

use crate::error::Result;

/// A single planned sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTrade {
    pub sell: Address,
    pub buy: Address,
    #[serde(with = "driftguard::types::decimal")]
    pub amount_in: U256,
    /// Value of `amount_in` at current prices.
    #[serde(with = "driftguard::types::decimal")]
    pub value: U256,
    /// True if the cap, not the excess, limited the amount.
    pub capped: bool,
}

impl PlannedTrade {
    pub fn path(&self) -> [Address; 2] {
        [self.sell, self.buy]
    }
}

impl fmt::Display for PlannedTrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELL {} of {} -> {} (value {}{})",
            format_units(self.amount_in),
            self.sell,
            self.buy,
            format_units(self.value),
            if self.capped { ", capped" } else { "" }
        )
    }
}

/// Next trade for `report`, or `None` if the holding is balanced or no
/// positive amount can be sold.
pub fn plan_step(report: &DriftReport, max_trade_fraction_bps: Bps) -> Result<Option<PlannedTrade>> {
    if !report.is_disbalanced() {
        return Ok(None);
    }
    let (Some(over), Some(under)) = (report.most_overweight(), report.most_underweight()) else {
        return Ok(None);
    };
    if over.unit_price.is_zero() {
        return Ok(None);
    }

    let cap = bps_of(over.balance, max_trade_fraction_bps)?;
    let excess_units = over
        .drift
        .excess_value()
        .checked_mul(price_unit())
        .map(|n| n / over.unit_price)
        .unwrap_or(U256::MAX);
    let amount_in = cap.min(excess_units);
    if amount_in.is_zero() {
        return Ok(None);
    }

    let value = driftguard::valuation::value_of(amount_in, over.unit_price)?;
    Ok(Some(PlannedTrade {
        sell: over.asset(),
        buy: under.asset(),
        amount_in,
        value,
        capped: amount_in == cap,
    }))
}
