//! Drift report types.

use std::fmt;

use driftguard::imbalance::{AssetDrift, BandPosition};
use driftguard::{price_unit, Address, Bps, U256};
use serde::Serialize;

/// Per-asset drift of a holding at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    #[serde(with = "driftguard::types::decimal")]
    pub total_value: U256,
    pub tolerance_bps: Bps,
    pub rows: Vec<DriftRow>,
}

/// One asset's line in a [`DriftReport`].
#[derive(Debug, Clone, Serialize)]
pub struct DriftRow {
    #[serde(with = "driftguard::types::decimal")]
    pub balance: U256,
    #[serde(with = "driftguard::types::decimal")]
    pub unit_price: U256,
    /// Current share of total value, in bps (truncated).
    #[serde(with = "driftguard::types::decimal")]
    pub current_share_bps: U256,
    #[serde(flatten)]
    pub drift: AssetDrift,
}

impl DriftRow {
    pub fn asset(&self) -> Address {
        self.drift.asset
    }

    pub fn position(&self) -> BandPosition {
        self.drift.position
    }
}

impl DriftReport {
    /// True if any asset is outside its band.
    pub fn is_disbalanced(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.drift.position != BandPosition::Within)
    }

    /// The asset furthest above its target value, if any is above.
    pub fn most_overweight(&self) -> Option<&DriftRow> {
        self.rows
            .iter()
            .filter(|r| !r.drift.excess_value().is_zero())
            .max_by_key(|r| r.drift.excess_value())
    }

    /// The asset furthest below its target value, if any is below.
    pub fn most_underweight(&self) -> Option<&DriftRow> {
        self.rows
            .iter()
            .filter(|r| !r.drift.deficit_value().is_zero())
            .max_by_key(|r| r.drift.deficit_value())
    }

    pub fn row(&self, asset: &Address) -> Option<&DriftRow> {
        self.rows.iter().find(|r| r.drift.asset == *asset)
    }
}

/// Render an 18-decimal amount with six fractional digits.
pub fn format_units(amount: U256) -> String {
    let unit = price_unit();
    let whole = amount / unit;
    let micros = (amount % unit) / U256::exp10(12);
    format!("{whole}.{:06}", micros.low_u64())
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DRIFT REPORT (total {}, tolerance {} bps): {}",
            format_units(self.total_value),
            self.tolerance_bps,
            if self.is_disbalanced() {
                "DISBALANCED"
            } else {
                "BALANCED"
            }
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "  [{:<5}] {}: {:>5} bps vs {:>5} target, value {} vs {} (band {})",
                row.drift.position.to_string(),
                row.drift.asset,
                row.current_share_bps.to_string(),
                row.drift.target_share_bps,
                format_units(row.drift.current_value),
                format_units(row.drift.target_value),
                format_units(row.drift.band),
            )?;
        }
        Ok(())
    }
}
