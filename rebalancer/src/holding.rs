//! Holding file (holding.json) loading, validation and write-back.
//!
//! A holding file carries everything a paper run needs: the holding
//! identity, the policy it signs, the price table the oracle serves, the
//! holding's balances, the venue's reserves and, once signed, the setup
//! proof.

use std::path::Path;

use chrono::{DateTime, Utc};
use driftguard::{Address, PolicyParams, U256};
use driftguard_ports::local::{FixedPriceSource, LocalHost, VenueMode};
use driftguard_ports::Host;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An amount of one asset (balance, reserve or unit price).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: Address,
    #[serde(with = "driftguard::types::decimal")]
    pub amount: U256,
}

/// Contents of a holding file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub holding: Address,
    pub policy: PolicyParams,
    /// Unit prices at 10^18 scale.
    pub prices: Vec<AssetAmount>,
    pub balances: Vec<AssetAmount>,
    #[serde(default)]
    pub venue_reserves: Vec<AssetAmount>,
    #[serde(default)]
    pub venue_fee_bps: u32,
    /// Hex setup proof, filled in by `rebalancer sign`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
}

impl HoldingFile {
    /// Load and validate a holding file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::HoldingRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: HoldingFile = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    /// Write the file back as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Holding(format!("cannot serialize holding: {e}")))?;
        std::fs::write(path, json + "\n").map_err(|e| Error::HoldingWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validate the holding file. Policy rules proper are enforced by the
    /// engine at setup; this only checks the file is usable.
    fn validate(&self) -> Result<()> {
        if self.holding.is_zero() {
            return Err(Error::Holding("holding address is null".into()));
        }
        if self.venue_fee_bps > 10_000 {
            return Err(Error::Holding(format!(
                "venue_fee_bps must be <= 10000, got {}",
                self.venue_fee_bps
            )));
        }

        for (name, list) in [
            ("prices", &self.prices),
            ("balances", &self.balances),
            ("venue_reserves", &self.venue_reserves),
        ] {
            let mut seen = FxHashSet::default();
            for entry in list {
                if !seen.insert(entry.asset) {
                    return Err(Error::Holding(format!(
                        "duplicate {name} entry for {}",
                        entry.asset
                    )));
                }
            }
        }

        for policy in &self.policy.assets {
            if !self.prices.iter().any(|p| p.asset == policy.asset) {
                return Err(Error::Holding(format!("no price for {}", policy.asset)));
            }
        }

        if self.proof.is_some() {
            self.proof_bytes()?;
        }
        Ok(())
    }

    /// Decoded setup proof, if the file has been signed.
    pub fn proof_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(proof) = &self.proof else {
            return Ok(None);
        };
        let digits = proof.trim().trim_start_matches("0x");
        hex::decode(digits)
            .map(Some)
            .map_err(|e| Error::Holding(format!("proof is not hex: {e}")))
    }

    /// An in-memory host seeded from this file: one price source, one
    /// oracle venue quoting from it, holding balances and venue reserves.
    pub fn paper_host(&self) -> LocalHost {
        let prices = self
            .prices
            .iter()
            .fold(FixedPriceSource::new(), |source, p| {
                source.with_price(p.asset, p.amount)
            });
        let mut builder = LocalHost::builder()
            .with_price_source(self.policy.price_source, prices)
            .with_oracle_venue_mode(
                self.policy.venue,
                self.policy.price_source,
                self.venue_fee_bps,
                VenueMode::Fill,
            );
        for b in &self.balances {
            builder = builder.with_balance(b.asset, self.holding, b.amount);
        }
        for r in &self.venue_reserves {
            builder = builder.with_balance(r.asset, self.policy.venue, r.amount);
        }
        builder.build()
    }

    /// Replace balances and reserves with what `host` now holds.
    pub fn absorb_balances<H: Host + ?Sized>(&mut self, host: &H) -> Result<()> {
        let holding = self.holding;
        let venue = self.policy.venue;
        let mut assets: Vec<Address> = self.policy.assets.iter().map(|p| p.asset).collect();
        for b in self.balances.iter().chain(&self.venue_reserves) {
            if !assets.contains(&b.asset) {
                assets.push(b.asset);
            }
        }

        let read = |owner: &Address| -> Result<Vec<AssetAmount>> {
            assets
                .iter()
                .map(|asset| {
                    let amount = host
                        .balance_of(asset, owner)
                        .map_err(|e| Error::Holding(e.to_string()))?;
                    Ok(AssetAmount {
                        asset: *asset,
                        amount,
                    })
                })
                .collect()
        };
        self.balances = read(&holding)?;
        self.venue_reserves = read(&venue)?;
        self.timestamp = Some(Utc::now());
        Ok(())
    }
}
