//! Rebalancing policy engine for a self-custodied holding.
//!
//! A [`PolicyEngine`] is bound to one holding identity. It is configured
//! exactly once by [`setup`](PolicyEngine::setup), which requires a proof
//! signed by the holding's key over the full parameter set. After that:
//!
//! - anyone may value the holding and ask whether it has drifted
//!   ([`is_disbalanced`](PolicyEngine::is_disbalanced),
//!   [`drift_report`](PolicyEngine::drift_report));
//! - only the agent may execute a trade, capped at a fraction of the sell
//!   asset's balance ([`execute_rebalance`](PolicyEngine::execute_rebalance));
//! - only the administrator may change tolerance, cap, agent, venue or
//!   price source.
//!
//! Balances, prices and swaps come from a [`Host`].

mod admin;
pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod gate;
pub mod report;
pub mod state;

pub use config::Strictness;
pub use error::{PolicyError, Result};
pub use event::{EventJournal, ParameterChange, PolicyEvent};
pub use executor::{TradeReceipt, SWAP_DEADLINE_SECS};
pub use gate::{CallContext, Role};
pub use report::{DriftReport, DriftRow};
pub use state::{Lifecycle, PolicyConfiguration};

use driftguard::imbalance::{self, AssetDrift};
use driftguard::signature::verify_setup_proof;
use driftguard::{Address, PolicyParams, ValuationSnapshot, U256};
use driftguard_ports::Host;
use log::{debug, info, warn};

/// Policy state for one holding.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    holding: Address,
    strictness: Strictness,
    lifecycle: Lifecycle,
    journal: EventJournal,
}

impl PolicyEngine {
    /// An uninitialized engine for `holding`.
    pub fn new(holding: Address) -> Self {
        Self {
            holding,
            strictness: Strictness::default(),
            lifecycle: Lifecycle::Uninitialized,
            journal: EventJournal::new(),
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn holding(&self) -> Address {
        self.holding
    }

    pub fn strictness(&self) -> &Strictness {
        &self.strictness
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    /// The stored configuration, or `NotInitialized`.
    pub fn configuration(&self) -> Result<&PolicyConfiguration> {
        self.lifecycle
            .configuration()
            .ok_or(PolicyError::NotInitialized)
    }

    pub fn events(&self) -> &[PolicyEvent] {
        self.journal.events()
    }

    /// Remove and return all journaled events.
    pub fn take_events(&mut self) -> Vec<PolicyEvent> {
        self.journal.drain()
    }

    /// One-time configuration, authorized by the holding's signature over
    /// `params` and the holding identity.
    ///
    /// Fails `AlreadyInitialized` on any second call, whatever the input.
    pub fn setup(&mut self, params: PolicyParams, proof: &[u8]) -> Result<()> {
        if self.lifecycle.is_initialized() {
            return Err(PolicyError::AlreadyInitialized);
        }
        state::validate_params(&params, &self.strictness)?;
        if let Err(e) = verify_setup_proof(&params, &self.holding, proof) {
            warn!("setup proof rejected for {}: {e}", self.holding);
            return Err(e.into());
        }

        let event = PolicyEvent::Initialized {
            holding: self.holding,
            agent: params.agent,
            administrator: params.administrator,
            assets: params.assets.len(),
        };
        info!(
            "initialized {} with {} assets, tolerance {} bps, cap {} bps",
            self.holding,
            params.assets.len(),
            params.imbalance_tolerance_bps,
            params.max_trade_fraction_bps
        );
        self.lifecycle = Lifecycle::Initialized(PolicyConfiguration::new(params));
        self.journal.record(event);
        Ok(())
    }

    /// Value every tracked asset at current balances and prices.
    pub fn valuation<H: Host + ?Sized>(&self, host: &H) -> Result<ValuationSnapshot> {
        let config = self.valuation_config()?;
        let source = config.price_source();
        let mut quotes = Vec::with_capacity(config.assets().len());
        for policy in config.assets() {
            let balance = host.balance_of(&policy.asset, &self.holding)?;
            let price = host
                .price(&source, &policy.asset)
                .map_err(|e| PolicyError::ValuationFailure(e.to_string()))?;
            quotes.push((policy.asset, balance, price));
        }
        let snapshot = ValuationSnapshot::from_quotes(quotes)?;
        debug!("{} valued at {}", self.holding, snapshot.total_value);
        Ok(snapshot)
    }

    /// True if any tracked asset's value lies outside its tolerance band.
    pub fn is_disbalanced<H: Host + ?Sized>(&self, host: &H) -> Result<bool> {
        let config = self.valuation_config()?;
        let snapshot = self.valuation(host)?;
        Ok(imbalance::is_disbalanced(
            &snapshot,
            config.assets(),
            config.imbalance_tolerance_bps(),
        )?)
    }

    /// Per-asset drift with balances, prices and band positions.
    pub fn drift_report<H: Host + ?Sized>(&self, host: &H) -> Result<DriftReport> {
        let config = self.valuation_config()?;
        let snapshot = self.valuation(host)?;
        let drifts = self.assess(config, &snapshot)?;
        let rows = drifts
            .into_iter()
            .map(|drift| {
                let (balance, unit_price) = snapshot
                    .get(&drift.asset)
                    .map(|v| (v.balance, v.unit_price))
                    .unwrap_or_default();
                DriftRow {
                    balance,
                    unit_price,
                    current_share_bps: snapshot.share_bps(&drift.asset),
                    drift,
                }
            })
            .collect();
        Ok(DriftReport {
            total_value: snapshot.total_value,
            tolerance_bps: config.imbalance_tolerance_bps(),
            rows,
        })
    }

    /// Largest `amount_in` the agent may currently sell of `asset`.
    pub fn trade_cap<H: Host + ?Sized>(&self, host: &H, asset: &Address) -> Result<U256> {
        let config = self.configuration()?;
        let balance = host.balance_of(asset, &self.holding)?;
        executor::trade_cap(balance, config.max_trade_fraction_bps())
    }

    /// Sell `amount_in` of `path[0]` along `path` through the configured
    /// venue, crediting the output to the holding. Agent only.
    pub fn execute_rebalance<H: Host + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut H,
        path: &[Address],
        amount_in: U256,
    ) -> Result<TradeReceipt> {
        let config = self.configuration()?;
        gate::require(Role::Agent, config, ctx)?;
        executor::check_path(config, &self.strictness, path, amount_in)?;
        if self.strictness.require_corrective_trade {
            let snapshot = self.valuation(&*host)?;
            let drifts = self.assess(config, &snapshot)?;
            executor::check_corrective(&drifts, path)?;
        }

        let receipt = executor::execute(config, &self.holding, host, path, amount_in)?;
        self.journal.record(PolicyEvent::RebalanceExecuted {
            agent: ctx.caller(),
            path: receipt.path.clone(),
            amount_in: receipt.amount_in,
            amount_out: receipt.amount_out,
        });
        Ok(receipt)
    }

    fn assess(
        &self,
        config: &PolicyConfiguration,
        snapshot: &ValuationSnapshot,
    ) -> Result<Vec<AssetDrift>> {
        Ok(imbalance::assess(
            snapshot,
            config.assets(),
            config.imbalance_tolerance_bps(),
        )?)
    }

    /// Read paths report an uninitialized engine as a valuation failure.
    fn valuation_config(&self) -> Result<&PolicyConfiguration> {
        self.lifecycle
            .configuration()
            .ok_or_else(|| PolicyError::ValuationFailure("policy is not initialized".into()))
    }
}
