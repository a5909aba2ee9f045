//! Administrator-only parameter setters. Changes apply to the next call.

use driftguard::{Address, Bps};
use log::info;

use crate::error::{PolicyError, Result};
use crate::event::{ParameterChange, PolicyEvent};
use crate::gate::{self, CallContext, Role};
use crate::state::{check_bps, check_identity, PolicyConfiguration};
use crate::PolicyEngine;

impl PolicyEngine {
    /// Apply `update` to the configuration once the caller is confirmed as
    /// administrator and `validate` has passed.
    fn administer(
        &mut self,
        ctx: &CallContext,
        validate: impl FnOnce() -> Result<()>,
        update: impl FnOnce(&mut PolicyConfiguration) -> ParameterChange,
    ) -> Result<()> {
        let config = self
            .lifecycle
            .configuration_mut()
            .ok_or(PolicyError::NotInitialized)?;
        gate::require(Role::Administrator, config, ctx)?;
        validate()?;
        let change = update(config);
        info!("{}: {change}", self.holding);
        self.journal.record(PolicyEvent::ParameterUpdated { change });
        Ok(())
    }

    pub fn set_imbalance_tolerance(&mut self, ctx: &CallContext, bps: Bps) -> Result<()> {
        self.administer(
            ctx,
            || check_bps("imbalance tolerance", bps),
            |config| {
                let params = config.params_mut();
                let from = std::mem::replace(&mut params.imbalance_tolerance_bps, bps);
                ParameterChange::ImbalanceTolerance { from, to: bps }
            },
        )
    }

    pub fn set_max_trade_fraction(&mut self, ctx: &CallContext, bps: Bps) -> Result<()> {
        self.administer(
            ctx,
            || check_bps("max trade fraction", bps),
            |config| {
                let params = config.params_mut();
                let from = std::mem::replace(&mut params.max_trade_fraction_bps, bps);
                ParameterChange::MaxTradeFraction { from, to: bps }
            },
        )
    }

    /// Hand the agent role to `agent`. The previous agent loses it at once.
    pub fn set_agent(&mut self, ctx: &CallContext, agent: Address) -> Result<()> {
        self.administer(
            ctx,
            || check_identity("agent", agent),
            |config| {
                let from = std::mem::replace(&mut config.params_mut().agent, agent);
                ParameterChange::Agent { from, to: agent }
            },
        )
    }

    pub fn set_venue(&mut self, ctx: &CallContext, venue: Address) -> Result<()> {
        self.administer(
            ctx,
            || check_identity("venue", venue),
            |config| {
                let from = std::mem::replace(&mut config.params_mut().venue, venue);
                ParameterChange::Venue { from, to: venue }
            },
        )
    }

    pub fn set_price_source(&mut self, ctx: &CallContext, price_source: Address) -> Result<()> {
        self.administer(
            ctx,
            || check_identity("price source", price_source),
            |config| {
                let from = std::mem::replace(&mut config.params_mut().price_source, price_source);
                ParameterChange::PriceSource {
                    from,
                    to: price_source,
                }
            },
        )
    }
}
