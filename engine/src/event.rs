//! Journal of state transitions.
//!
//! Every successful setup, trade and parameter change appends one event.
//! Reads never do. The journal lets callers audit or replay what an engine
//! went through without inspecting the host.

use std::fmt;

use driftguard::{Address, Bps, U256};
use serde::Serialize;

/// One recorded transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PolicyEvent {
    /// Setup succeeded.
    Initialized {
        holding: Address,
        agent: Address,
        administrator: Address,
        assets: usize,
    },
    /// The agent executed a trade.
    RebalanceExecuted {
        agent: Address,
        path: Vec<Address>,
        #[serde(with = "driftguard::types::decimal")]
        amount_in: U256,
        #[serde(with = "driftguard::types::decimal")]
        amount_out: U256,
    },
    /// The administrator changed a parameter.
    ParameterUpdated { change: ParameterChange },
}

/// Old and new value of an administrator-changed parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "parameter", rename_all = "snake_case")]
pub enum ParameterChange {
    ImbalanceTolerance { from: Bps, to: Bps },
    MaxTradeFraction { from: Bps, to: Bps },
    Agent { from: Address, to: Address },
    Venue { from: Address, to: Address },
    PriceSource { from: Address, to: Address },
}

impl fmt::Display for ParameterChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterChange::ImbalanceTolerance { from, to } => {
                write!(f, "imbalance tolerance {from} -> {to} bps")
            }
            ParameterChange::MaxTradeFraction { from, to } => {
                write!(f, "max trade fraction {from} -> {to} bps")
            }
            ParameterChange::Agent { from, to } => write!(f, "agent {from} -> {to}"),
            ParameterChange::Venue { from, to } => write!(f, "venue {from} -> {to}"),
            ParameterChange::PriceSource { from, to } => write!(f, "price source {from} -> {to}"),
        }
    }
}

impl fmt::Display for PolicyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyEvent::Initialized {
                holding,
                agent,
                administrator,
                assets,
            } => write!(
                f,
                "initialized {holding}: {assets} assets, agent {agent}, administrator {administrator}"
            ),
            PolicyEvent::RebalanceExecuted {
                agent,
                path,
                amount_in,
                amount_out,
            } => {
                let hops: Vec<String> = path.iter().map(|a| a.to_string()).collect();
                write!(
                    f,
                    "rebalance by {agent}: {amount_in} in, {amount_out} out via {}",
                    hops.join(" -> ")
                )
            }
            PolicyEvent::ParameterUpdated { change } => write!(f, "updated {change}"),
        }
    }
}

/// Append-only event list.
#[derive(Clone, Debug, Default)]
pub struct EventJournal {
    events: Vec<PolicyEvent>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: PolicyEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[PolicyEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&mut self) -> Vec<PolicyEvent> {
        std::mem::take(&mut self.events)
    }
}
