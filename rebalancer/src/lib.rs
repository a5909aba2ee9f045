//! driftguard-rebalancer: the agent side of a driftguard policy.
//!
//! Reads a holding file (policy, prices, balances, setup proof), sets up a
//! policy engine against a paper host, and walks the holding back inside its
//! tolerance band with capped trades, writing an audit trail as it goes.

pub mod audit;
pub mod config;
pub mod error;
pub mod execution;
pub mod holding;
pub mod planner;
