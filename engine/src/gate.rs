//! Role checks for privileged operations.
//!
//! Callers identify themselves with an explicit [`CallContext`]; there is no
//! ambient "current sender". Checks run before any state change or port call.

use std::fmt;

use driftguard::Address;
use log::warn;

use crate::error::{PolicyError, Result};
use crate::state::PolicyConfiguration;

/// The identity on whose behalf an operation is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    caller: Address,
}

impl CallContext {
    pub fn new(caller: Address) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }
}

/// Privileged roles in a configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Role {
    /// May execute capped rebalancing trades.
    Agent,
    /// May change tolerance, cap, agent, venue and price source.
    Administrator,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Agent => write!(f, "agent"),
            Role::Administrator => write!(f, "administrator"),
        }
    }
}

impl Role {
    fn holder(self, config: &PolicyConfiguration) -> Address {
        match self {
            Role::Agent => config.agent(),
            Role::Administrator => config.administrator(),
        }
    }
}

/// Fail with `Unauthorized` unless `ctx` is the current holder of `role`.
pub(crate) fn require(role: Role, config: &PolicyConfiguration, ctx: &CallContext) -> Result<()> {
    if ctx.caller() == role.holder(config) {
        Ok(())
    } else {
        warn!("rejected {} call from {}", role, ctx.caller());
        Err(PolicyError::Unauthorized {
            role,
            caller: ctx.caller(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftguard::{AssetPolicy, PolicyParams};

    fn config() -> PolicyConfiguration {
        PolicyConfiguration::new(PolicyParams {
            assets: vec![AssetPolicy::new(Address::repeat_byte(1), 10_000)],
            imbalance_tolerance_bps: 500,
            max_trade_fraction_bps: 100,
            venue: Address::repeat_byte(2),
            price_source: Address::repeat_byte(3),
            agent: Address::repeat_byte(4),
            administrator: Address::repeat_byte(5),
        })
    }

    #[test]
    fn agent_and_admin_are_distinct() {
        let config = config();
        let agent = CallContext::new(Address::repeat_byte(4));
        let admin = CallContext::new(Address::repeat_byte(5));

        assert!(require(Role::Agent, &config, &agent).is_ok());
        assert!(require(Role::Administrator, &config, &admin).is_ok());
        assert_eq!(
            require(Role::Agent, &config, &admin),
            Err(PolicyError::Unauthorized {
                role: Role::Agent,
                caller: Address::repeat_byte(5),
            })
        );
        assert!(require(Role::Administrator, &config, &agent).is_err());
    }

    #[test]
    fn null_caller_is_never_authorized() {
        let config = config();
        let nobody = CallContext::new(Address::ZERO);
        assert!(require(Role::Agent, &config, &nobody).is_err());
        assert!(require(Role::Administrator, &config, &nobody).is_err());
    }
}
