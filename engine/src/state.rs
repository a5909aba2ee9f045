//! Configuration store and the one-way setup lifecycle.

use driftguard::{Address, AssetPolicy, Bps, PolicyParams, BPS_DENOMINATOR};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::config::Strictness;
use crate::error::{PolicyError, Result};

/// Stored policy parameters after a successful setup.
///
/// Identity fields are never null. Only the administration surface mutates
/// them; the asset list never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfiguration {
    params: PolicyParams,
}

impl PolicyConfiguration {
    pub(crate) fn new(params: PolicyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    pub fn assets(&self) -> &[AssetPolicy] {
        &self.params.assets
    }

    pub fn imbalance_tolerance_bps(&self) -> Bps {
        self.params.imbalance_tolerance_bps
    }

    pub fn max_trade_fraction_bps(&self) -> Bps {
        self.params.max_trade_fraction_bps
    }

    pub fn venue(&self) -> Address {
        self.params.venue
    }

    pub fn price_source(&self) -> Address {
        self.params.price_source
    }

    pub fn agent(&self) -> Address {
        self.params.agent
    }

    pub fn administrator(&self) -> Address {
        self.params.administrator
    }

    pub(crate) fn params_mut(&mut self) -> &mut PolicyParams {
        &mut self.params
    }
}

/// `Uninitialized -> Initialized`, and never back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Initialized(PolicyConfiguration),
}

impl Lifecycle {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Lifecycle::Initialized(_))
    }

    pub fn configuration(&self) -> Option<&PolicyConfiguration> {
        match self {
            Lifecycle::Initialized(config) => Some(config),
            Lifecycle::Uninitialized => None,
        }
    }

    pub(crate) fn configuration_mut(&mut self) -> Option<&mut PolicyConfiguration> {
        match self {
            Lifecycle::Initialized(config) => Some(config),
            Lifecycle::Uninitialized => None,
        }
    }
}

/// Reject a bps quantity above 10000.
pub(crate) fn check_bps(name: &str, value: Bps) -> Result<()> {
    if value > BPS_DENOMINATOR {
        return Err(PolicyError::InvalidParameter(format!(
            "{name} must be at most {BPS_DENOMINATOR} bps, got {value}"
        )));
    }
    Ok(())
}

/// Reject the null identity for a role-bearing or collaborator field.
pub(crate) fn check_identity(name: &str, value: Address) -> Result<()> {
    if value.is_zero() {
        return Err(PolicyError::InvalidParameter(format!("{name} must not be null")));
    }
    Ok(())
}

/// Structural checks run by setup before the proof is looked at.
///
/// Null identities are an authorization failure; everything else is an
/// invalid parameter.
pub(crate) fn validate_params(params: &PolicyParams, strictness: &Strictness) -> Result<()> {
    for (name, identity) in params.identities() {
        if identity.is_zero() {
            return Err(PolicyError::AuthorizationFailure(format!(
                "{name} must not be null"
            )));
        }
    }

    if params.assets.is_empty() {
        return Err(PolicyError::InvalidParameter(
            "at least one asset policy is required".into(),
        ));
    }
    let mut seen = FxHashSet::default();
    for policy in &params.assets {
        if policy.asset.is_zero() {
            return Err(PolicyError::InvalidParameter("asset must not be null".into()));
        }
        if !seen.insert(policy.asset) {
            return Err(PolicyError::InvalidParameter(format!(
                "asset {} listed twice",
                policy.asset
            )));
        }
        check_bps("target share", policy.target_share_bps)?;
    }
    check_bps("imbalance tolerance", params.imbalance_tolerance_bps)?;
    check_bps("max trade fraction", params.max_trade_fraction_bps)?;

    if strictness.require_full_allocation && params.total_target_bps() != u64::from(BPS_DENOMINATOR)
    {
        return Err(PolicyError::InvalidParameter(format!(
            "target shares sum to {} bps, expected {BPS_DENOMINATOR}",
            params.total_target_bps()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PolicyParams {
        PolicyParams {
            assets: vec![
                AssetPolicy::new(Address::repeat_byte(0xa1), 6000),
                AssetPolicy::new(Address::repeat_byte(0xa2), 4000),
            ],
            imbalance_tolerance_bps: 500,
            max_trade_fraction_bps: 100,
            venue: Address::repeat_byte(2),
            price_source: Address::repeat_byte(3),
            agent: Address::repeat_byte(4),
            administrator: Address::repeat_byte(5),
        }
    }

    #[test]
    fn valid_params_pass() {
        assert!(validate_params(&params(), &Strictness::strict()).is_ok());
    }

    #[test]
    fn null_identities_are_authorization_failures() {
        for field in 0..4 {
            let mut p = params();
            match field {
                0 => p.administrator = Address::ZERO,
                1 => p.agent = Address::ZERO,
                2 => p.venue = Address::ZERO,
                _ => p.price_source = Address::ZERO,
            }
            assert!(matches!(
                validate_params(&p, &Strictness::default()),
                Err(PolicyError::AuthorizationFailure(_))
            ));
        }
    }

    #[test]
    fn out_of_range_bps_rejected() {
        let mut p = params();
        p.assets[0].target_share_bps = 10_001;
        assert!(matches!(
            validate_params(&p, &Strictness::default()),
            Err(PolicyError::InvalidParameter(_))
        ));

        let mut p = params();
        p.imbalance_tolerance_bps = 10_001;
        assert!(validate_params(&p, &Strictness::default()).is_err());

        let mut p = params();
        p.max_trade_fraction_bps = 10_001;
        assert!(validate_params(&p, &Strictness::default()).is_err());

        let mut p = params();
        p.max_trade_fraction_bps = 10_000;
        assert!(validate_params(&p, &Strictness::default()).is_ok());
    }

    #[test]
    fn asset_list_shape() {
        let mut p = params();
        p.assets.clear();
        assert!(validate_params(&p, &Strictness::default()).is_err());

        let mut p = params();
        p.assets[1].asset = p.assets[0].asset;
        assert!(validate_params(&p, &Strictness::default()).is_err());

        let mut p = params();
        p.assets[1].asset = Address::ZERO;
        assert!(validate_params(&p, &Strictness::default()).is_err());
    }

    #[test]
    fn partial_allocation_only_fails_when_strict() {
        let mut p = params();
        p.assets[1].target_share_bps = 3000;
        assert!(validate_params(&p, &Strictness::default()).is_ok());
        let strict = Strictness {
            require_full_allocation: true,
            ..Strictness::default()
        };
        assert!(validate_params(&p, &strict).is_err());
    }

    #[test]
    fn lifecycle_accessors() {
        let mut lifecycle = Lifecycle::default();
        assert!(!lifecycle.is_initialized());
        assert!(lifecycle.configuration().is_none());

        lifecycle = Lifecycle::Initialized(PolicyConfiguration::new(params()));
        assert!(lifecycle.is_initialized());
        assert_eq!(lifecycle.configuration().map(|c| c.agent()), Some(Address::repeat_byte(4)));
    }
}
