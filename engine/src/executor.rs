//! Capped trade execution against a host.
//!
//! A trade sells at most `max_trade_fraction_bps` of the sell asset's own
//! current balance. The venue gets an allowance of exactly `amount_in`; if
//! the swap fails the prior allowance is put back, so a failed trade moves
//! nothing.

use driftguard::imbalance::{AssetDrift, bps_of};
use driftguard::{Address, Bps, U256};
use driftguard_ports::{Host, SwapRequest};
use log::{info, warn};
use serde::Serialize;

use crate::config::Strictness;
use crate::error::{PolicyError, Result};
use crate::state::PolicyConfiguration;

/// Seconds the venue has to fill before the request expires.
pub const SWAP_DEADLINE_SECS: u64 = 300;

/// Minimum output requested from the venue. Slippage protection is the
/// venue's business; only a zero fill is refused.
pub fn min_amount_out() -> U256 {
    U256::one()
}

/// Outcome of one executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    pub path: Vec<Address>,
    #[serde(with = "driftguard::types::decimal")]
    pub amount_in: U256,
    /// Amount at every hop, starting with `amount_in`.
    #[serde(serialize_with = "serialize_amounts")]
    pub amounts: Vec<U256>,
    #[serde(with = "driftguard::types::decimal")]
    pub amount_out: U256,
}

fn serialize_amounts<S: serde::Serializer>(
    amounts: &[U256],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(amounts.iter().map(|a| a.to_string()))
}

/// Largest `amount_in` allowed for a sell asset holding `balance`.
pub fn trade_cap(balance: U256, max_trade_fraction_bps: Bps) -> Result<U256> {
    Ok(bps_of(balance, max_trade_fraction_bps)?)
}

/// Path shape checks that do not need the host.
pub(crate) fn check_path(
    config: &PolicyConfiguration,
    strictness: &Strictness,
    path: &[Address],
    amount_in: U256,
) -> Result<()> {
    if path.is_empty() {
        return Err(PolicyError::InvalidParameter("trade path is empty".into()));
    }
    if amount_in.is_zero() {
        return Err(PolicyError::InvalidParameter("amount_in must be positive".into()));
    }
    if strictness.require_policy_path {
        if let Some(stray) = path.iter().find(|hop| !config.params().tracks(hop)) {
            return Err(PolicyError::InvalidParameter(format!(
                "path hop {stray} is not a tracked asset"
            )));
        }
    }
    Ok(())
}

/// With `require_corrective_trade`, the sold asset must sit above its
/// target value and the bought asset below it.
pub(crate) fn check_corrective(drifts: &[AssetDrift], path: &[Address]) -> Result<()> {
    let find = |asset: &Address| drifts.iter().find(|d| d.asset == *asset);
    let (Some(sell), Some(buy)) = (path.first(), path.last()) else {
        return Err(PolicyError::InvalidParameter("trade path is empty".into()));
    };
    match find(sell) {
        Some(d) if d.current_value > d.target_value => {}
        _ => {
            return Err(PolicyError::InvalidParameter(format!(
                "{sell} is not above its target value"
            )));
        }
    }
    match find(buy) {
        Some(d) if d.current_value < d.target_value => Ok(()),
        _ => Err(PolicyError::InvalidParameter(format!(
            "{buy} is not below its target value"
        ))),
    }
}

/// Check the cap, approve the venue and forward the swap.
///
/// Role and path checks have already passed.
pub(crate) fn execute<H: Host + ?Sized>(
    config: &PolicyConfiguration,
    holding: &Address,
    host: &mut H,
    path: &[Address],
    amount_in: U256,
) -> Result<TradeReceipt> {
    let sell = path[0];
    let venue = config.venue();

    let balance = host.balance_of(&sell, holding)?;
    let cap = trade_cap(balance, config.max_trade_fraction_bps())?;
    if amount_in > cap {
        return Err(PolicyError::TradeTooLarge { amount_in, cap });
    }

    let prior_allowance = host.allowance(&sell, holding, &venue)?;
    host.approve(&sell, holding, &venue, amount_in)?;

    let request = SwapRequest {
        amount_in,
        min_amount_out: min_amount_out(),
        path: path.to_vec(),
        recipient: *holding,
        deadline: host.now().saturating_add(SWAP_DEADLINE_SECS),
    };

    match host.swap_exact_input(&venue, holding, &request) {
        Ok(amounts) => {
            let amount_out = amounts.last().copied().unwrap_or_default();
            info!(
                "rebalanced {holding}: sold {amount_in} of {sell} for {amount_out} (cap {cap})"
            );
            Ok(TradeReceipt {
                path: request.path,
                amount_in,
                amounts,
                amount_out,
            })
        }
        Err(e) => {
            if let Err(restore) = host.approve(&sell, holding, &venue, prior_allowance) {
                warn!("could not restore {sell} allowance for {venue}: {restore}");
            }
            warn!("swap via {venue} failed, allowance restored: {e}");
            Err(PolicyError::TransferFailure(e))
        }
    }
}
