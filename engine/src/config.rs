//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Optional checks beyond the base policy rules. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strictness {
    /// Setup rejects target shares that do not sum to exactly 10000 bps.
    pub require_full_allocation: bool,
    /// Every hop of a trade path must be a tracked asset.
    pub require_policy_path: bool,
    /// The sold asset must be above its target value and the bought asset
    /// below its target value when the trade executes.
    pub require_corrective_trade: bool,
}

impl Strictness {
    /// Every optional check on.
    pub fn strict() -> Self {
        Self {
            require_full_allocation: true,
            require_policy_path: true,
            require_corrective_trade: true,
        }
    }

    pub fn is_lenient(&self) -> bool {
        *self == Self::default()
    }
}
