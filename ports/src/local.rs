//! In-process host: memory ledger, fixed price sources and an oracle-priced
//! venue, wired together by identity.
//!
//! Use this in tests and paper runs to drive the engine without a chain.
//!
//! ```
//! use driftguard::{price_unit, Address, U256};
//! use driftguard_ports::local::{FixedPriceSource, LocalHost};
//! use driftguard_ports::Host;
//!
//! let dai = Address::repeat_byte(0xd1);
//! let oracle = Address::repeat_byte(0x0a);
//! let venue = Address::repeat_byte(0x0e);
//! let holding = Address::repeat_byte(0x40);
//!
//! let host = LocalHost::builder()
//!     .with_price_source(oracle, FixedPriceSource::new().with_price(dai, price_unit()))
//!     .with_oracle_venue(venue, oracle)
//!     .with_balance(dai, holding, U256::from(5000u64))
//!     .build();
//!
//! assert_eq!(host.price(&oracle, &dai).unwrap(), price_unit());
//! assert_eq!(host.balance_of(&dai, &holding).unwrap(), U256::from(5000u64));
//! ```

use driftguard::{price_unit, Address, ArithmeticError, Bps, BPS_DENOMINATOR, U256};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::error::{PortError, PortResult};
use crate::types::{RecordedSwap, SwapRequest};
use crate::{ExchangeVenue, Host, PriceSource, TokenLedger};

// ============================================================================
// Ledger
// ============================================================================

/// Balances and allowances held in hash maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: FxHashMap<(Address, Address), U256>,
    allowances: FxHashMap<(Address, Address, Address), U256>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air.
    pub fn mint(&mut self, asset: Address, holder: Address, amount: U256) -> PortResult<()> {
        let entry = self.balances.entry((asset, holder)).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or(ArithmeticError::Overflow("mint"))?;
        Ok(())
    }

    /// Overwrite a balance.
    pub fn set_balance(&mut self, asset: Address, holder: Address, amount: U256) {
        self.balances.insert((asset, holder), amount);
    }

    fn balance(&self, asset: &Address, holder: &Address) -> U256 {
        self.balances
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or_default()
    }

    fn move_balance(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> PortResult<()> {
        let available = self.balance(asset, from);
        if available < amount {
            return Err(PortError::InsufficientBalance {
                asset: *asset,
                holder: *from,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .ok_or(ArithmeticError::Overflow("transfer"))?;
        self.balances.insert((*asset, *from), available - amount);
        self.balances.insert((*asset, *to), credited);
        Ok(())
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&self, asset: &Address, holder: &Address) -> PortResult<U256> {
        Ok(self.balance(asset, holder))
    }

    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> PortResult<U256> {
        Ok(self
            .allowances
            .get(&(*asset, *owner, *spender))
            .copied()
            .unwrap_or_default())
    }

    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> PortResult<()> {
        debug!("approve {asset}: {owner} -> {spender} = {amount}");
        self.allowances.insert((*asset, *owner, *spender), amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> PortResult<()> {
        self.move_balance(asset, from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> PortResult<()> {
        let available = self.allowance(asset, from, spender)?;
        if available < amount {
            return Err(PortError::InsufficientAllowance {
                asset: *asset,
                owner: *from,
                spender: *spender,
                available,
                required: amount,
            });
        }
        self.move_balance(asset, from, to, amount)?;
        self.allowances
            .insert((*asset, *from, *spender), available - amount);
        Ok(())
    }
}

// ============================================================================
// Price source
// ============================================================================

/// A price table that only changes when told to.
#[derive(Clone, Debug, Default)]
pub struct FixedPriceSource {
    prices: FxHashMap<Address, U256>,
}

impl FixedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: Address, price: U256) -> Self {
        self.prices.insert(asset, price);
        self
    }

    pub fn set_price(&mut self, asset: Address, price: U256) {
        self.prices.insert(asset, price);
    }
}

impl PriceSource for FixedPriceSource {
    fn price(&self, asset: &Address) -> PortResult<U256> {
        self.prices
            .get(asset)
            .copied()
            .ok_or(PortError::NoPrice(*asset))
    }
}

// ============================================================================
// Venue
// ============================================================================

/// How the oracle venue handles swaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VenueMode {
    /// Fill at the oracle rate less the fee.
    #[default]
    Fill,
    /// Refuse every swap.
    Reject,
}

/// A venue that quotes every hop at the ratio of two oracle prices and pays
/// out of its own reserves on the ledger.
#[derive(Clone, Debug)]
pub struct OracleVenue {
    id: Address,
    rates: FixedPriceSource,
    fee_bps: Bps,
    mode: VenueMode,
}

impl OracleVenue {
    /// `id` is the venue's own ledger identity: it is the spender the
    /// holding approves and the holder of the output reserves.
    pub fn new(id: Address, rates: FixedPriceSource) -> Self {
        Self {
            id,
            rates,
            fee_bps: 0,
            mode: VenueMode::Fill,
        }
    }

    pub fn with_fee_bps(mut self, fee_bps: Bps) -> Self {
        self.fee_bps = fee_bps.min(BPS_DENOMINATOR);
        self
    }

    pub fn with_mode(mut self, mode: VenueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn id(&self) -> Address {
        self.id
    }

    /// Per-hop amounts for selling `amount_in` along `path`.
    pub fn quote(&self, amount_in: U256, path: &[Address]) -> PortResult<Vec<U256>> {
        if path.len() < 2 {
            return Err(PortError::SwapRejected(format!(
                "path needs at least two assets, got {}",
                path.len()
            )));
        }
        let keep = U256::from(BPS_DENOMINATOR - self.fee_bps);
        let mut amounts = Vec::with_capacity(path.len());
        amounts.push(amount_in);
        for hop in path.windows(2) {
            let price_in = self.rates.price(&hop[0])?;
            let price_out = self.rates.price(&hop[1])?;
            if price_out.is_zero() {
                return Err(PortError::SwapRejected(format!("zero price for {}", hop[1])));
            }
            let last = amounts[amounts.len() - 1];
            let gross = last
                .checked_mul(price_in)
                .ok_or(ArithmeticError::Overflow("venue quote"))?
                / price_out;
            let net = gross
                .checked_mul(keep)
                .ok_or(ArithmeticError::Overflow("venue fee"))?
                / U256::from(BPS_DENOMINATOR);
            amounts.push(net);
        }
        Ok(amounts)
    }
}

impl ExchangeVenue for OracleVenue {
    fn swap_exact_input(
        &mut self,
        ledger: &mut dyn TokenLedger,
        sender: &Address,
        request: &SwapRequest,
        now: u64,
    ) -> PortResult<Vec<U256>> {
        if self.mode == VenueMode::Reject {
            return Err(PortError::SwapRejected("venue is not accepting swaps".into()));
        }
        if now > request.deadline {
            return Err(PortError::DeadlineExpired {
                deadline: request.deadline,
                now,
            });
        }

        let amounts = self.quote(request.amount_in, &request.path)?;
        let amount_out = amounts[amounts.len() - 1];
        if amount_out < request.min_amount_out {
            return Err(PortError::InsufficientOutput {
                amount_out,
                min_amount_out: request.min_amount_out,
            });
        }

        let sell = request.path[0];
        let buy = request.path[request.path.len() - 1];

        // Check everything up front so a failure leaves the ledger untouched.
        let allowed = ledger.allowance(&sell, sender, &self.id)?;
        if allowed < request.amount_in {
            return Err(PortError::InsufficientAllowance {
                asset: sell,
                owner: *sender,
                spender: self.id,
                available: allowed,
                required: request.amount_in,
            });
        }
        let held = ledger.balance_of(&sell, sender)?;
        if held < request.amount_in {
            return Err(PortError::InsufficientBalance {
                asset: sell,
                holder: *sender,
                available: held,
                required: request.amount_in,
            });
        }
        let reserve = ledger.balance_of(&buy, &self.id)?;
        if reserve < amount_out {
            return Err(PortError::InsufficientBalance {
                asset: buy,
                holder: self.id,
                available: reserve,
                required: amount_out,
            });
        }

        ledger.transfer_from(&sell, &self.id, sender, &self.id, request.amount_in)?;
        ledger.transfer(&buy, &self.id, &request.recipient, amount_out)?;
        Ok(amounts)
    }
}

// ============================================================================
// Host
// ============================================================================

/// Builder for [`LocalHost`].
pub struct LocalHostBuilder {
    ledger: MemoryLedger,
    price_sources: FxHashMap<Address, FixedPriceSource>,
    oracle_venues: Vec<(Address, Address, Bps, VenueMode)>,
    venues: FxHashMap<Address, Box<dyn ExchangeVenue>>,
    now: u64,
}

impl LocalHostBuilder {
    pub fn with_price_source(mut self, id: Address, source: FixedPriceSource) -> Self {
        self.price_sources.insert(id, source);
        self
    }

    /// An [`OracleVenue`] quoting from the price source `source` as it
    /// stands when [`build`](Self::build) runs.
    pub fn with_oracle_venue(self, id: Address, source: Address) -> Self {
        self.with_oracle_venue_mode(id, source, 0, VenueMode::Fill)
    }

    pub fn with_oracle_venue_mode(
        mut self,
        id: Address,
        source: Address,
        fee_bps: Bps,
        mode: VenueMode,
    ) -> Self {
        self.oracle_venues.push((id, source, fee_bps, mode));
        self
    }

    pub fn with_venue(mut self, id: Address, venue: Box<dyn ExchangeVenue>) -> Self {
        self.venues.insert(id, venue);
        self
    }

    pub fn with_balance(mut self, asset: Address, holder: Address, amount: U256) -> Self {
        self.ledger.set_balance(asset, holder, amount);
        self
    }

    /// Balance given in whole units (`amount * 10^18`).
    pub fn with_units(self, asset: Address, holder: Address, amount: u64) -> Self {
        self.with_balance(asset, holder, U256::from(amount) * price_unit())
    }

    pub fn at_time(mut self, now: u64) -> Self {
        self.now = now;
        self
    }

    pub fn build(self) -> LocalHost {
        let mut venues = self.venues;
        for (id, source, fee_bps, mode) in self.oracle_venues {
            let rates = self.price_sources.get(&source).cloned().unwrap_or_default();
            let venue = OracleVenue::new(id, rates)
                .with_fee_bps(fee_bps)
                .with_mode(mode);
            venues.insert(id, Box::new(venue));
        }
        LocalHost {
            ledger: self.ledger,
            price_sources: self.price_sources,
            venues,
            now: self.now,
            swaps: Vec::new(),
        }
    }
}

/// A [`Host`] backed entirely by memory. Records every forwarded swap.
pub struct LocalHost {
    ledger: MemoryLedger,
    price_sources: FxHashMap<Address, FixedPriceSource>,
    venues: FxHashMap<Address, Box<dyn ExchangeVenue>>,
    now: u64,
    swaps: Vec<RecordedSwap>,
}

impl LocalHost {
    pub fn builder() -> LocalHostBuilder {
        LocalHostBuilder {
            ledger: MemoryLedger::new(),
            price_sources: FxHashMap::default(),
            oracle_venues: Vec::new(),
            venues: FxHashMap::default(),
            now: 1_700_000_000,
        }
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut MemoryLedger {
        &mut self.ledger
    }

    /// Update a price in a registered source. Oracle venues keep the rates
    /// they were built with.
    pub fn set_price(&mut self, source: &Address, asset: Address, price: U256) -> PortResult<()> {
        let table = self
            .price_sources
            .get_mut(source)
            .ok_or(PortError::UnknownPriceSource(*source))?;
        table.set_price(asset, price);
        Ok(())
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.now = self.now.saturating_add(seconds);
    }

    /// Every swap forwarded to a venue, in order.
    pub fn recorded_swaps(&self) -> &[RecordedSwap] {
        &self.swaps
    }
}

impl Host for LocalHost {
    fn balance_of(&self, asset: &Address, holder: &Address) -> PortResult<U256> {
        self.ledger.balance_of(asset, holder)
    }

    fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> PortResult<U256> {
        self.ledger.allowance(asset, owner, spender)
    }

    fn approve(
        &mut self,
        asset: &Address,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> PortResult<()> {
        self.ledger.approve(asset, owner, spender, amount)
    }

    fn price(&self, source: &Address, asset: &Address) -> PortResult<U256> {
        self.price_sources
            .get(source)
            .ok_or(PortError::UnknownPriceSource(*source))?
            .price(asset)
    }

    fn swap_exact_input(
        &mut self,
        venue: &Address,
        sender: &Address,
        request: &SwapRequest,
    ) -> PortResult<Vec<U256>> {
        let target = self
            .venues
            .get_mut(venue)
            .ok_or(PortError::UnknownVenue(*venue))?;
        let result = target.swap_exact_input(&mut self.ledger, sender, request, self.now);
        match &result {
            Ok(amounts) => info!(
                "swap via {venue}: {} in, {} out",
                request.amount_in,
                amounts.last().copied().unwrap_or_default()
            ),
            Err(e) => warn!("swap via {venue} failed: {e}"),
        }
        self.swaps.push(RecordedSwap {
            venue: *venue,
            sender: *sender,
            request: request.clone(),
            amounts: result.as_ref().ok().cloned(),
        });
        result
    }

    fn now(&self) -> u64 {
        self.now
    }
}
