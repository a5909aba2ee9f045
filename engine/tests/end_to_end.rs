//! Three-asset holding: balanced, pushed out of band by a deposit, then
//! walked back with capped trades.

use driftguard::signature::{address_of, sign_setup, signing_key_from_hex};
use driftguard::{price_unit, Address, AssetPolicy, PolicyParams, U256};
use driftguard_engine::{CallContext, PolicyEngine, PolicyError, PolicyEvent};
use driftguard_ports::local::{FixedPriceSource, LocalHost};
use driftguard_ports::Host;

const DAI: Address = Address::repeat_byte(0xd1);
const ETH: Address = Address::repeat_byte(0xe7);
const BTC: Address = Address::repeat_byte(0xb7);
const ORACLE: Address = Address::repeat_byte(0x0a);
const VENUE: Address = Address::repeat_byte(0x0e);
const AGENT: Address = Address::repeat_byte(0xa9);
const ADMIN: Address = Address::repeat_byte(0xad);

fn e18(n: u64) -> U256 {
    U256::from(n) * price_unit()
}

fn params() -> PolicyParams {
    PolicyParams {
        assets: vec![
            AssetPolicy::new(DAI, 5000),
            AssetPolicy::new(ETH, 3000),
            AssetPolicy::new(BTC, 2000),
        ],
        imbalance_tolerance_bps: 500,
        max_trade_fraction_bps: 100,
        venue: VENUE,
        price_source: ORACLE,
        agent: AGENT,
        administrator: ADMIN,
    }
}

fn setup() -> (PolicyEngine, LocalHost) {
    let key = signing_key_from_hex(&"46".repeat(32)).unwrap();
    let holding = address_of(key.verifying_key());
    let proof = sign_setup(&key, &params(), &holding).unwrap();

    let mut engine = PolicyEngine::new(holding);
    engine.setup(params(), &proof.to_compact()).unwrap();

    let host = LocalHost::builder()
        .with_price_source(
            ORACLE,
            FixedPriceSource::new()
                .with_price(DAI, e18(1))
                .with_price(ETH, e18(1))
                .with_price(BTC, e18(2000)),
        )
        .with_oracle_venue(VENUE, ORACLE)
        .with_units(DAI, holding, 5000)
        .with_units(ETH, holding, 3000)
        .with_units(BTC, holding, 1)
        .with_units(ETH, VENUE, 10_000)
        .with_units(BTC, VENUE, 10)
        .build();
    (engine, host)
}

#[test]
fn starts_balanced() {
    let (engine, host) = setup();
    let snapshot = engine.valuation(&host).unwrap();
    assert_eq!(snapshot.total_value, e18(10_000));
    assert!(!engine.is_disbalanced(&host).unwrap());
}

#[test]
fn deposit_then_capped_trades_restore_balance() {
    let (mut engine, mut host) = setup();
    let holding = engine.holding();

    host.ledger_mut().mint(DAI, holding, e18(2000)).unwrap();
    let snapshot = engine.valuation(&host).unwrap();
    assert_eq!(snapshot.total_value, e18(12_000));
    // DAI at 7000 of 12000 (58.3%) against 50% +/- 5%
    assert!(engine.is_disbalanced(&host).unwrap());

    let agent = CallContext::new(AGENT);
    let mut trades = 0;
    let targets = [ETH, BTC];
    while engine.is_disbalanced(&host).unwrap() {
        assert!(trades < 20, "did not converge");
        let cap = engine.trade_cap(&host, &DAI).unwrap();
        let buy = targets[trades % 2];
        engine
            .execute_rebalance(&agent, &mut host, &[DAI, buy], cap)
            .unwrap();
        trades += 1;
    }

    // Total value is conserved by a fee-free venue at oracle prices, up to
    // truncation in the BTC leg.
    let after = engine.valuation(&host).unwrap();
    assert!(after.total_value <= e18(12_000));
    assert!(after.total_value > e18(11_999));

    let dai_share = after.share_bps(&DAI);
    assert!(dai_share <= U256::from(5500u64));
    assert!(dai_share >= U256::from(4500u64));

    let executed = engine
        .events()
        .iter()
        .filter(|e| matches!(e, PolicyEvent::RebalanceExecuted { .. }))
        .count();
    assert_eq!(executed, trades);
}

#[test]
fn cap_boundary_on_deposit_scenario() {
    let (mut engine, mut host) = setup();
    let holding = engine.holding();
    host.ledger_mut().mint(DAI, holding, e18(2000)).unwrap();

    let agent = CallContext::new(AGENT);
    let cap = e18(7000) * U256::from(100u64) / U256::from(10_000u64);
    assert_eq!(engine.trade_cap(&host, &DAI).unwrap(), cap);

    let over = cap + U256::one();
    assert_eq!(
        engine.execute_rebalance(&agent, &mut host, &[DAI, ETH], over),
        Err(PolicyError::TradeTooLarge {
            amount_in: over,
            cap
        })
    );
    assert_eq!(host.balance_of(&DAI, &holding).unwrap(), e18(7000));

    engine
        .execute_rebalance(&agent, &mut host, &[DAI, ETH], cap)
        .unwrap();
    assert_eq!(host.balance_of(&DAI, &holding).unwrap(), e18(7000) - cap);
    assert_eq!(host.balance_of(&ETH, &holding).unwrap(), e18(3000) + cap);
}

#[test]
fn detection_is_read_only() {
    let (engine, host) = setup();
    let holding = engine.holding();
    let before: Vec<U256> = [DAI, ETH, BTC]
        .iter()
        .map(|a| host.balance_of(a, &holding).unwrap())
        .collect();
    for _ in 0..3 {
        engine.is_disbalanced(&host).unwrap();
        engine.drift_report(&host).unwrap();
    }
    let after: Vec<U256> = [DAI, ETH, BTC]
        .iter()
        .map(|a| host.balance_of(a, &holding).unwrap())
        .collect();
    assert_eq!(before, after);
    assert_eq!(engine.events().len(), 1);
    assert!(host.recorded_swaps().is_empty());
}

#[test]
fn admin_venue_switch_takes_effect_on_next_trade() {
    let (mut engine, _) = setup();
    let holding = engine.holding();
    let new_venue = Address::repeat_byte(0x0f);

    let mut host = LocalHost::builder()
        .with_price_source(
            ORACLE,
            FixedPriceSource::new()
                .with_price(DAI, e18(1))
                .with_price(ETH, e18(1))
                .with_price(BTC, e18(2000)),
        )
        .with_oracle_venue(VENUE, ORACLE)
        .with_oracle_venue(new_venue, ORACLE)
        .with_units(DAI, holding, 7000)
        .with_units(ETH, holding, 3000)
        .with_units(BTC, holding, 1)
        .with_units(ETH, VENUE, 100)
        .with_units(ETH, new_venue, 100)
        .build();

    let admin = CallContext::new(ADMIN);
    engine.set_venue(&admin, new_venue).unwrap();

    let agent = CallContext::new(AGENT);
    engine
        .execute_rebalance(&agent, &mut host, &[DAI, ETH], e18(10))
        .unwrap();
    assert_eq!(host.recorded_swaps()[0].venue, new_venue);
    assert_eq!(host.balance_of(&ETH, &new_venue).unwrap(), e18(90));
    assert_eq!(host.balance_of(&ETH, &VENUE).unwrap(), e18(100));
}
