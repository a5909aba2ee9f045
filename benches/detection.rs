//! Detection benchmarks: valuation snapshot, imbalance check, setup digest.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use driftguard::imbalance;
use driftguard::typed_data::setup_digest;
use driftguard::{price_unit, Address, AssetPolicy, PolicyParams, ValuationSnapshot, U256};

/// `n` assets with equal targets and slightly uneven balances.
fn fixture(n: usize) -> (Vec<(Address, U256, U256)>, Vec<AssetPolicy>) {
    let share = 10_000 / n as u32;
    let mut quotes = Vec::with_capacity(n);
    let mut policies = Vec::with_capacity(n);

    // Simple deterministic PRNG (xorshift32)
    let mut rng_state: u32 = 42;
    for i in 0..n {
        rng_state ^= rng_state << 13;
        rng_state ^= rng_state >> 17;
        rng_state ^= rng_state << 5;

        let mut id = [0u8; 20];
        id[..8].copy_from_slice(&(i as u64).to_be_bytes());
        let asset = Address(id);
        let balance = U256::from(1_000_000u64 + u64::from(rng_state % 50_000)) * price_unit();
        quotes.push((asset, balance, price_unit()));
        policies.push(AssetPolicy::new(asset, share));
    }
    (quotes, policies)
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("valuation_snapshot");
    for n in [3usize, 10, 50] {
        let (quotes, _) = fixture(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &quotes, |b, quotes| {
            b.iter(|| ValuationSnapshot::from_quotes(black_box(quotes.clone())).unwrap())
        });
    }
    group.finish();
}

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_disbalanced");
    for n in [3usize, 10, 50] {
        let (quotes, policies) = fixture(n);
        let snapshot = ValuationSnapshot::from_quotes(quotes).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &policies, |b, policies| {
            b.iter(|| imbalance::is_disbalanced(black_box(&snapshot), policies, 500).unwrap())
        });
    }
    group.finish();
}

fn bench_digest(c: &mut Criterion) {
    let (_, policies) = fixture(10);
    let params = PolicyParams {
        assets: policies,
        imbalance_tolerance_bps: 500,
        max_trade_fraction_bps: 100,
        venue: Address::repeat_byte(1),
        price_source: Address::repeat_byte(2),
        agent: Address::repeat_byte(3),
        administrator: Address::repeat_byte(4),
    };
    let holding = Address::repeat_byte(5);
    c.bench_function("setup_digest_10_assets", |b| {
        b.iter(|| setup_digest(black_box(&params), &holding))
    });
}

criterion_group!(benches, bench_snapshot, bench_detection, bench_digest);
criterion_main!(benches);
