use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use capstan_fees::BondingFeeDistributor;
use capstan_nullables::{NullUpstream, NullVault};
use capstan_types::{Account, ProtocolParams, Timestamp, TokenId};

const WEEK: u64 = 604_800;
const START: u64 = WEEK * 2_700;

fn account(name: &str) -> Account {
    Account::new(format!("cap_{name}"))
}

fn week(n: u64) -> Timestamp {
    Timestamp::new(START + n * WEEK)
}

/// One bonded depositor plus `epochs` consecutive filled fee buckets.
fn seeded_distributor(epochs: u64) -> (BondingFeeDistributor, NullUpstream) {
    let params = ProtocolParams::standard(Timestamp::new(START));
    let mut dist = BondingFeeDistributor::new(&params, account("owner"), account("treasury"));
    let mut upstream = NullUpstream::new();
    let mut vault = NullVault::new();
    let usdc = TokenId::new("usdc");

    vault.mint(&account("alice"), 1_000);
    dist.deposit(&account("alice"), &account("alice"), 1_000, &mut vault, week(0))
        .unwrap();
    for e in 0..epochs {
        upstream.accrue_fees(&usdc, 1_000);
        dist.fetch_fees(std::slice::from_ref(&usdc), &mut upstream, week(e))
            .unwrap();
    }
    (dist, upstream)
}

fn bench_claimable_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("claimable");
    let usdc = TokenId::new("usdc");

    for buckets in [1u64, 10, 100, 1_000] {
        let (dist, _) = seeded_distributor(buckets);
        let now = week(buckets + 2);
        group.bench_with_input(BenchmarkId::new("buckets", buckets), &buckets, |b, _| {
            b.iter(|| {
                black_box(
                    dist.claimable(&account("alice"), std::slice::from_ref(&usdc), black_box(now)),
                )
            });
        });
    }

    group.finish();
}

fn bench_deposit(c: &mut Criterion) {
    c.bench_function("engine_deposit", |b| {
        b.iter_batched(
            || {
                let (dist, _) = seeded_distributor(0);
                let mut vault = NullVault::new();
                vault.mint(&account("bob"), 500);
                (dist, vault)
            },
            |(mut dist, mut vault)| {
                dist.deposit(&account("bob"), &account("bob"), black_box(500), &mut vault, week(0))
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_unbondable_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("unbondable");

    for entries in [1usize, 100, 10_000] {
        let (mut dist, _) = seeded_distributor(0);
        for _ in 0..entries {
            dist.notify_balance_increase(&account("alice"), 1, week(0))
                .unwrap();
        }
        group.bench_with_input(
            BenchmarkId::new("queue_entries", entries),
            &entries,
            |b, _| {
                b.iter(|| black_box(dist.unbondable_balance(&account("alice"), week(2))));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_claimable_walk, bench_deposit, bench_unbondable_walk);
criterion_main!(benches);
