use proptest::prelude::*;

use capstan_locker::LockLedger;
use capstan_types::{Account, ProtocolParams, Timestamp};

const WEEK: u64 = 604_800;
const START: u64 = WEEK * 2_700;
const OWNERS: usize = 3;

fn make_ledger() -> LockLedger {
    LockLedger::new(&ProtocolParams::standard(Timestamp::new(START)))
}

fn owner(n: usize) -> Account {
    Account::new(format!("cap_owner_{n}"))
}

fn week(n: u64) -> Timestamp {
    Timestamp::new(START + n * WEEK)
}

/// (owner index, amount, duration in epochs, lock week)
fn lock_ops() -> impl Strategy<Value = Vec<(usize, u128, u64, u64)>> {
    prop::collection::vec(
        (0..OWNERS, 1u128..1_000_000, 1u64..=16, 0u64..8),
        1..20,
    )
}

/// Brute-force weight of one owner at `epoch`: the sum of every lock that
/// starts at or before it and expires after it.
fn oracle_weight(ops: &[(usize, u128, u64, u64)], who: usize, epoch: u64) -> u128 {
    ops.iter()
        .filter(|(o, _, duration, start)| {
            *o == who && *start <= epoch && epoch < start + duration
        })
        .map(|(_, amount, _, _)| amount)
        .sum()
}

proptest! {
    /// Ledger weights agree with a brute-force recomputation at every epoch,
    /// per owner and in total.
    #[test]
    fn weights_match_oracle(mut ops in lock_ops()) {
        ops.sort_by_key(|(_, _, _, start)| *start);
        let mut ledger = make_ledger();
        for (o, amount, duration, start) in &ops {
            ledger.lock(&owner(*o), *amount, *duration, week(*start)).unwrap();
        }

        for epoch in 0..26 {
            let mut total = 0u128;
            for o in 0..OWNERS {
                let expected = oracle_weight(&ops, o, epoch);
                prop_assert_eq!(ledger.weight_of(&owner(o), epoch), expected);
                total += expected;
            }
            prop_assert_eq!(ledger.total_weight(epoch), total);
        }
    }

    /// Active locks are ascending by remaining duration and sum to the
    /// owner's weight for the probe epoch.
    #[test]
    fn active_locks_are_sorted_and_complete(
        mut ops in lock_ops(),
        probe in 0u64..12,
    ) {
        ops.sort_by_key(|(_, _, _, start)| *start);
        let mut ledger = make_ledger();
        for (o, amount, duration, start) in &ops {
            ledger.lock(&owner(*o), *amount, *duration, week(*start)).unwrap();
        }
        let probe = probe.max(ops.last().map(|(_, _, _, s)| *s).unwrap_or(0));

        for o in 0..OWNERS {
            let locks = ledger.active_locks(&owner(o), week(probe));
            for pair in locks.windows(2) {
                prop_assert!(pair[0].0 < pair[1].0);
            }
            let listed: u128 = locks.iter().map(|(_, amount)| amount).sum();
            prop_assert_eq!(listed, oracle_weight(&ops, o, probe));
        }
    }

    /// Extending a lock never changes the weight of the epoch it happens in.
    #[test]
    fn extend_preserves_current_weight(
        amounts in prop::collection::vec((1u128..1_000_000, 1u64..=16), 1..6),
        at in 0u64..4,
    ) {
        let mut ledger = make_ledger();
        let alice = owner(0);
        for (amount, duration) in &amounts {
            ledger.lock(&alice, *amount, *duration, week(0)).unwrap();
        }

        let before = ledger.weight_of(&alice, at);
        let total_before = ledger.total_weight(at);
        if ledger.extend_lock(&alice, week(at)).is_ok() {
            prop_assert_eq!(ledger.weight_of(&alice, at), before);
            prop_assert_eq!(ledger.total_weight(at), total_before);
        }
    }

    /// A snapshot restores to an equivalent ledger.
    #[test]
    fn snapshot_preserves_weights(mut ops in lock_ops()) {
        ops.sort_by_key(|(_, _, _, start)| *start);
        let params = ProtocolParams::standard(Timestamp::new(START));
        let mut ledger = LockLedger::new(&params);
        for (o, amount, duration, start) in &ops {
            ledger.lock(&owner(*o), *amount, *duration, week(*start)).unwrap();
        }

        let restored = LockLedger::load_state(&ledger.save_state(), &params);
        for epoch in 0..26 {
            prop_assert_eq!(restored.total_weight(epoch), ledger.total_weight(epoch));
            for o in 0..OWNERS {
                prop_assert_eq!(
                    restored.weight_of(&owner(o), epoch),
                    ledger.weight_of(&owner(o), epoch)
                );
            }
        }
    }
}
