//! Per-epoch weight history with scheduled decay.

use crate::error::LockerError;
use capstan_types::{Epoch, EpochSeries};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight history for one owner (or for the global total).
///
/// Every change is recorded twice: the running value goes into a sparse
/// `EpochSeries` for retrospective reads, and each lock's expiry puts a
/// pending decrement into `decay`. A lock of any duration is O(1) to
/// create and O(1) amortized to expire — expiry epochs are visited once,
/// never iterated per epoch of the lock's life.
///
/// Invariant: the pending decrements always sum to `current` (every active
/// unit of weight expires exactly once).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WeightTrack {
    series: EpochSeries,
    decay: BTreeMap<Epoch, u128>,
    current: u128,
    synced: Epoch,
}

impl WeightTrack {
    /// Apply all scheduled decrements up to and including `epoch`, writing
    /// each change into the series.
    pub fn sync_to(&mut self, epoch: Epoch) {
        if epoch <= self.synced {
            return;
        }
        let due: Vec<Epoch> = self.decay.range(..=epoch).map(|(e, _)| *e).collect();
        for e in due {
            let d = self.decay.remove(&e).unwrap_or(0);
            self.current = self.current.saturating_sub(d);
            self.series.set(e, self.current);
        }
        self.synced = epoch;
    }

    /// Record `amount` of new weight starting at `epoch` and expiring at
    /// `expiry` (weight counts for epochs `epoch..expiry`).
    pub fn add(&mut self, epoch: Epoch, amount: u128, expiry: Epoch) -> Result<(), LockerError> {
        debug_assert!(expiry > epoch, "weight must expire after it starts");
        self.sync_to(epoch);
        let new_current = self
            .current
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;
        let new_decay = self
            .decay
            .get(&expiry)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;
        self.current = new_current;
        self.series.set(epoch, self.current);
        self.decay.insert(expiry, new_decay);
        Ok(())
    }

    /// Move `amount` of scheduled decay from `from` to `to` (lock
    /// extension). The running weight does not change.
    pub fn reschedule(
        &mut self,
        epoch: Epoch,
        amount: u128,
        from: Epoch,
        to: Epoch,
    ) -> Result<(), LockerError> {
        self.sync_to(epoch);
        let at_from = self.decay.get(&from).copied().unwrap_or(0);
        debug_assert!(at_from >= amount, "rescheduling more than is scheduled");
        let new_to = self
            .decay
            .get(&to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(LockerError::Overflow)?;
        if at_from == amount {
            self.decay.remove(&from);
        } else {
            self.decay.insert(from, at_from - amount);
        }
        self.decay.insert(to, new_to);
        Ok(())
    }

    /// The weight in effect at `epoch`. Pure: spans past the synced epoch
    /// are resolved by walking the pending decrements.
    pub fn value_at(&self, epoch: Epoch) -> u128 {
        if epoch <= self.synced {
            return self.series.value_at(epoch);
        }
        let pending: u128 = self
            .decay
            .range(..=epoch)
            .map(|(_, d)| *d)
            .sum();
        self.current.saturating_sub(pending)
    }

    /// The running weight as of the synced epoch.
    pub fn current(&self) -> u128 {
        self.current
    }

    pub fn synced_through(&self) -> Epoch {
        self.synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_decays_at_expiry() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();

        assert_eq!(track.value_at(0), 100);
        assert_eq!(track.value_at(3), 100);
        assert_eq!(track.value_at(4), 0);
        assert_eq!(track.value_at(50), 0);
    }

    #[test]
    fn reads_do_not_require_sync() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();
        track.add(0, 70, 2).unwrap();

        // Nothing synced past epoch 0, but every epoch reads correctly.
        assert_eq!(track.synced_through(), 0);
        assert_eq!(track.value_at(1), 170);
        assert_eq!(track.value_at(2), 100);
        assert_eq!(track.value_at(3), 100);
        assert_eq!(track.value_at(4), 0);
    }

    #[test]
    fn sync_materializes_the_series() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();
        track.add(0, 70, 2).unwrap();
        track.sync_to(10);

        assert_eq!(track.synced_through(), 10);
        assert_eq!(track.current(), 0);
        assert_eq!(track.value_at(1), 170);
        assert_eq!(track.value_at(2), 100);
        assert_eq!(track.value_at(4), 0);
    }

    #[test]
    fn later_add_preserves_history() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();
        track.add(6, 50, 10).unwrap();

        assert_eq!(track.value_at(3), 100);
        assert_eq!(track.value_at(4), 0);
        assert_eq!(track.value_at(5), 0);
        assert_eq!(track.value_at(6), 50);
        assert_eq!(track.value_at(9), 50);
        assert_eq!(track.value_at(10), 0);
    }

    #[test]
    fn reschedule_moves_decay_without_changing_weight() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();
        track.reschedule(0, 100, 4, 16).unwrap();

        assert_eq!(track.value_at(0), 100);
        assert_eq!(track.value_at(4), 100);
        assert_eq!(track.value_at(15), 100);
        assert_eq!(track.value_at(16), 0);
    }

    #[test]
    fn partial_reschedule_splits_the_decay() {
        let mut track = WeightTrack::default();
        track.add(0, 100, 4).unwrap();
        track.add(0, 60, 4).unwrap();
        track.reschedule(0, 60, 4, 8).unwrap();

        assert_eq!(track.value_at(3), 160);
        assert_eq!(track.value_at(4), 60);
        assert_eq!(track.value_at(7), 60);
        assert_eq!(track.value_at(8), 0);
    }
}
