//! Sparse per-epoch value series.
//!
//! Stores `(epoch, value)` points in ascending epoch order; the last written
//! value persists for every later epoch until overwritten. This is the
//! storage shape behind all historical retrospective reads: values are only
//! recorded when they change, never once per epoch.

use crate::epoch::Epoch;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSeries {
    points: Vec<(Epoch, u128)>,
}

impl EpochSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `epoch`. Overwrites a same-epoch point, appends
    /// otherwise. Writes must arrive in non-decreasing epoch order.
    pub fn set(&mut self, epoch: Epoch, value: u128) {
        match self.points.last_mut() {
            Some((last, v)) if *last == epoch => *v = value,
            Some((last, _)) => {
                debug_assert!(*last < epoch, "series written out of order");
                self.points.push((epoch, value));
            }
            None => self.points.push((epoch, value)),
        }
    }

    /// The value in effect at `epoch`: the last point at or before it, zero
    /// if the series starts later.
    pub fn value_at(&self, epoch: Epoch) -> u128 {
        let idx = self.points.partition_point(|(e, _)| *e <= epoch);
        if idx == 0 {
            0
        } else {
            self.points[idx - 1].1
        }
    }

    /// Latest recorded value, zero when empty.
    pub fn latest(&self) -> u128 {
        self.points.last().map(|(_, v)| *v).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_reads_zero() {
        let s = EpochSeries::new();
        assert_eq!(s.value_at(0), 0);
        assert_eq!(s.value_at(100), 0);
        assert_eq!(s.latest(), 0);
    }

    #[test]
    fn last_written_value_persists() {
        let mut s = EpochSeries::new();
        s.set(3, 100);
        s.set(7, 40);

        assert_eq!(s.value_at(2), 0);
        assert_eq!(s.value_at(3), 100);
        assert_eq!(s.value_at(6), 100);
        assert_eq!(s.value_at(7), 40);
        assert_eq!(s.value_at(1_000), 40);
        assert_eq!(s.latest(), 40);
    }

    #[test]
    fn same_epoch_write_overwrites() {
        let mut s = EpochSeries::new();
        s.set(5, 10);
        s.set(5, 25);
        assert_eq!(s.value_at(5), 25);
        assert_eq!(s.value_at(4), 0);
    }
}
