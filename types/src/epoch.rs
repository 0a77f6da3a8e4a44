//! Epoch arithmetic.
//!
//! The protocol divides time into fixed-length epochs counted from a start
//! timestamp aligned to an epoch boundary. All historical accounting is
//! keyed by epoch index.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Index of a protocol epoch.
pub type Epoch = u64;

/// Converts wall-clock time to epoch indices and back. Pure and stateless.
///
/// A clock may carry a lead: its boundaries arrive `lead` seconds before the
/// calendar boundaries while the indices stay aligned with the calendar
/// series. The lock ledger runs on a 3-day-lead clock, so its weight
/// snapshot for epoch E is frozen by the time the epoch-E voting window
/// opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochClock {
    start: Timestamp,
    epoch_secs: u64,
}

impl EpochClock {
    pub fn new(start: Timestamp, epoch_secs: u64) -> Self {
        assert!(epoch_secs > 0, "epoch length must be positive");
        Self { start, epoch_secs }
    }

    /// Same epoch indices, boundaries arriving `lead` seconds earlier.
    pub fn with_lead(&self, lead: u64) -> Self {
        Self {
            start: Timestamp::new(self.start.as_secs().saturating_sub(lead)),
            epoch_secs: self.epoch_secs,
        }
    }

    pub fn epoch_secs(&self) -> u64 {
        self.epoch_secs
    }

    /// The epoch containing `now`. Zero before the start timestamp.
    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        self.start.elapsed_since(now) / self.epoch_secs
    }

    /// The instant `epoch` begins.
    pub fn epoch_boundary(&self, epoch: Epoch) -> Timestamp {
        self.start.offset(epoch * self.epoch_secs)
    }

    /// Seconds of `epoch` already elapsed at `now`: zero before the epoch
    /// starts, capped at the epoch length once it ends.
    pub fn elapsed_in(&self, epoch: Epoch, now: Timestamp) -> u64 {
        self.epoch_boundary(epoch)
            .elapsed_since(now)
            .min(self.epoch_secs)
    }
}
