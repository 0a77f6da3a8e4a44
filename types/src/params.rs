//! Protocol parameters — epoch geometry plus every distribution tunable.
//!
//! All values are fixed at deployment; engines read them through a shared
//! `ProtocolParams` instance.

use crate::epoch::EpochClock;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// All protocol parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Epoch geometry ───────────────────────────────────────────────────
    /// Protocol start, aligned to an epoch boundary.
    pub start_time: Timestamp,

    /// Epoch length in seconds. Default: 7 days = 604800.
    pub epoch_secs: u64,

    /// Lead of the lock ledger's clock: its epoch boundaries arrive this
    /// many seconds before the calendar boundaries, freezing weight
    /// snapshots when the voting window opens. Default: 3 days.
    pub locker_epoch_lead_secs: u64,

    // ── Locking ──────────────────────────────────────────────────────────
    /// Longest permitted lock, in epochs. Default: 16.
    pub max_lock_epochs: u64,

    // ── Voting ───────────────────────────────────────────────────────────
    /// Trailing window of each epoch during which votes may be cast.
    /// Default: 3 days = 259200 seconds.
    pub vote_window_secs: u64,

    /// Divisor for the reserved fixed-pool allocation once activated
    /// (20 = 5% of the external budget). Default: 20.
    pub fixed_alloc_divisor: u128,

    /// Minimum caller weight required to open a pool-approval ballot,
    /// as basis points of total weight. Default: 100 (1%).
    pub min_ballot_weight_bps: u32,

    /// Cooldown between approval-ballot creations, global across callers.
    /// Default: 30 days.
    pub ballot_cooldown_secs: u64,

    // ── Bonding & fees ───────────────────────────────────────────────────
    /// Age at which a vault balance increase becomes unbondable.
    /// Default: 7 days = 604800 seconds.
    pub maturation_secs: u64,

    /// Duration of the linear unbonding stream. Default: 7 days.
    pub unbond_stream_secs: u64,

    /// Number of epochs a fee bucket stays locked after its epoch ends.
    /// Default: 2 (fees fetched in epoch E claimable from E + 2).
    pub fee_claim_lag: u64,

    /// Minimum age of a token's last fee fetch before the claim path pulls
    /// again. Default: 1 day.
    pub fetch_cooldown_secs: u64,
}

impl ProtocolParams {
    /// Standard configuration, anchored at `start_time`.
    pub fn standard(start_time: Timestamp) -> Self {
        Self {
            start_time,
            epoch_secs: 7 * 24 * 3600,            // 7 days
            locker_epoch_lead_secs: 3 * 24 * 3600, // 3 days

            max_lock_epochs: 16,

            vote_window_secs: 3 * 24 * 3600, // 3 days
            fixed_alloc_divisor: 20,         // 5%
            min_ballot_weight_bps: 100,      // 1%
            ballot_cooldown_secs: 30 * 24 * 3600, // 30 days

            maturation_secs: 7 * 24 * 3600,    // 7 days
            unbond_stream_secs: 7 * 24 * 3600, // 7 days
            fee_claim_lag: 2,
            fetch_cooldown_secs: 24 * 3600, // 1 day
        }
    }

    /// Calendar clock: epochs counted from `start_time`.
    pub fn calendar_clock(&self) -> EpochClock {
        EpochClock::new(self.start_time, self.epoch_secs)
    }

    /// Lock-ledger clock: same indices, boundaries arriving
    /// `locker_epoch_lead_secs` early.
    pub fn locker_clock(&self) -> EpochClock {
        self.calendar_clock().with_lead(self.locker_epoch_lead_secs)
    }
}

/// Default is the standard configuration anchored at time zero.
impl Default for ProtocolParams {
    fn default() -> Self {
        Self::standard(Timestamp::EPOCH)
    }
}
