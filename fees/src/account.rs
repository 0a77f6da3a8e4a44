//! Per-account balance tiers.
//!
//! Bonded balance is entered only through an explicit deposit and counts
//! toward fee weighting immediately. Vault balance increases instead land
//! in the maturation queue and must age past the maturation period before
//! they can enter an unbonding stream.

use capstan_types::{EpochSeries, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One maturation queue entry: a balance increase and when it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub amount: u128,
    pub at: Timestamp,
}

/// An active linear unbonding stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingStream {
    pub total: u128,
    /// Portion already withdrawn; never exceeds `total`.
    pub claimed: u128,
    pub started_at: Timestamp,
}

impl UnbondingStream {
    /// Portion unlocked by `now`: the floor of `total * elapsed / secs`,
    /// split so the product stays within u128, capped at the total.
    pub fn unlocked(&self, stream_secs: u64, now: Timestamp) -> u128 {
        let secs = stream_secs as u128;
        let elapsed = self.started_at.elapsed_since(now).min(stream_secs) as u128;
        if secs == 0 || elapsed == secs {
            return self.total;
        }
        (self.total / secs) * elapsed + (self.total % secs) * elapsed / secs
    }
}

/// Balance state for one account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BondedAccount {
    pub bonded: u128,
    /// Bonded balance per epoch, forward-filled.
    pub weight: EpochSeries,
    /// Unmatured balance increases, oldest first.
    pub queue: VecDeque<QueueEntry>,
    pub stream: Option<UnbondingStream>,
}

impl BondedAccount {
    /// Matured queue total. Matured entries are always a prefix of the
    /// queue because entries arrive in time order.
    pub fn unbondable(&self, maturation_secs: u64, now: Timestamp) -> u128 {
        self.queue
            .iter()
            .take_while(|entry| entry.at.has_expired(maturation_secs, now))
            .map(|entry| entry.amount)
            .sum()
    }

    /// Remove `amount` from the front of the queue. Callers check against
    /// `unbondable` first; the queue always covers the request.
    pub fn consume_unbondable(&mut self, mut amount: u128) {
        while amount > 0 {
            let Some(front) = self.queue.front_mut() else {
                break;
            };
            if front.amount <= amount {
                amount -= front.amount;
                self.queue.pop_front();
            } else {
                front.amount -= amount;
                amount = 0;
            }
        }
    }
}
