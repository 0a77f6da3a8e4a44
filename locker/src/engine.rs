//! The lock ledger engine.

use crate::error::LockerError;
use crate::weights::WeightTrack;
use capstan_types::{Account, Epoch, EpochClock, ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Locks and weight history for a single account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountLocks {
    /// Active locks keyed by absolute expiry epoch; same-expiry locks merge.
    locks: BTreeMap<Epoch, u128>,
    weight: WeightTrack,
}

/// The lock ledger.
///
/// Runs on the lead clock: its epoch N closes `locker_epoch_lead_secs`
/// before calendar epoch N does, which freezes the epoch-N weight snapshot
/// at the instant the epoch-N voting window opens. Once an epoch has ended
/// its weights never change again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockLedger {
    clock: EpochClock,
    max_lock_epochs: u64,
    accounts: HashMap<Account, AccountLocks>,
    total: WeightTrack,
}

impl LockLedger {
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            clock: params.locker_clock(),
            max_lock_epochs: params.max_lock_epochs,
            accounts: HashMap::new(),
            total: WeightTrack::default(),
        }
    }

    /// The ledger's current epoch at `now` (lead clock).
    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        self.clock.current_epoch(now)
    }

    pub fn max_lock_epochs(&self) -> u64 {
        self.max_lock_epochs
    }

    /// Lock `amount` for `epochs` epochs.
    ///
    /// Weight is flat: `amount` counts fully for every epoch from the
    /// current one through `expiry - 1`, then drops to zero. A lock created
    /// mid-epoch counts for the whole epoch. Locks with the same expiry
    /// merge into one bucket.
    pub fn lock(
        &mut self,
        owner: &Account,
        amount: u128,
        epochs: u64,
        now: Timestamp,
    ) -> Result<(), LockerError> {
        if amount == 0 || epochs == 0 || epochs > self.max_lock_epochs {
            return Err(LockerError::InvalidLockParameters { amount, epochs });
        }
        let epoch = self.clock.current_epoch(now);
        let expiry = epoch + epochs;

        let account = self.accounts.entry(owner.clone()).or_default();
        prune_expired(&mut account.locks, epoch);
        account.weight.add(epoch, amount, expiry)?;
        let bucket = account.locks.entry(expiry).or_insert(0);
        *bucket = bucket.checked_add(amount).ok_or(LockerError::Overflow)?;
        self.total.add(epoch, amount, expiry)?;
        Ok(())
    }

    /// Reset the owner's nearest-to-expiry active lock to the maximum
    /// duration, merging into an existing max-duration bucket if present.
    ///
    /// Weight values do not change; only the scheduled expiry moves.
    pub fn extend_lock(&mut self, owner: &Account, now: Timestamp) -> Result<(), LockerError> {
        let epoch = self.clock.current_epoch(now);
        let account = self
            .accounts
            .get_mut(owner)
            .ok_or(LockerError::NoActiveLocks)?;
        prune_expired(&mut account.locks, epoch);
        let (&nearest, &amount) = account
            .locks
            .iter()
            .next()
            .ok_or(LockerError::NoActiveLocks)?;
        let expiry = epoch + self.max_lock_epochs;
        if nearest == expiry {
            return Ok(());
        }
        account.locks.remove(&nearest);
        let bucket = account.locks.entry(expiry).or_insert(0);
        *bucket = bucket.checked_add(amount).ok_or(LockerError::Overflow)?;
        account.weight.reschedule(epoch, amount, nearest, expiry)?;
        self.total.reschedule(epoch, amount, nearest, expiry)?;
        Ok(())
    }

    /// Apply scheduled decay through the epoch containing `now` and drop
    /// expired locks. Reads never require this; it only bounds the pending
    /// decrement walk for long-idle ledgers.
    pub fn tick(&mut self, now: Timestamp) {
        let epoch = self.clock.current_epoch(now);
        self.total.sync_to(epoch);
        for account in self.accounts.values_mut() {
            account.weight.sync_to(epoch);
            prune_expired(&mut account.locks, epoch);
        }
    }

    /// Weight of `owner` in effect for `epoch`, including past epochs.
    pub fn weight_of(&self, owner: &Account, epoch: Epoch) -> u128 {
        self.accounts
            .get(owner)
            .map(|a| a.weight.value_at(epoch))
            .unwrap_or(0)
    }

    /// Total weight in effect for `epoch`, including past epochs.
    pub fn total_weight(&self, epoch: Epoch) -> u128 {
        self.total.value_at(epoch)
    }

    /// Active locks as `(epochs_remaining, amount)` pairs, ascending by
    /// remaining duration. Expired locks are excluded.
    pub fn active_locks(&self, owner: &Account, now: Timestamp) -> Vec<(u64, u128)> {
        let epoch = self.clock.current_epoch(now);
        match self.accounts.get(owner) {
            Some(account) => account
                .locks
                .iter()
                .filter(|(expiry, _)| **expiry > epoch)
                .map(|(expiry, amount)| (expiry - epoch, *amount))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Serialize the full ledger.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore a ledger from serialized bytes, falling back to a fresh
    /// ledger on corrupt input.
    pub fn load_state(data: &[u8], params: &ProtocolParams) -> Self {
        bincode::deserialize(data).unwrap_or_else(|_| Self::new(params))
    }
}

/// Drop lock buckets whose expiry has passed. Weight bookkeeping is
/// untouched: the expiries are already scheduled in the weight tracks.
fn prune_expired(locks: &mut BTreeMap<Epoch, u128>, epoch: Epoch) {
    *locks = locks.split_off(&(epoch + 1));
}
