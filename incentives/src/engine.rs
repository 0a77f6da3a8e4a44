//! The incentive distributor engine.

use crate::error::IncentiveError;
use crate::target::IncentiveTarget;
use capstan_locker::LockLedger;
use capstan_types::{
    mul_div, Account, Epoch, EpochClock, ProtocolParams, Timestamp, TokenId,
};
use capstan_upstream::LiquidityProtocol;
use capstan_voting::VoteProxy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

/// A user's streaming position for one (target, token) bucket series.
///
/// Epochs before `from` are fully settled; `paid` is what the user has
/// already drawn from the `from` bucket's stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StreamCursor {
    from: Epoch,
    paid: u128,
}

/// Distributes pushed incentive deposits.
///
/// Deposits land in full in the current epoch's bucket for their target.
/// A bucket closed at epoch E streams out linearly over epoch E + 1, so
/// claims inside the streaming window pay the marginal increase only.
/// Locker-mode shares follow lock weight on the lead clock; pool-mode
/// shares follow the votes cast for the pool on the calendar clock.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncentiveDistributor {
    calendar_clock: EpochClock,
    locker_clock: EpochClock,

    /// Bucket totals per target, token and epoch. Past epochs are frozen.
    buckets: HashMap<IncentiveTarget, HashMap<TokenId, BTreeMap<Epoch, u128>>>,
    /// Tokens ever deposited per target, in first-seen order.
    tokens: HashMap<IncentiveTarget, Vec<TokenId>>,
    token_sets: HashMap<IncentiveTarget, HashSet<TokenId>>,

    cursors: HashMap<(Account, IncentiveTarget, TokenId), StreamCursor>,
}

impl IncentiveDistributor {
    pub fn new(params: &ProtocolParams) -> Self {
        Self {
            calendar_clock: params.calendar_clock(),
            locker_clock: params.locker_clock(),
            buckets: HashMap::new(),
            tokens: HashMap::new(),
            token_sets: HashMap::new(),
            cursors: HashMap::new(),
        }
    }

    /// Push `amount` of `token` into the open bucket for `target`.
    ///
    /// Pool targets must have passed approval upstream; the check applies
    /// even to zero-amount deposits.
    pub fn deposit_incentive(
        &mut self,
        target: &IncentiveTarget,
        token: &TokenId,
        amount: u128,
        upstream: &dyn LiquidityProtocol,
        now: Timestamp,
    ) -> Result<(), IncentiveError> {
        if let IncentiveTarget::Pool(pool) = target {
            if !upstream.is_pool_approved(pool)? {
                return Err(IncentiveError::PoolNotApproved(pool.clone()));
            }
        }
        if amount == 0 {
            return Ok(());
        }
        let epoch = self.clock_for(target).current_epoch(now);
        let bucket = self
            .buckets
            .entry(target.clone())
            .or_default()
            .entry(token.clone())
            .or_default()
            .entry(epoch)
            .or_insert(0);
        *bucket = bucket.checked_add(amount).ok_or(IncentiveError::Overflow)?;
        if self
            .token_sets
            .entry(target.clone())
            .or_default()
            .insert(token.clone())
        {
            self.tokens
                .entry(target.clone())
                .or_default()
                .push(token.clone());
        }
        debug!(target = %target, token = %token, epoch, amount, "incentive deposited");
        Ok(())
    }

    /// Amounts of each token claimable by `user` for `target` right now.
    pub fn claimable(
        &self,
        user: &Account,
        target: &IncentiveTarget,
        tokens: &[TokenId],
        ledger: &LockLedger,
        proxy: &VoteProxy,
        now: Timestamp,
    ) -> Result<Vec<u128>, IncentiveError> {
        tokens
            .iter()
            .map(|token| {
                self.settle(user, target, token, ledger, proxy, now)
                    .map(|(payout, _)| payout)
            })
            .collect()
    }

    /// Pay out the currently-streamed amounts and advance the caller's
    /// streaming cursors. Returns the per-token amounts for the host to
    /// transfer out of the incentive reserve.
    pub fn claim(
        &mut self,
        user: &Account,
        target: &IncentiveTarget,
        tokens: &[TokenId],
        ledger: &LockLedger,
        proxy: &VoteProxy,
        now: Timestamp,
    ) -> Result<Vec<u128>, IncentiveError> {
        let mut payouts = Vec::with_capacity(tokens.len());
        for token in tokens {
            let (amount, cursor) = self.settle(user, target, token, ledger, proxy, now)?;
            if let Some(cursor) = cursor {
                self.cursors
                    .insert((user.clone(), target.clone(), token.clone()), cursor);
            }
            if amount > 0 {
                info!(user = %user, target = %target, token = %token, amount, "incentives claimed");
            }
            payouts.push(amount);
        }
        Ok(payouts)
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn incentive_bucket(
        &self,
        target: &IncentiveTarget,
        token: &TokenId,
        epoch: Epoch,
    ) -> u128 {
        self.buckets
            .get(target)
            .and_then(|tokens| tokens.get(token))
            .and_then(|by_epoch| by_epoch.get(&epoch))
            .copied()
            .unwrap_or(0)
    }

    /// Tokens ever deposited for `target`, in first-seen order.
    pub fn incentive_tokens(&self, target: &IncentiveTarget) -> &[TokenId] {
        self.tokens
            .get(target)
            .map(|tokens| tokens.as_slice())
            .unwrap_or(&[])
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the full distributor state.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore a distributor from serialized bytes, falling back to a fresh
    /// one on corrupt input.
    pub fn load_state(data: &[u8], params: &ProtocolParams) -> Self {
        bincode::deserialize(data).unwrap_or_else(|_| Self::new(params))
    }

    // ── Internals ────────────────────────────────────────────────────────

    /// Compute the payout due now and the cursor that records it.
    /// `None` means the cursor must not move (no bucket has begun
    /// streaming yet).
    fn settle(
        &self,
        user: &Account,
        target: &IncentiveTarget,
        token: &TokenId,
        ledger: &LockLedger,
        proxy: &VoteProxy,
        now: Timestamp,
    ) -> Result<(u128, Option<StreamCursor>), IncentiveError> {
        let clock = self.clock_for(target);
        let Some(through) = clock.current_epoch(now).checked_sub(1) else {
            return Ok((0, None));
        };
        let cursor = self
            .cursors
            .get(&(user.clone(), target.clone(), token.clone()))
            .cloned()
            .unwrap_or_default();
        if cursor.from > through {
            return Ok((0, None));
        }

        let mut payout: u128 = 0;
        let mut new_cursor = StreamCursor {
            from: through,
            paid: 0,
        };
        if let Some(by_epoch) = self
            .buckets
            .get(target)
            .and_then(|tokens| tokens.get(token))
        {
            for (&epoch, &bucket) in by_epoch.range(cursor.from..=through) {
                let share = self.share_of(user, target, bucket, epoch, ledger, proxy)?;
                let elapsed = clock.elapsed_in(epoch + 1, now) as u128;
                let entitled = mul_div(share, elapsed, clock.epoch_secs() as u128)
                    .map_err(|_| IncentiveError::Overflow)?;
                let already = if epoch == cursor.from { cursor.paid } else { 0 };
                payout = payout
                    .checked_add(entitled.saturating_sub(already))
                    .ok_or(IncentiveError::Overflow)?;
                if epoch == through {
                    new_cursor.paid = entitled;
                }
            }
        }
        Ok((payout, Some(new_cursor)))
    }

    /// The user's full share of one closed bucket, before streaming.
    fn share_of(
        &self,
        user: &Account,
        target: &IncentiveTarget,
        bucket: u128,
        epoch: Epoch,
        ledger: &LockLedger,
        proxy: &VoteProxy,
    ) -> Result<u128, IncentiveError> {
        let (weight, total) = match target {
            IncentiveTarget::Lockers => {
                (ledger.weight_of(user, epoch), ledger.total_weight(epoch))
            }
            IncentiveTarget::Pool(pool) => (
                proxy.user_pool_votes(user, pool, epoch),
                proxy.pool_votes(pool, epoch),
            ),
        };
        if weight == 0 || total == 0 {
            return Ok(0);
        }
        mul_div(bucket, weight, total).map_err(|_| IncentiveError::Overflow)
    }

    fn clock_for(&self, target: &IncentiveTarget) -> EpochClock {
        match target {
            IncentiveTarget::Lockers => self.locker_clock,
            IncentiveTarget::Pool(_) => self.calendar_clock,
        }
    }
}
