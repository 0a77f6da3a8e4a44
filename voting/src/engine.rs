//! The vote proxy engine.

use crate::ballot::ApprovalBallot;
use crate::error::VotingError;
use capstan_locker::LockLedger;
use capstan_types::{
    mul_div, Account, BallotId, Epoch, EpochClock, PoolId, ProtocolParams, Timestamp,
    WEIGHT_SCALE,
};
use capstan_upstream::LiquidityProtocol;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Sentinel amount meaning "all votes still available". Accepted by the
/// single-entry forms of `vote` and by `vote_for_approval`.
pub const VOTE_MAX: u128 = u128::MAX;

/// Routes lock-weight votes into the external liquidity protocol.
///
/// Each calendar epoch E opens a trailing voting window. Weight locked for E
/// converts to a vote budget of `weight / WEIGHT_SCALE`; votes spend the
/// budget additively and are mirrored upstream through the proxy account,
/// scaled by the current vote ratio. Internal tallies stay behind per
/// (account, pool, epoch) and later drive pool-mode incentive shares.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteProxy {
    clock: EpochClock,
    vote_window_secs: u64,
    fixed_alloc_divisor: u128,
    min_ballot_weight_bps: u32,
    ballot_cooldown_secs: u64,

    /// Capstan's account inside the external protocol.
    proxy_account: Account,

    /// Pool receiving the reserved fixed allocation once approved.
    fixed_pool: PoolId,
    fixed_pool_approved: bool,
    /// Epochs whose fixed allocation has already been cast upstream.
    fixed_cast_epochs: HashSet<Epoch>,

    /// Votes spent per account per epoch.
    spent: HashMap<Account, HashMap<Epoch, u128>>,
    /// Per-account tallies by pool and epoch.
    account_pool_tallies: HashMap<Account, HashMap<PoolId, HashMap<Epoch, u128>>>,
    /// Aggregate tallies by pool and epoch.
    pool_tallies: HashMap<PoolId, HashMap<Epoch, u128>>,

    last_ballot_at: Option<Timestamp>,
    ballots: HashMap<BallotId, ApprovalBallot>,
    /// Approval votes spent per account per ballot.
    approval_spent: HashMap<Account, HashMap<BallotId, u128>>,
}

impl VoteProxy {
    pub fn new(params: &ProtocolParams, proxy_account: Account, fixed_pool: PoolId) -> Self {
        Self {
            clock: params.calendar_clock(),
            vote_window_secs: params.vote_window_secs,
            fixed_alloc_divisor: params.fixed_alloc_divisor,
            min_ballot_weight_bps: params.min_ballot_weight_bps,
            ballot_cooldown_secs: params.ballot_cooldown_secs,
            proxy_account,
            fixed_pool,
            fixed_pool_approved: false,
            fixed_cast_epochs: HashSet::new(),
            spent: HashMap::new(),
            account_pool_tallies: HashMap::new(),
            pool_tallies: HashMap::new(),
            last_ballot_at: None,
            ballots: HashMap::new(),
            approval_spent: HashMap::new(),
        }
    }

    /// Whether the voting window of the epoch containing `now` is open.
    /// The window is the trailing `vote_window_secs` of every epoch.
    pub fn voting_open(&self, now: Timestamp) -> bool {
        let epoch = self.clock.current_epoch(now);
        let open_after = self.clock.epoch_secs().saturating_sub(self.vote_window_secs);
        self.clock.elapsed_in(epoch, now) >= open_after
    }

    /// The calendar epoch containing `now`.
    pub fn current_epoch(&self, now: Timestamp) -> Epoch {
        self.clock.current_epoch(now)
    }

    /// Votes `user` can still cast right now. Zero outside the window.
    pub fn available_votes(&self, ledger: &LockLedger, user: &Account, now: Timestamp) -> u128 {
        if !self.voting_open(now) {
            return 0;
        }
        let epoch = self.clock.current_epoch(now);
        let budget = ledger.weight_of(user, epoch) / WEIGHT_SCALE;
        budget.saturating_sub(self.spent_votes(user, epoch))
    }

    /// Cast votes for the epoch containing `now`.
    ///
    /// A single `(pool, VOTE_MAX)` entry spends everything still available.
    /// The batch is all-or-nothing: if the total exceeds the caller's
    /// remaining budget no tally changes and nothing reaches the upstream.
    ///
    /// The first accepted call of each epoch also casts the reserved
    /// fixed-pool allocation upstream, once the fixed pool is approved.
    /// An empty batch is valid and serves exactly that purpose.
    pub fn vote(
        &mut self,
        caller: &Account,
        votes: &[(PoolId, u128)],
        ledger: &LockLedger,
        upstream: &mut dyn LiquidityProtocol,
        now: Timestamp,
    ) -> Result<(), VotingError> {
        if !self.voting_open(now) {
            return Err(VotingError::VotingClosed);
        }
        let epoch = self.clock.current_epoch(now);
        let available = self.available_votes(ledger, caller, now);

        let mut requested = votes.to_vec();
        if let [(_, amount)] = requested.as_mut_slice() {
            if *amount == VOTE_MAX {
                *amount = available;
            }
        }

        let mut total: u128 = 0;
        for (_, amount) in &requested {
            total = total.checked_add(*amount).ok_or(VotingError::Overflow)?;
        }
        if total > available {
            return Err(VotingError::VotesExceeded {
                requested: total,
                available,
            });
        }

        let budget = upstream.available_vote_budget(&self.proxy_account, epoch)?;
        let reserved = self.pending_fixed_allocation(budget, epoch);
        let internal = ledger.total_weight(epoch) / WEIGHT_SCALE;
        let ratio = if internal == 0 {
            0
        } else {
            budget.saturating_sub(reserved) / internal
        };

        if reserved > 0 {
            upstream.cast_votes(&self.proxy_account, &[(self.fixed_pool.clone(), reserved)])?;
            self.fixed_cast_epochs.insert(epoch);
            debug!(epoch, amount = reserved, pool = %self.fixed_pool, "fixed allocation cast");
        }

        let mut mirrored: Vec<(PoolId, u128)> = Vec::with_capacity(requested.len());
        if ratio > 0 {
            for (pool, amount) in &requested {
                let scaled = amount.checked_mul(ratio).ok_or(VotingError::Overflow)?;
                if scaled > 0 {
                    mirrored.push((pool.clone(), scaled));
                }
            }
        }
        if !mirrored.is_empty() {
            upstream.cast_votes(&self.proxy_account, &mirrored)?;
        }

        // The upstream accepted everything; commit the internal tallies.
        if total > 0 {
            let spent = self
                .spent
                .entry(caller.clone())
                .or_default()
                .entry(epoch)
                .or_insert(0);
            *spent = spent.checked_add(total).ok_or(VotingError::Overflow)?;
            for (pool, amount) in &requested {
                if *amount == 0 {
                    continue;
                }
                let user_tally = self
                    .account_pool_tallies
                    .entry(caller.clone())
                    .or_default()
                    .entry(pool.clone())
                    .or_default()
                    .entry(epoch)
                    .or_insert(0);
                *user_tally = user_tally.checked_add(*amount).ok_or(VotingError::Overflow)?;
                let pool_tally = self
                    .pool_tallies
                    .entry(pool.clone())
                    .or_default()
                    .entry(epoch)
                    .or_insert(0);
                *pool_tally = pool_tally.checked_add(*amount).ok_or(VotingError::Overflow)?;
            }
            debug!(caller = %caller, epoch, votes = total, ratio, "votes recorded");
        }
        Ok(())
    }

    /// External votes granted per internal vote for `epoch`, recomputed from
    /// the live upstream budget on every call. While the epoch's fixed
    /// allocation is still pending it is excluded from the numerator.
    pub fn vote_ratio(
        &self,
        ledger: &LockLedger,
        upstream: &dyn LiquidityProtocol,
        epoch: Epoch,
    ) -> Result<u128, VotingError> {
        let budget = upstream.available_vote_budget(&self.proxy_account, epoch)?;
        let reserved = self.pending_fixed_allocation(budget, epoch);
        let internal = ledger.total_weight(epoch) / WEIGHT_SCALE;
        if internal == 0 {
            return Ok(0);
        }
        Ok(budget.saturating_sub(reserved) / internal)
    }

    /// Submit the one-time approval ballot for the fixed pool upstream and
    /// activate the reserved allocation.
    pub fn approve_fixed_pool(
        &mut self,
        upstream: &mut dyn LiquidityProtocol,
    ) -> Result<BallotId, VotingError> {
        if self.fixed_pool_approved {
            return Err(VotingError::FixedPoolAlreadyApproved);
        }
        let ballot = upstream.submit_approval_ballot(&self.fixed_pool)?;
        self.fixed_pool_approved = true;
        info!(pool = %self.fixed_pool, ballot, "fixed pool approval submitted");
        Ok(ballot)
    }

    /// Open an approval ballot for `pool` upstream.
    ///
    /// Requires the caller to hold at least `min_ballot_weight_bps` of the
    /// current epoch's total weight, and the cooldown since the previous
    /// ballot (from any caller) to have elapsed. The mirror ratio is fixed
    /// here, from the external approval budget granted for the new ballot.
    pub fn create_approval_ballot(
        &mut self,
        caller: &Account,
        pool: &PoolId,
        ledger: &LockLedger,
        upstream: &mut dyn LiquidityProtocol,
        now: Timestamp,
    ) -> Result<BallotId, VotingError> {
        let epoch = self.clock.current_epoch(now);
        let weight = ledger.weight_of(caller, epoch);
        let required = mul_div(
            ledger.total_weight(epoch),
            self.min_ballot_weight_bps as u128,
            10_000,
        )
        .map_err(|_| VotingError::Overflow)?;
        if weight < required {
            return Err(VotingError::InsufficientWeight { weight, required });
        }
        if let Some(last) = self.last_ballot_at {
            if !last.has_expired(self.ballot_cooldown_secs, now) {
                return Err(VotingError::CooldownActive {
                    remaining_secs: last.remaining_until(self.ballot_cooldown_secs, now),
                });
            }
        }

        let ballot = upstream.submit_approval_ballot(pool)?;
        let external = upstream.approval_vote_budget(&self.proxy_account, ballot)?;
        let internal = ledger.total_weight(epoch) / WEIGHT_SCALE;
        let mirror_ratio = if internal == 0 { 0 } else { external / internal };

        self.ballots.insert(
            ballot,
            ApprovalBallot {
                id: ballot,
                pool: pool.clone(),
                epoch,
                mirror_ratio,
                created_at: now,
            },
        );
        self.last_ballot_at = Some(now);
        info!(ballot, pool = %pool, epoch, mirror_ratio, "approval ballot opened");
        Ok(ballot)
    }

    /// Approval votes `user` can still cast on `ballot`. The budget comes
    /// from the user's weight at the ballot's creation epoch. Zero for
    /// unknown ballots.
    pub fn available_approval_votes(
        &self,
        ledger: &LockLedger,
        user: &Account,
        ballot: BallotId,
    ) -> u128 {
        let Some(record) = self.ballots.get(&ballot) else {
            return 0;
        };
        let budget = ledger.weight_of(user, record.epoch) / WEIGHT_SCALE;
        budget.saturating_sub(self.spent_approval_votes(user, ballot))
    }

    /// Cast approval votes on `ballot`, mirrored upstream at the ballot's
    /// creation-time ratio. `VOTE_MAX` spends the remainder.
    pub fn vote_for_approval(
        &mut self,
        caller: &Account,
        ballot: BallotId,
        amount: u128,
        ledger: &LockLedger,
        upstream: &mut dyn LiquidityProtocol,
    ) -> Result<(), VotingError> {
        let record = self
            .ballots
            .get(&ballot)
            .ok_or(VotingError::BallotNotFound(ballot))?;
        let available = self.available_approval_votes(ledger, caller, ballot);
        let amount = if amount == VOTE_MAX { available } else { amount };
        if amount > available {
            return Err(VotingError::VotesExceeded {
                requested: amount,
                available,
            });
        }

        let scaled = amount
            .checked_mul(record.mirror_ratio)
            .ok_or(VotingError::Overflow)?;
        if scaled > 0 {
            upstream.cast_approval_votes(&self.proxy_account, ballot, scaled)?;
        }
        if amount > 0 {
            let spent = self
                .approval_spent
                .entry(caller.clone())
                .or_default()
                .entry(ballot)
                .or_insert(0);
            *spent = spent.checked_add(amount).ok_or(VotingError::Overflow)?;
            debug!(caller = %caller, ballot, amount, "approval votes recorded");
        }
        Ok(())
    }

    // ── Tally lookups ────────────────────────────────────────────────────

    /// Votes `user` put on `pool` during `epoch`.
    pub fn user_pool_votes(&self, user: &Account, pool: &PoolId, epoch: Epoch) -> u128 {
        self.account_pool_tallies
            .get(user)
            .and_then(|pools| pools.get(pool))
            .and_then(|by_epoch| by_epoch.get(&epoch))
            .copied()
            .unwrap_or(0)
    }

    /// All votes put on `pool` during `epoch`.
    pub fn pool_votes(&self, pool: &PoolId, epoch: Epoch) -> u128 {
        self.pool_tallies
            .get(pool)
            .and_then(|by_epoch| by_epoch.get(&epoch))
            .copied()
            .unwrap_or(0)
    }

    pub fn ballot(&self, ballot: BallotId) -> Option<&ApprovalBallot> {
        self.ballots.get(&ballot)
    }

    pub fn fixed_pool(&self) -> &PoolId {
        &self.fixed_pool
    }

    pub fn is_fixed_pool_approved(&self) -> bool {
        self.fixed_pool_approved
    }

    /// Tokens the proxy account holds locked upstream.
    pub fn external_locked_balance(
        &self,
        upstream: &dyn LiquidityProtocol,
    ) -> Result<u128, VotingError> {
        Ok(upstream.locked_balance(&self.proxy_account)?)
    }

    /// Serialize the full proxy state.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore a proxy from serialized bytes, falling back to a fresh proxy
    /// on corrupt input.
    pub fn load_state(
        data: &[u8],
        params: &ProtocolParams,
        proxy_account: Account,
        fixed_pool: PoolId,
    ) -> Self {
        bincode::deserialize(data).unwrap_or_else(|_| Self::new(params, proxy_account, fixed_pool))
    }

    /// Fixed allocation still owed for `epoch` at the given budget; zero
    /// once cast or while the fixed pool is unapproved.
    fn pending_fixed_allocation(&self, budget: u128, epoch: Epoch) -> u128 {
        if !self.fixed_pool_approved || self.fixed_cast_epochs.contains(&epoch) {
            return 0;
        }
        budget / self.fixed_alloc_divisor
    }

    fn spent_votes(&self, user: &Account, epoch: Epoch) -> u128 {
        self.spent
            .get(user)
            .and_then(|by_epoch| by_epoch.get(&epoch))
            .copied()
            .unwrap_or(0)
    }

    fn spent_approval_votes(&self, user: &Account, ballot: BallotId) -> u128 {
        self.approval_spent
            .get(user)
            .and_then(|by_ballot| by_ballot.get(&ballot))
            .copied()
            .unwrap_or(0)
    }
}
