//! The bonding fee distributor engine.

use crate::account::{BondedAccount, QueueEntry, UnbondingStream};
use crate::error::FeeError;
use capstan_types::{
    mul_div, Account, Epoch, EpochClock, EpochSeries, ProtocolParams, Timestamp, TokenId,
};
use capstan_upstream::{LiquidityProtocol, ValueVault};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Distributes externally-pulled fees to bonded depositors.
///
/// Fees are fetched marginally into per-token calendar-epoch buckets. A
/// bucket stays locked for `fee_claim_lag` epochs after its epoch ends, so
/// no payout is ever computed against a bucket that can still grow. Claims
/// are all-or-nothing per epoch: one cursor per (account, token) records the
/// last epoch paid out.
///
/// The value token itself sits in the treasury account of the wrapping
/// vault; fee tokens never pass through this engine. `claim` returns the
/// per-token amounts for the host to settle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BondingFeeDistributor {
    clock: EpochClock,
    maturation_secs: u64,
    unbond_stream_secs: u64,
    fee_claim_lag: u64,
    fetch_cooldown_secs: u64,

    owner: Account,
    treasury: Account,
    bailout: bool,

    accounts: HashMap<Account, BondedAccount>,
    /// Total bonded balance per epoch, forward-filled.
    total_weight: EpochSeries,

    /// Fee amounts per token per epoch. Closed epochs are frozen.
    buckets: HashMap<TokenId, BTreeMap<Epoch, u128>>,
    /// Every token ever fetched, in first-seen order.
    fee_tokens: Vec<TokenId>,
    fee_token_set: HashSet<TokenId>,
    last_fetch: HashMap<TokenId, Timestamp>,

    /// Last epoch paid out, per account and token.
    cursors: HashMap<Account, HashMap<TokenId, Epoch>>,
}

impl BondingFeeDistributor {
    pub fn new(params: &ProtocolParams, owner: Account, treasury: Account) -> Self {
        Self {
            clock: params.calendar_clock(),
            maturation_secs: params.maturation_secs,
            unbond_stream_secs: params.unbond_stream_secs,
            fee_claim_lag: params.fee_claim_lag,
            fetch_cooldown_secs: params.fetch_cooldown_secs,
            owner,
            treasury,
            bailout: false,
            accounts: HashMap::new(),
            total_weight: EpochSeries::new(),
            buckets: HashMap::new(),
            fee_tokens: Vec::new(),
            fee_token_set: HashSet::new(),
            last_fetch: HashMap::new(),
            cursors: HashMap::new(),
        }
    }

    // ── Bonding ──────────────────────────────────────────────────────────

    /// Pull `amount` of the value token from `caller` into the treasury and
    /// credit it to `receiver`'s bonded balance, effective this epoch.
    pub fn deposit(
        &mut self,
        caller: &Account,
        receiver: &Account,
        amount: u128,
        vault: &mut dyn ValueVault,
        now: Timestamp,
    ) -> Result<(), FeeError> {
        self.ensure_active()?;
        let epoch = self.clock.current_epoch(now);
        let bonded = self.accounts.get(receiver).map(|a| a.bonded).unwrap_or(0);
        let new_bonded = bonded.checked_add(amount).ok_or(FeeError::Overflow)?;
        let new_total = self
            .total_weight
            .latest()
            .checked_add(amount)
            .ok_or(FeeError::Overflow)?;

        vault.transfer(caller, &self.treasury, amount)?;

        let account = self.accounts.entry(receiver.clone()).or_default();
        account.bonded = new_bonded;
        account.weight.set(epoch, new_bonded);
        self.total_weight.set(epoch, new_total);
        info!(receiver = %receiver, amount, epoch, "bonded deposit");
        Ok(())
    }

    /// Record a vault balance increase for `receiver`. The amount joins the
    /// maturation queue and becomes unbondable after the maturation period.
    pub fn notify_balance_increase(
        &mut self,
        receiver: &Account,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), FeeError> {
        self.ensure_active()?;
        if amount == 0 {
            return Ok(());
        }
        self.accounts
            .entry(receiver.clone())
            .or_default()
            .queue
            .push_back(QueueEntry { amount, at: now });
        debug!(receiver = %receiver, amount, "balance increase queued");
        Ok(())
    }

    // ── Unbonding ────────────────────────────────────────────────────────

    /// Queue entries of `user` that have aged past the maturation period.
    pub fn unbondable_balance(&self, user: &Account, now: Timestamp) -> u128 {
        self.accounts
            .get(user)
            .map(|a| a.unbondable(self.maturation_secs, now))
            .unwrap_or(0)
    }

    /// Move `amount` of matured balance into the caller's unbonding stream.
    ///
    /// An already-running stream is folded in: its undrawn remainder joins
    /// the new total and the clock restarts from `now`.
    pub fn initiate_unbonding_stream(
        &mut self,
        caller: &Account,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), FeeError> {
        self.ensure_active()?;
        let maturation_secs = self.maturation_secs;
        let account = self.accounts.entry(caller.clone()).or_default();
        let available = account.unbondable(maturation_secs, now);
        if amount > available {
            return Err(FeeError::InsufficientUnbondableBalance {
                requested: amount,
                available,
            });
        }
        account.consume_unbondable(amount);
        let carried = account
            .stream
            .take()
            .map(|s| s.total - s.claimed)
            .unwrap_or(0);
        let total = amount.checked_add(carried).ok_or(FeeError::Overflow)?;
        if total > 0 {
            account.stream = Some(UnbondingStream {
                total,
                claimed: 0,
                started_at: now,
            });
        }
        debug!(caller = %caller, amount, carried, "unbonding stream started");
        Ok(())
    }

    /// The caller's stream position as `(withdrawable, remaining)`:
    /// the portion unlocked but not yet withdrawn, and the portion still in
    /// the stream at all.
    pub fn streaming_balances(&self, user: &Account, now: Timestamp) -> (u128, u128) {
        let Some(stream) = self.accounts.get(user).and_then(|a| a.stream.as_ref()) else {
            return (0, 0);
        };
        let unlocked = stream.unlocked(self.unbond_stream_secs, now);
        (
            unlocked.saturating_sub(stream.claimed),
            stream.total - stream.claimed,
        )
    }

    /// Pay out the unlocked portion of the caller's stream to `receiver`.
    /// Returns the amount transferred; zero with no active stream.
    pub fn withdraw_unbonded(
        &mut self,
        caller: &Account,
        receiver: &Account,
        vault: &mut dyn ValueVault,
        now: Timestamp,
    ) -> Result<u128, FeeError> {
        self.ensure_active()?;
        let stream_secs = self.unbond_stream_secs;
        let Some(account) = self.accounts.get_mut(caller) else {
            return Ok(0);
        };
        let Some(stream) = account.stream.as_mut() else {
            return Ok(0);
        };
        let unlocked = stream.unlocked(stream_secs, now);
        let payout = unlocked.saturating_sub(stream.claimed);
        if payout == 0 {
            return Ok(0);
        }
        vault.transfer(&self.treasury, receiver, payout)?;
        stream.claimed = unlocked;
        if stream.claimed == stream.total {
            account.stream = None;
        }
        info!(caller = %caller, receiver = %receiver, payout, "unbonded tokens withdrawn");
        Ok(payout)
    }

    // ── Fee ingestion ────────────────────────────────────────────────────

    /// Pull the marginal newly-accrued amount for each token into its
    /// current-epoch bucket. Safe to call arbitrarily often: only the delta
    /// since the previous pull is ever added. First-seen tokens join the
    /// registry; `last_fetch` advances even when nothing accrued.
    pub fn fetch_fees(
        &mut self,
        tokens: &[TokenId],
        upstream: &mut dyn LiquidityProtocol,
        now: Timestamp,
    ) -> Result<(), FeeError> {
        self.ensure_active()?;
        let epoch = self.clock.current_epoch(now);
        for token in tokens {
            let delta = upstream.pull_accrued_fees(token)?;
            if self.fee_token_set.insert(token.clone()) {
                self.fee_tokens.push(token.clone());
            }
            if delta > 0 {
                let bucket = self
                    .buckets
                    .entry(token.clone())
                    .or_default()
                    .entry(epoch)
                    .or_insert(0);
                *bucket = bucket.checked_add(delta).ok_or(FeeError::Overflow)?;
                debug!(token = %token, epoch, amount = delta, "fees fetched");
            }
            self.last_fetch.insert(token.clone(), now);
        }
        Ok(())
    }

    // ── Claims ───────────────────────────────────────────────────────────

    /// Amounts of each token claimable by `user` right now: the pro-rata
    /// share of every bucket past the claim lag and past the user's cursor.
    pub fn claimable(
        &self,
        user: &Account,
        tokens: &[TokenId],
        now: Timestamp,
    ) -> Result<Vec<u128>, FeeError> {
        tokens
            .iter()
            .map(|token| self.claimable_for(user, token, now))
            .collect()
    }

    /// Pay out every claimable bucket for the given tokens and advance the
    /// caller's cursors. Tokens whose last fetch is stale are re-fetched
    /// first, so a claim never runs against a needlessly short bucket.
    /// Returns the per-token amounts for the host to transfer.
    pub fn claim(
        &mut self,
        user: &Account,
        tokens: &[TokenId],
        upstream: &mut dyn LiquidityProtocol,
        now: Timestamp,
    ) -> Result<Vec<u128>, FeeError> {
        self.ensure_active()?;
        let due: Vec<TokenId> = tokens
            .iter()
            .filter(|token| self.fetch_due(token, now))
            .cloned()
            .collect();
        if !due.is_empty() {
            self.fetch_fees(&due, upstream, now)?;
        }

        let through = self
            .clock
            .current_epoch(now)
            .checked_sub(self.fee_claim_lag);
        let mut payouts = Vec::with_capacity(tokens.len());
        for token in tokens {
            let amount = self.claimable_for(user, token, now)?;
            if let Some(through) = through {
                self.cursors
                    .entry(user.clone())
                    .or_default()
                    .insert(token.clone(), through);
            }
            if amount > 0 {
                info!(user = %user, token = %token, amount, "fees claimed");
            }
            payouts.push(amount);
        }
        Ok(payouts)
    }

    // ── Administration ───────────────────────────────────────────────────

    /// Freeze every mutating operation. Owner only. Rescued funds are then
    /// handled outside the engine.
    pub fn emergency_bailout(&mut self, caller: &Account) -> Result<(), FeeError> {
        self.ensure_owner(caller)?;
        self.bailout = true;
        warn!(owner = %caller, "emergency bailout engaged");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Account,
        new_owner: Account,
    ) -> Result<(), FeeError> {
        self.ensure_owner(caller)?;
        info!(from = %self.owner, to = %new_owner, "ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    // ── Views ────────────────────────────────────────────────────────────

    pub fn bonded_balance(&self, user: &Account) -> u128 {
        self.accounts.get(user).map(|a| a.bonded).unwrap_or(0)
    }

    /// Bonded weight of `user` in effect for `epoch`.
    pub fn weight_of(&self, user: &Account, epoch: Epoch) -> u128 {
        self.accounts
            .get(user)
            .map(|a| a.weight.value_at(epoch))
            .unwrap_or(0)
    }

    /// Total bonded weight in effect for `epoch`.
    pub fn total_weight(&self, epoch: Epoch) -> u128 {
        self.total_weight.value_at(epoch)
    }

    /// Fee tokens ever fetched, in first-seen order.
    pub fn fee_tokens(&self) -> &[TokenId] {
        &self.fee_tokens
    }

    pub fn fee_bucket(&self, token: &TokenId, epoch: Epoch) -> u128 {
        self.buckets
            .get(token)
            .and_then(|by_epoch| by_epoch.get(&epoch))
            .copied()
            .unwrap_or(0)
    }

    pub fn owner(&self) -> &Account {
        &self.owner
    }

    pub fn is_bailout_active(&self) -> bool {
        self.bailout
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Serialize the full distributor state.
    pub fn save_state(&self) -> Vec<u8> {
        bincode::serialize(self).unwrap_or_default()
    }

    /// Restore a distributor from serialized bytes, falling back to a fresh
    /// one on corrupt input.
    pub fn load_state(
        data: &[u8],
        params: &ProtocolParams,
        owner: Account,
        treasury: Account,
    ) -> Self {
        bincode::deserialize(data).unwrap_or_else(|_| Self::new(params, owner, treasury))
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn claimable_for(
        &self,
        user: &Account,
        token: &TokenId,
        now: Timestamp,
    ) -> Result<u128, FeeError> {
        let Some(through) = self
            .clock
            .current_epoch(now)
            .checked_sub(self.fee_claim_lag)
        else {
            return Ok(0);
        };
        let start = self
            .cursors
            .get(user)
            .and_then(|by_token| by_token.get(token))
            .map(|cursor| cursor + 1)
            .unwrap_or(0);
        if start > through {
            return Ok(0);
        }
        let Some(by_epoch) = self.buckets.get(token) else {
            return Ok(0);
        };
        let Some(account) = self.accounts.get(user) else {
            return Ok(0);
        };

        let mut sum: u128 = 0;
        for (&epoch, &bucket) in by_epoch.range(start..=through) {
            let total = self.total_weight.value_at(epoch);
            if bucket == 0 || total == 0 {
                continue;
            }
            let weight = account.weight.value_at(epoch);
            if weight == 0 {
                continue;
            }
            let share = mul_div(bucket, weight, total).map_err(|_| FeeError::Overflow)?;
            sum = sum.checked_add(share).ok_or(FeeError::Overflow)?;
        }
        Ok(sum)
    }

    fn fetch_due(&self, token: &TokenId, now: Timestamp) -> bool {
        match self.last_fetch.get(token) {
            Some(at) => at.has_expired(self.fetch_cooldown_secs, now),
            None => true,
        }
    }

    fn ensure_active(&self) -> Result<(), FeeError> {
        if self.bailout {
            return Err(FeeError::EmergencyBailoutActive);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Account) -> Result<(), FeeError> {
        if *caller != self.owner {
            return Err(FeeError::Unauthorized);
        }
        Ok(())
    }
}
