//! Nullable external liquidity protocol.
//!
//! Budgets are programmed per account and consumed by casts, so a scenario
//! can watch the external budget shrink as votes go out. Epochs are not
//! tracked: tests spanning several epochs re-arm the budget between them.

use capstan_types::{Account, BallotId, Epoch, PoolId, TokenId};
use capstan_upstream::{LiquidityProtocol, UpstreamError};
use std::collections::{HashMap, HashSet};

/// An in-memory liquidity protocol recording every call.
#[derive(Default)]
pub struct NullUpstream {
    locked: HashMap<Account, u128>,
    vote_budgets: HashMap<Account, u128>,
    /// Approval budget granted to every account when a ballot opens.
    approval_grant: u128,
    approval_remaining: HashMap<(Account, BallotId), u128>,
    pending_fees: HashMap<TokenId, u128>,
    approved_pools: HashSet<PoolId>,
    ballots: HashMap<BallotId, PoolId>,
    next_ballot: BallotId,
    pool_casts: HashMap<(Account, PoolId), u128>,
    approval_casts: HashMap<(Account, BallotId), u128>,
}

impl NullUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Programming the double ───────────────────────────────────────────

    pub fn set_locked(&mut self, account: &Account, amount: u128) {
        self.locked.insert(account.clone(), amount);
    }

    /// Arm the vote budget for `account`. Casts consume it.
    pub fn set_vote_budget(&mut self, account: &Account, amount: u128) {
        self.vote_budgets.insert(account.clone(), amount);
    }

    /// Approval budget handed to every account on each new ballot.
    pub fn set_approval_grant(&mut self, amount: u128) {
        self.approval_grant = amount;
    }

    /// Accrue fees that the next pull for `token` will return.
    pub fn accrue_fees(&mut self, token: &TokenId, amount: u128) {
        *self.pending_fees.entry(token.clone()).or_insert(0) += amount;
    }

    pub fn approve_pool(&mut self, pool: &PoolId) {
        self.approved_pools.insert(pool.clone());
    }

    // ── Reading back recorded calls ──────────────────────────────────────

    /// Total pool votes cast by `account` for `pool` across all calls.
    pub fn pool_cast(&self, account: &Account, pool: &PoolId) -> u128 {
        self.pool_casts
            .get(&(account.clone(), pool.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total approval votes cast by `account` on `ballot`.
    pub fn approval_cast(&self, account: &Account, ballot: BallotId) -> u128 {
        self.approval_casts
            .get(&(account.clone(), ballot))
            .copied()
            .unwrap_or(0)
    }

    pub fn ballot_pool(&self, ballot: BallotId) -> Option<&PoolId> {
        self.ballots.get(&ballot)
    }

    pub fn ballot_count(&self) -> u64 {
        self.next_ballot
    }
}

impl LiquidityProtocol for NullUpstream {
    fn locked_balance(&self, account: &Account) -> Result<u128, UpstreamError> {
        Ok(self.locked.get(account).copied().unwrap_or(0))
    }

    fn available_vote_budget(
        &self,
        account: &Account,
        _epoch: Epoch,
    ) -> Result<u128, UpstreamError> {
        Ok(self.vote_budgets.get(account).copied().unwrap_or(0))
    }

    fn cast_votes(
        &mut self,
        account: &Account,
        votes: &[(PoolId, u128)],
    ) -> Result<(), UpstreamError> {
        let total: u128 = votes.iter().map(|(_, amount)| amount).sum();
        let budget = self.vote_budgets.entry(account.clone()).or_insert(0);
        if total > *budget {
            return Err(UpstreamError::BudgetExceeded {
                requested: total,
                available: *budget,
            });
        }
        *budget -= total;
        for (pool, amount) in votes {
            *self
                .pool_casts
                .entry((account.clone(), pool.clone()))
                .or_insert(0) += amount;
        }
        Ok(())
    }

    fn submit_approval_ballot(&mut self, pool: &PoolId) -> Result<BallotId, UpstreamError> {
        let ballot = self.next_ballot;
        self.next_ballot += 1;
        self.ballots.insert(ballot, pool.clone());
        Ok(ballot)
    }

    fn approval_vote_budget(
        &self,
        account: &Account,
        ballot: BallotId,
    ) -> Result<u128, UpstreamError> {
        if !self.ballots.contains_key(&ballot) {
            return Err(UpstreamError::UnknownBallot(ballot));
        }
        Ok(self
            .approval_remaining
            .get(&(account.clone(), ballot))
            .copied()
            .unwrap_or(self.approval_grant))
    }

    fn cast_approval_votes(
        &mut self,
        account: &Account,
        ballot: BallotId,
        amount: u128,
    ) -> Result<(), UpstreamError> {
        if !self.ballots.contains_key(&ballot) {
            return Err(UpstreamError::UnknownBallot(ballot));
        }
        let remaining = self
            .approval_remaining
            .entry((account.clone(), ballot))
            .or_insert(self.approval_grant);
        if amount > *remaining {
            return Err(UpstreamError::BudgetExceeded {
                requested: amount,
                available: *remaining,
            });
        }
        *remaining -= amount;
        *self
            .approval_casts
            .entry((account.clone(), ballot))
            .or_insert(0) += amount;
        Ok(())
    }

    fn pull_accrued_fees(&mut self, token: &TokenId) -> Result<u128, UpstreamError> {
        Ok(self.pending_fees.remove(token).unwrap_or(0))
    }

    fn is_pool_approved(&self, pool: &PoolId) -> Result<bool, UpstreamError> {
        Ok(self.approved_pools.contains(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> Account {
        Account::new(format!("cap_{name}"))
    }

    #[test]
    fn budgets_are_consumed_by_casts() {
        let mut upstream = NullUpstream::new();
        let proxy = account("proxy");
        let pool = PoolId::new("pool_a");
        upstream.set_vote_budget(&proxy, 100);

        upstream.cast_votes(&proxy, &[(pool.clone(), 60)]).unwrap();
        assert_eq!(upstream.available_vote_budget(&proxy, 0).unwrap(), 40);
        assert_eq!(upstream.pool_cast(&proxy, &pool), 60);

        let err = upstream
            .cast_votes(&proxy, &[(pool.clone(), 41)])
            .unwrap_err();
        assert_eq!(
            err,
            UpstreamError::BudgetExceeded {
                requested: 41,
                available: 40
            }
        );
    }

    #[test]
    fn ballots_get_sequential_ids() {
        let mut upstream = NullUpstream::new();
        let a = upstream.submit_approval_ballot(&PoolId::new("a")).unwrap();
        let b = upstream.submit_approval_ballot(&PoolId::new("b")).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(upstream.ballot_pool(b), Some(&PoolId::new("b")));
    }

    #[test]
    fn approval_grant_is_per_ballot() {
        let mut upstream = NullUpstream::new();
        let proxy = account("proxy");
        upstream.set_approval_grant(500);
        let ballot = upstream.submit_approval_ballot(&PoolId::new("a")).unwrap();

        upstream.cast_approval_votes(&proxy, ballot, 200).unwrap();
        assert_eq!(upstream.approval_vote_budget(&proxy, ballot).unwrap(), 300);
        assert_eq!(upstream.approval_cast(&proxy, ballot), 200);
        assert!(upstream.cast_approval_votes(&proxy, ballot, 301).is_err());
    }

    #[test]
    fn fee_pulls_drain_the_accrual() {
        let mut upstream = NullUpstream::new();
        let token = TokenId::new("usdc");
        upstream.accrue_fees(&token, 70);
        upstream.accrue_fees(&token, 30);
        assert_eq!(upstream.pull_accrued_fees(&token).unwrap(), 100);
        assert_eq!(upstream.pull_accrued_fees(&token).unwrap(), 0);
    }
}
