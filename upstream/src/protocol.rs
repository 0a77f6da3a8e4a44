use capstan_types::{Account, BallotId, Epoch, PoolId, TokenId};

use crate::UpstreamError;

/// The external liquidity protocol, as seen from capstan.
///
/// Capstan holds a single proxy account inside the protocol; all mirrored
/// votes and pulled fees flow through it. The protocol is a black box:
/// nothing here assumes anything about its internals beyond these calls.
pub trait LiquidityProtocol {
    /// Tokens the proxy account has locked in the external protocol.
    fn locked_balance(&self, account: &Account) -> Result<u128, UpstreamError>;

    /// Votes the account may still cast in the external protocol for `epoch`.
    fn available_vote_budget(&self, account: &Account, epoch: Epoch)
        -> Result<u128, UpstreamError>;

    /// Cast pool votes on behalf of `account`.
    fn cast_votes(
        &mut self,
        account: &Account,
        votes: &[(PoolId, u128)],
    ) -> Result<(), UpstreamError>;

    /// Open an approval ballot for `pool`; returns the ballot's index.
    fn submit_approval_ballot(&mut self, pool: &PoolId) -> Result<BallotId, UpstreamError>;

    /// Approval votes the account may still cast on `ballot`.
    fn approval_vote_budget(
        &self,
        account: &Account,
        ballot: BallotId,
    ) -> Result<u128, UpstreamError>;

    /// Cast approval votes on behalf of `account`.
    fn cast_approval_votes(
        &mut self,
        account: &Account,
        ballot: BallotId,
        amount: u128,
    ) -> Result<(), UpstreamError>;

    /// Pull the fees accrued for `token` since the previous pull.
    /// Returns the marginal amount transferred to the caller.
    fn pull_accrued_fees(&mut self, token: &TokenId) -> Result<u128, UpstreamError>;

    /// Whether `pool` has passed approval in the external protocol.
    fn is_pool_approved(&self, pool: &PoolId) -> Result<bool, UpstreamError>;
}
