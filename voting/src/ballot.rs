use capstan_types::{BallotId, Epoch, PoolId, Timestamp};
use serde::{Deserialize, Serialize};

/// An approval ballot opened upstream through the proxy.
///
/// The mirror ratio is fixed once at creation. Internal approval votes cast
/// later against this ballot are scaled by it regardless of how much of the
/// external approval budget has already been spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalBallot {
    pub id: BallotId,
    pub pool: PoolId,
    /// Calendar epoch the ballot was opened in. Internal vote budgets for
    /// the ballot are read against this epoch's lock weights.
    pub epoch: Epoch,
    pub mirror_ratio: u128,
    pub created_at: Timestamp,
}
