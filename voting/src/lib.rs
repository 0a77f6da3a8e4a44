//! Vote proxying into the external liquidity protocol.
//!
//! Lock weight becomes per-epoch vote budgets; accepted votes are tallied
//! internally and mirrored upstream through the protocol's proxy account at
//! a live exchange ratio. Also carries the reserved fixed-pool allocation
//! and the approval-ballot machinery.

mod ballot;
mod engine;
mod error;

pub use ballot::ApprovalBallot;
pub use engine::{VoteProxy, VOTE_MAX};
pub use error::VotingError;
