use capstan_types::BallotId;
use capstan_upstream::UpstreamError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("voting is closed until the final days of the epoch")]
    VotingClosed,

    #[error("requested {requested} votes but only {available} are available")]
    VotesExceeded { requested: u128, available: u128 },

    #[error("caller weight {weight} is below the required {required}")]
    InsufficientWeight { weight: u128, required: u128 },

    #[error("ballot cooldown active for another {remaining_secs}s")]
    CooldownActive { remaining_secs: u64 },

    #[error("fixed pool approval was already submitted")]
    FixedPoolAlreadyApproved,

    #[error("unknown ballot {0}")]
    BallotNotFound(BallotId),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("upstream protocol rejected the call: {0}")]
    Upstream(#[from] UpstreamError),
}
