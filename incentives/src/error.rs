use capstan_types::PoolId;
use capstan_upstream::UpstreamError;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error("pool {0} has not passed approval")]
    PoolNotApproved(PoolId),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("upstream protocol rejected the call: {0}")]
    Upstream(#[from] UpstreamError),
}
