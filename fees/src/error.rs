use capstan_upstream::{UpstreamError, VaultError};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("needed {needed} of the value token but only {available} is held")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("requested {requested} unbondable tokens with only {available} matured")]
    InsufficientUnbondableBalance { requested: u128, available: u128 },

    #[error("emergency bailout is active; distributor is frozen")]
    EmergencyBailoutActive,

    #[error("caller is not the distributor owner")]
    Unauthorized,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("upstream protocol rejected the call: {0}")]
    Upstream(#[from] UpstreamError),
}

impl From<VaultError> for FeeError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::InsufficientFunds { needed, available } => {
                FeeError::InsufficientBalance { needed, available }
            }
        }
    }
}
