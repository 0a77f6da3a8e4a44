use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("unknown ballot: {0}")]
    UnknownBallot(u64),

    #[error("unknown pool: {0}")]
    UnknownPool(String),

    #[error("vote weight {requested} exceeds remaining budget {available}")]
    BudgetExceeded { requested: u128, available: u128 },

    #[error("external protocol rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("balance {available} short of transfer amount {needed}")]
    InsufficientFunds { needed: u128, available: u128 },
}
