use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockerError {
    #[error("invalid lock parameters: amount {amount}, duration {epochs} epochs")]
    InvalidLockParameters { amount: u128, epochs: u64 },

    #[error("account has no active locks")]
    NoActiveLocks,

    #[error("arithmetic overflow")]
    Overflow,
}
