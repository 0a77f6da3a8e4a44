//! Lock ledger for the capstan protocol.
//!
//! Tracks time-locked balances and the per-epoch voting weight they carry.
//! Weight is flat over a lock's life and drops to zero at expiry; expiries
//! are applied through scheduled decrements, so elapsing epochs costs O(1)
//! amortized regardless of lock duration. Historical weight reads stay
//! available for every past epoch.

pub mod engine;
pub mod error;
pub mod weights;

pub use engine::LockLedger;
pub use error::LockerError;
pub use weights::WeightTrack;
