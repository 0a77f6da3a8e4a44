//! Bonding fee distributor.
//!
//! Bonded deposits earn a pro-rata share of the protocol fees pulled from
//! the external protocol, bucketed per epoch and claimable after a
//! two-epoch lag. Exits run through a maturation queue and a linear
//! unbonding stream rather than paying out instantly.

mod account;
mod engine;
mod error;

pub use engine::BondingFeeDistributor;
pub use error::FeeError;
