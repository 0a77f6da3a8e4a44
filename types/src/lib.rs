//! Fundamental types for the capstan protocol.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! accounts, token and pool identifiers, timestamps, epoch arithmetic, sparse per-epoch
//! series, and protocol parameters.

pub mod account;
pub mod amount;
pub mod epoch;
pub mod math;
pub mod params;
pub mod series;
pub mod time;
pub mod token;

pub use account::Account;
pub use amount::{TOKEN_UNIT, WEIGHT_SCALE};
pub use epoch::{Epoch, EpochClock};
pub use math::{mul_div, MathError};
pub use params::ProtocolParams;
pub use series::EpochSeries;
pub use time::Timestamp;
pub use token::{BallotId, PoolId, TokenId};
