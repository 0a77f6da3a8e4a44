//! Third-party incentive distributor.
//!
//! Incentives are pushed into weekly buckets aimed either at lockers (split
//! by lock weight) or at a pool's voters (split by vote tallies). A closed
//! bucket streams out linearly over the following epoch, and cursors track
//! each claimer's exact streaming position so partial claims pay only the
//! marginal increase.

mod engine;
mod error;
mod target;

pub use engine::IncentiveDistributor;
pub use error::IncentiveError;
pub use target::IncentiveTarget;
