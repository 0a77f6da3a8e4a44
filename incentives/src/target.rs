use capstan_types::PoolId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an incentive bucket is aimed.
///
/// `Lockers` rewards passive lock weight and runs on the lock ledger's lead
/// clock; `Pool` rewards votes cast for a specific external pool and runs on
/// the calendar clock. The two bucket series are therefore deliberately out
/// of phase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncentiveTarget {
    Lockers,
    Pool(PoolId),
}

impl fmt::Display for IncentiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncentiveTarget::Lockers => write!(f, "lockers"),
            IncentiveTarget::Pool(pool) => write!(f, "pool:{pool}"),
        }
    }
}
