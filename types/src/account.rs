//! Account identifier type with `cap_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A capstan account identifier, always prefixed with `cap_`.
///
/// Identifies lockers, bonders, incentive depositors and the proxy account
/// the protocol itself holds in the external liquidity protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Account(String);

impl Account {
    /// The standard prefix for all capstan accounts.
    pub const PREFIX: &'static str = "cap_";

    /// Create a new account from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `cap_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "account must start with cap_");
        Self(s)
    }

    /// Return the raw account string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this account is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Account {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
