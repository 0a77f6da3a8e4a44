//! Abstract interfaces to the systems capstan sits on top of.
//!
//! The engines treat the external liquidity protocol and the wrapping value
//! vault purely as injected capabilities: every interaction goes through
//! these traits, and the rest of the workspace depends only on them. The
//! in-memory implementations used by tests live in `capstan-nullables`.

pub mod error;
pub mod protocol;
pub mod vault;

pub use error::{UpstreamError, VaultError};
pub use protocol::LiquidityProtocol;
pub use vault::ValueVault;
