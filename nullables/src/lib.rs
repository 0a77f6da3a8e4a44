//! Nullable infrastructure for deterministic testing.
//!
//! The engines reach the outside world through two seams: the external
//! liquidity protocol and the wrapping value vault. This crate provides
//! in-memory implementations of both that:
//! - Return deterministic, programmable values
//! - Record every call for later assertion
//! - Never touch the network or filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod upstream;
pub mod vault;

pub use upstream::NullUpstream;
pub use vault::NullVault;
