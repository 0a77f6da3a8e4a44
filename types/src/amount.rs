//! Amount conventions.
//!
//! Amounts are raw `u128` base units to avoid floating-point errors.
//! One whole token is `TOKEN_UNIT` raw units.

/// Raw base units per whole token (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Divisor converting lock weight into whole votes: one vote per whole
/// token of weight.
pub const WEIGHT_SCALE: u128 = TOKEN_UNIT;
