//! Overflow-safe proportional arithmetic.
//!
//! Pro-rata shares multiply two 10^18-scaled amounts before dividing, which
//! can exceed `u128`. `mul_div` runs the product through a 256-bit
//! intermediate so the only failure mode is a quotient that genuinely does
//! not fit.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("quotient exceeds u128 range")]
    Overflow,
}

/// Floor of `a * b / d` without intermediate overflow.
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (hi, lo) = widening_mul(a, b);
    if hi == 0 {
        return Ok(lo / d);
    }
    if hi >= d {
        // quotient >= 2^128
        return Err(MathError::Overflow);
    }
    Ok(div_wide(hi, lo, d))
}

/// 128 x 128 -> 256-bit product, returned as (high, low) halves.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (mid << 64) | (ll & MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// Restoring division of the 256-bit value `hi:lo` by `d`.
///
/// Caller guarantees `hi < d`, so the quotient fits in u128.
fn div_wide(hi: u128, lo: u128, d: u128) -> u128 {
    let mut rem = hi;
    let mut quot = 0u128;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    quot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values() {
        assert_eq!(mul_div(6, 7, 2).unwrap(), 21);
        assert_eq!(mul_div(0, 7, 2).unwrap(), 0);
    }

    #[test]
    fn rounds_toward_zero() {
        assert_eq!(mul_div(7, 3, 2).unwrap(), 10);
        assert_eq!(mul_div(1, 1, 3).unwrap(), 0);
    }

    #[test]
    fn wide_intermediate() {
        // The product of two 10^27 operands exceeds u128; the quotient does not.
        let x = 1_000_000_000_000_000_000_000_000_000u128;
        assert_eq!(mul_div(x, x, x).unwrap(), x);
        assert_eq!(mul_div(x, 3 * x, 2 * x).unwrap(), x / 2 * 3);
    }

    #[test]
    fn max_operands() {
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
        assert_eq!(mul_div(u128::MAX, 1, 1).unwrap(), u128::MAX);
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(mul_div(1, 1, 0), Err(MathError::DivisionByZero));
    }

    #[test]
    fn quotient_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), Err(MathError::Overflow));
    }
}
