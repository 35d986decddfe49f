//! FixedMath (spec section 4.1): checked integer arithmetic and the three
//! fixed-point conventions used everywhere else in the core -- basis points
//! (denominator 10_000), micro-unit prices (denominator 1_000_000) and
//! ray-scaled indices (denominator 10^18). Every higher layer routes its
//! arithmetic through this module; an overflow/underflow here is meant to
//! be treated as fatal by the caller (spec section 7), never papered over.

pub mod bignumber;
pub mod casting;
pub mod safe_math;

pub use bignumber::U256;
pub use casting::Cast;
pub use safe_math::{CheckedCeilDiv, CheckedFloorDiv, SafeMath};

use crate::error::{CoreResult, ErrorCode};

pub const BPS_DENOMINATOR: u128 = 10_000;
pub const PRICE_DENOMINATOR: u128 = 1_000_000;
pub const RAY: u128 = 1_000_000_000_000_000_000;
pub const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;
pub const MAX_ACCRUAL_DT_SEC: u64 = 7 * 24 * 60 * 60;

/// `x * bps / 10_000`, floor rounding -- used for collateral seize amounts
/// and anywhere the spec calls for a floor (fee vaults must never be
/// overpaid a rebate it didn't actually collect).
pub fn mul_bps_floor(x: u128, bps: u64) -> CoreResult<u128> {
    x.safe_mul(bps as u128)?.safe_div(BPS_DENOMINATOR)
}

/// `x * bps / 10_000`, half-even (banker's) rounding -- used for fee
/// collection per spec section 4.1.
pub fn mul_bps_half_even(x: u128, bps: u64) -> CoreResult<u128> {
    let scaled = x.safe_mul(bps as u128)?;
    let quotient = scaled.safe_div(BPS_DENOMINATOR)?;
    let remainder = scaled % BPS_DENOMINATOR;
    let half = BPS_DENOMINATOR / 2;
    let rounded = if remainder > half {
        quotient.safe_add(1)?
    } else if remainder == half {
        // round to even: bump only if the quotient is currently odd
        if quotient % 2 == 1 {
            quotient.safe_add(1)?
        } else {
            quotient
        }
    } else {
        quotient
    };
    Ok(rounded)
}

/// `index * (1 + rate_per_sec * dt_sec)` evaluated on a ray-scaled index,
/// with `rate_per_sec` itself ray-scaled. `dt_sec` is clamped to
/// `[0, MAX_ACCRUAL_DT_SEC]` to bound the magnitude of the intermediate
/// product (spec section 4.1). Returns the new index; the caller derives
/// `delta = new_index - old_index` scaled by whatever principal it tracks.
pub fn accrue_index(index: u128, rate_per_sec_ray: u128, dt_sec: u64) -> CoreResult<u128> {
    let dt = dt_sec.min(MAX_ACCRUAL_DT_SEC) as u128;
    // delta_ray = rate_per_sec_ray * dt_sec -- still ray-scaled, since dt_sec
    // is a plain count of seconds rather than a second fixed-point value.
    let delta_ray = U256::from(rate_per_sec_ray)
        .checked_mul(U256::from(dt))
        .ok_or(ErrorCode::Overflow)?;
    let index_wide = U256::from(index);
    let product = index_wide
        .checked_mul(delta_ray)
        .ok_or(ErrorCode::Overflow)?
        / U256::from(RAY);
    let new_index = index_wide.checked_add(product).ok_or(ErrorCode::Overflow)?;
    new_index.try_to_u128()
}

/// Explicit-sign arithmetic for P&L, grounded on the teacher's
/// `math/balance.rs::get_amount_signed` (there: deposits positive, borrows
/// negated). A `Sign` keeps the arithmetic from relying on two's-complement
/// wraparound the way a bare `i128` subtraction might tempt a caller to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAmount {
    pub magnitude: u128,
    pub sign: Sign,
}

impl SignedAmount {
    pub fn new(magnitude: u128, sign: Sign) -> Self {
        SignedAmount { magnitude, sign }
    }

    pub fn zero() -> Self {
        SignedAmount { magnitude: 0, sign: Sign::Positive }
    }

    pub fn to_i128(self) -> CoreResult<i128> {
        let m: i128 = self.magnitude.cast()?;
        Ok(match self.sign {
            Sign::Positive => m,
            Sign::Negative => -m,
        })
    }

    pub fn from_i128(v: i128) -> CoreResult<Self> {
        if v >= 0 {
            Ok(SignedAmount::new(v.cast()?, Sign::Positive))
        } else {
            let magnitude: i128 = v.checked_neg().ok_or(ErrorCode::Overflow)?;
            Ok(SignedAmount::new(magnitude.cast()?, Sign::Negative))
        }
    }

    pub fn add(self, other: SignedAmount) -> CoreResult<SignedAmount> {
        SignedAmount::from_i128(self.to_i128()?.safe_add(other.to_i128()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_bps_floor_never_overpays() {
        // 3 units at 33bps should floor to 0, not round up.
        assert_eq!(mul_bps_floor(3, 33).unwrap(), 0);
        assert_eq!(mul_bps_floor(10_000, 50).unwrap(), 50);
    }

    #[test]
    fn mul_bps_half_even_rounds_exact_halves_to_even_quotient() {
        // 5_000 * 1bps / 10_000 = 0.5 exactly; quotient 0 is even, stays 0.
        assert_eq!(mul_bps_half_even(5_000, 1).unwrap(), 0);
        // 15_000 * 1bps / 10_000 = 1.5 exactly; quotient 1 is odd, rounds up to 2.
        assert_eq!(mul_bps_half_even(15_000, 1).unwrap(), 2);
    }

    #[test]
    fn accrue_index_is_idempotent_at_zero_dt() {
        let i0 = RAY;
        let i1 = accrue_index(i0, RAY / 100, 0).unwrap();
        assert_eq!(i0, i1);
    }

    #[test]
    fn accrue_index_grows_monotonically() {
        let i0 = RAY;
        let i1 = accrue_index(i0, RAY / 100, 1).unwrap();
        assert!(i1 >= i0);
    }

    #[test]
    fn signed_amount_round_trips() {
        let s = SignedAmount::from_i128(-42).unwrap();
        assert_eq!(s.sign, Sign::Negative);
        assert_eq!(s.to_i128().unwrap(), -42);
    }
}
