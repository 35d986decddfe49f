//! Checked arithmetic on the primitive integer types used throughout the
//! core. Grounded on the teacher's `math/safe_math.rs` `SafeMath` trait and
//! `math/ceil_div.rs` / `math/floor_div.rs` `CheckedCeilDiv` /
//! `CheckedFloorDiv` traits -- same shape, generalized from
//! `SpedXSpotResult` to [`CoreResult`] and with `log::warn!` in place of
//! `solana_program::msg!`.

use crate::error::{CoreResult, ErrorCode};
use num_traits::{One, Zero};
use std::panic::Location;

pub trait SafeMath: Sized {
    fn safe_add(self, rhs: Self) -> CoreResult<Self>;
    fn safe_sub(self, rhs: Self) -> CoreResult<Self>;
    fn safe_mul(self, rhs: Self) -> CoreResult<Self>;
    fn safe_div(self, rhs: Self) -> CoreResult<Self>;
}

macro_rules! safe_math_impl {
    ($t:ty) => {
        impl SafeMath for $t {
            #[track_caller]
            #[inline(always)]
            fn safe_add(self, rhs: $t) -> CoreResult<$t> {
                self.checked_add(rhs).ok_or_else(|| {
                    let c = Location::caller();
                    log::warn!("overflow in add at {}:{}", c.file(), c.line());
                    ErrorCode::Overflow
                })
            }

            #[track_caller]
            #[inline(always)]
            fn safe_sub(self, rhs: $t) -> CoreResult<$t> {
                self.checked_sub(rhs).ok_or_else(|| {
                    let c = Location::caller();
                    log::warn!("underflow in sub at {}:{}", c.file(), c.line());
                    ErrorCode::Underflow
                })
            }

            #[track_caller]
            #[inline(always)]
            fn safe_mul(self, rhs: $t) -> CoreResult<$t> {
                self.checked_mul(rhs).ok_or_else(|| {
                    let c = Location::caller();
                    log::warn!("overflow in mul at {}:{}", c.file(), c.line());
                    ErrorCode::Overflow
                })
            }

            #[track_caller]
            #[inline(always)]
            fn safe_div(self, rhs: $t) -> CoreResult<$t> {
                self.checked_div(rhs).ok_or_else(|| {
                    let c = Location::caller();
                    log::warn!("division by zero at {}:{}", c.file(), c.line());
                    ErrorCode::DivByZero
                })
            }
        }
    };
}

safe_math_impl!(u128);
safe_math_impl!(u64);
safe_math_impl!(u32);
safe_math_impl!(i128);
safe_math_impl!(i64);

pub trait CheckedCeilDiv: Sized {
    fn safe_ceil_div(&self, rhs: Self) -> CoreResult<Self>;
}

pub trait CheckedFloorDiv: Sized {
    fn safe_floor_div(&self, rhs: Self) -> CoreResult<Self>;
}

macro_rules! ceil_div_impl {
    ($t:ty) => {
        impl CheckedCeilDiv for $t {
            #[inline]
            fn safe_ceil_div(&self, rhs: $t) -> CoreResult<$t> {
                let quotient = self.checked_div(rhs).ok_or(ErrorCode::DivByZero)?;
                let remainder = self.checked_rem(rhs).ok_or(ErrorCode::DivByZero)?;
                if remainder > <$t>::zero() {
                    quotient.checked_add(<$t>::one()).ok_or(ErrorCode::Overflow)
                } else {
                    Ok(quotient)
                }
            }
        }
    };
}

macro_rules! floor_div_impl {
    ($t:ty) => {
        impl CheckedFloorDiv for $t {
            #[inline]
            fn safe_floor_div(&self, rhs: $t) -> CoreResult<$t> {
                let quotient = self.checked_div(rhs).ok_or(ErrorCode::DivByZero)?;
                let remainder = self.checked_rem(rhs).ok_or(ErrorCode::DivByZero)?;
                if remainder != <$t>::zero() && (*self < <$t>::zero()) != (rhs < <$t>::zero()) {
                    quotient.checked_sub(<$t>::one()).ok_or(ErrorCode::Underflow)
                } else {
                    Ok(quotient)
                }
            }
        }
    };
}

ceil_div_impl!(u128);
ceil_div_impl!(u64);
floor_div_impl!(i128);
floor_div_impl!(i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up_on_remainder() {
        assert_eq!(7u128.safe_ceil_div(2).unwrap(), 4);
        assert_eq!(8u128.safe_ceil_div(2).unwrap(), 4);
    }

    #[test]
    fn floor_div_rounds_down_for_negative_quotient() {
        assert_eq!((-3i128).safe_floor_div(2).unwrap(), -2);
        assert!((-3i128).safe_floor_div(0).is_err());
    }

    #[test]
    fn add_overflow_is_caught() {
        assert_eq!(u128::MAX.safe_add(1), Err(ErrorCode::Overflow));
    }
}
