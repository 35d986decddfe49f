//! Checked numeric casts, grounded on the teacher's `math/casting.rs` `Cast`
//! trait (there: `#[track_caller]` + `solana_program::msg!`; here: `log`).

use crate::error::{CoreResult, ErrorCode};
use std::convert::TryFrom;

pub trait Cast: Sized {
    #[track_caller]
    fn cast<T: TryFrom<Self>>(self) -> CoreResult<T> {
        match T::try_from(self) {
            Ok(v) => Ok(v),
            Err(_) => {
                let caller = std::panic::Location::caller();
                log::warn!("cast failure at {}:{}", caller.file(), caller.line());
                Err(ErrorCode::CastFailure)
            }
        }
    }
}

impl Cast for u128 {}
impl Cast for i128 {}
impl Cast for u64 {}
impl Cast for i64 {}
impl Cast for u32 {}
impl Cast for i32 {}
impl Cast for usize {}
