//! UserLendingPosition (spec section 3): scaled supply/borrow units for
//! one (asset, account) pair. Underlying balance = `scaled * current_index`.
//! Grounded on the teacher's `math/spot_balance.rs` scaled-balance idiom
//! (there: a single spot balance scaled by a cumulative interest factor;
//! here split into supply- and borrow-side scaled balances per spec).

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::RAY;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct UserLendingPosition {
    pub scaled_supply: u128,
    pub scaled_borrow: u128,
}

impl UserLendingPosition {
    pub fn underlying_supply(&self, supply_index: u128) -> CoreResult<u128> {
        self.scaled_supply.safe_mul(supply_index)?.safe_div(RAY)
    }

    pub fn underlying_borrow(&self, borrow_index: u128) -> CoreResult<u128> {
        self.scaled_borrow.safe_mul(borrow_index)?.safe_div(RAY)
    }

    pub fn is_empty(&self) -> bool {
        self.scaled_supply == 0 && self.scaled_borrow == 0
    }
}
