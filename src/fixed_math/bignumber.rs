//! Wide unsigned integers for ray-scaled (10^18) index arithmetic, grounded
//! on the teacher's `math/bignumber.rs` (`construct_uint!` from the `uint`
//! crate). The teacher needed U192/U256 to avoid overflow when multiplying
//! two already-large fixed-point quantities together before dividing back
//! down; the same hazard shows up multiplying a ray-scaled index by a
//! ray-scaled rate factor, so we keep the same tool.

use crate::error::{CoreResult, ErrorCode};
use uint::construct_uint;

construct_uint! {
    pub struct U256(4);
}

impl U256 {
    pub fn try_to_u128(self) -> CoreResult<u128> {
        self.try_into().map_err(|_| ErrorCode::Overflow)
    }
}
