//! Order (spec section 3): the resting/incoming unit the matching engine
//! operates on. Grounded on the teacher's `state/order.rs` field layout,
//! collapsed from the teacher's derivatives-order superset (trigger
//! conditions, oracle-pegged pricing, reduce-only) down to the spot CLOB
//! fields spec section 3 actually names, plus the maker-escrow and bond
//! fields spec section 4.5 requires.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::events::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OrderStatus {
    Open,
    Partial,
    Filled,
    Canceled,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Expired)
    }
}

/// `taker_mode` from `place_order`'s contract (spec section 4.5):
/// Immediate-or-Cancel discards any unfilled remainder after crossing
/// instead of resting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum TakerMode {
    Gtc,
    Ioc,
}

#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Order {
    pub id: u64,
    pub side: Side,
    pub price: u128,
    pub size: u128,
    pub remaining: u128,
    pub owner: String,
    pub created_ms: u64,
    pub expiry_ms: u64,
    /// Escrow posted at place-time per spec section 4.5's bond policy.
    /// Refunded on normal termination, slashable only for configured abuse.
    pub bond: u128,
    pub status: OrderStatus,
    /// Intra-market sequence id, assigned at insertion; breaks ties within
    /// a price level (spec section 4.5 invariant 1).
    pub sequence: u64,
    /// Accumulated maker proceeds held in per-order escrow until
    /// `claim_maker_fills` (spec section 4.5: prevents maker-abort vectors
    /// across partial-fill sequences).
    pub maker_escrow: u128,
}

impl Order {
    pub fn is_cancelable(&self) -> bool {
        !self.status.is_terminal()
    }
}
