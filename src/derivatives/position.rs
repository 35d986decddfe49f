//! DerivativePosition (spec section 4.9): one account's open exposure in
//! a futures or perps market. Grounded on the teacher's `state/order.rs`
//! scaled-balance idiom plus the pack's `rwa-perps` `Position` struct
//! (entry price, margin, per-position funding checkpoint) generalized to
//! this crate's explicit-sign [`SignedAmount`] arithmetic instead of a
//! bare signed size.

use serde::{Deserialize, Serialize};

use crate::fixed_math::{Sign, SignedAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn sign(self) -> Sign {
        match self {
            PositionSide::Long => Sign::Positive,
            PositionSide::Short => Sign::Negative,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativePosition {
    pub owner: String,
    pub side: PositionSide,
    /// Contract-unit size, always positive; direction lives in `side`.
    pub size: u128,
    pub entry_price: u128,
    pub margin: u128,
    /// Running P&L accumulated across every `mtm_step` call since the
    /// position was opened (or last partially liquidated): each pass adds
    /// `size * (p - entry_price) * sign` rather than overwriting the
    /// total, so `close_position`/`liquidate_position` pay out the full
    /// move since entry, not just the most recent mark (spec section 4.9).
    pub realized_pnl: SignedAmount,
    /// `funding_index` observed the last time this position's funding was
    /// settled; perps only, left at 0 for futures positions.
    pub funding_index_at_entry: i128,
    /// Re-derived on every `mtm_step` call from margin plus the
    /// cumulative `realized_pnl`; true exactly when the position was
    /// under maintenance as of the last MTM pass (spec section 4.9:
    /// "flagged for liquidation").
    pub flagged_for_liquidation: bool,
    pub opened_ms: u64,
}

impl DerivativePosition {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
