//! Allow-listed price feeds, grounded on the teacher's `state/oracle.rs`
//! `OraclePriceData`/`HistoricalPriceData` (there: Pyth-sourced fields in
//! PRICE_PRECISION; here: a host-agnostic feed the host pushes ticks into).

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ErrorCode};

/// A price, in micro-units (denominator 1_000_000) per spec section 3.
pub type MicroPrice = u128;

/// Configuration for one allow-listed feed, set once by the admin and
/// mutated only by admin setters thereafter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedConfig {
    pub feed_id: u64,
    pub max_staleness_ms: u64,
}

/// The live reading for a feed: the host pushes these in as new ticks
/// arrive (there is no ambient "fetch" inside the core -- spec section 5
/// forbids suspension points).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FeedReading {
    /// Signed so a misbehaving upstream feed reporting a negative price is
    /// representable and rejected rather than silently wrapping.
    pub price: i128,
    pub confidence_bps: u64,
    pub twap: i128,
    pub last_update_ms: u64,
}

impl FeedReading {
    pub fn price_as_micro(&self) -> CoreResult<MicroPrice> {
        if self.price <= 0 {
            return Err(ErrorCode::NegativePrice);
        }
        u128::try_from(self.price).map_err(|_| ErrorCode::NegativePrice)
    }
}
