//! DerivativesCore (spec section 4.9): futures/perps market objects
//! (mark, MTM, funding, expiry settlement). Grounded on the teacher's
//! `state/market.rs` per-market object plus the pack's `rwa-perps`
//! funding/liquidation operations, generalized to this crate's
//! checked-math and event conventions.

pub mod funding;
pub mod market;
pub mod position;
pub mod twap;

pub use funding::FUNDING_INTERVAL_MS;
pub use market::{DerivativesMarket, MarginParams, SETTLEMENT_WINDOW_MS, TWAP_PERIOD_MS};
pub use position::{DerivativePosition, PositionSide};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::error::{CoreResult, ErrorCode};

/// Registry of every derivatives market, the way [`crate::lending::LendingMarket`]
/// aggregates lending pools -- keeps per-symbol markets independently
/// addressable without the core ever holding a bidirectional market <->
/// position reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivativesRegistry {
    markets: HashMap<String, DerivativesMarket>,
}

impl DerivativesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_market(&mut self, _admin: &AdminCap, market: DerivativesMarket) {
        self.markets.insert(market.symbol.clone(), market);
    }

    pub fn market(&self, symbol: &str) -> CoreResult<&DerivativesMarket> {
        self.markets.get(symbol).ok_or(ErrorCode::UnknownSymbol)
    }

    pub fn market_mut(&mut self, symbol: &str) -> CoreResult<&mut DerivativesMarket> {
        self.markets.get_mut(symbol).ok_or(ErrorCode::UnknownSymbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::derivatives::market::MarginParams;

    #[test]
    fn registry_creates_and_looks_up_markets() {
        let admin = AdminCap::new();
        let mut registry = DerivativesRegistry::new();
        let margin = MarginParams { initial_margin_bps: 1_000, maintenance_margin_bps: 500, max_funding_band_bps: 500 };
        registry.create_market(&admin, DerivativesMarket::new("BTC-PERP", 1, 1, None, margin, Clock::at(0).now_ms));
        assert!(registry.market("BTC-PERP").is_ok());
        assert_eq!(registry.market("ETH-PERP").err(), Some(ErrorCode::UnknownSymbol));
    }
}
