//! OracleRegistry (spec section 4.2): the single allow-list + staleness
//! gate every risk check in the core reads through. Grounded on the
//! teacher's `state/oracle.rs` (there: Pyth account parsing bound to a
//! Solana account; here: a host-pushed reading, since this crate owns no
//! account model).

pub mod feed;
pub mod validity;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::clock::Clock;
use crate::error::{CoreResult, ErrorCode};
use crate::oracle::feed::{FeedConfig, FeedReading, MicroPrice};
use crate::oracle::validity::{classify, OracleGuardRails, OracleValidity};

/// Allow-list of price feeds, keyed by symbol. A shared object with the
/// single-writer discipline of spec section 5: only the holder of an
/// [`AdminCap`] may mutate the allow-list; any caller may read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleRegistry {
    feeds: HashMap<String, FeedConfig>,
    readings: HashMap<String, FeedReading>,
    pub guard_rails: OracleGuardRails,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow-lists a feed. Requires [`AdminCap`] per spec section 4.2.
    pub fn set_feed(&mut self, _admin: &AdminCap, symbol: &str, feed_id: u64, max_staleness_ms: u64) {
        self.feeds.insert(symbol.to_string(), FeedConfig { feed_id, max_staleness_ms });
    }

    pub fn set_guard_rails(&mut self, _admin: &AdminCap, guard_rails: OracleGuardRails) {
        self.guard_rails = guard_rails;
    }

    /// Host pushes a new tick for an already allow-listed feed. Not itself
    /// admin-gated -- the host's keeper/oracle-relayer role is external to
    /// this crate; the allow-list (`set_feed`) is the actual gate.
    pub fn push_reading(&mut self, symbol: &str, reading: FeedReading) -> CoreResult<()> {
        if !self.feeds.contains_key(symbol) {
            return Err(ErrorCode::UnknownSymbol);
        }
        self.readings.insert(symbol.to_string(), reading);
        Ok(())
    }

    /// `price(symbol, now_ms) -> micro_price` per spec section 4.2:
    /// fails `StalePrice` / `UnknownSymbol` / `NegativePrice` as specified.
    /// Does not apply the confidence/volatility guard rails -- callers
    /// that want the stricter gate should use [`Self::price_checked`].
    pub fn price(&self, symbol: &str, clock: Clock) -> CoreResult<MicroPrice> {
        let cfg = self.feeds.get(symbol).ok_or(ErrorCode::UnknownSymbol)?;
        let reading = self.readings.get(symbol).ok_or(ErrorCode::UnknownSymbol)?;
        let age = clock.now_ms.saturating_sub(reading.last_update_ms);
        if age > cfg.max_staleness_ms {
            return Err(ErrorCode::StalePrice);
        }
        reading.price_as_micro()
    }

    /// As [`Self::price`], but additionally fail-closed on the guard
    /// rails' confidence/volatility classification (supplemented ambient
    /// behavior, see SPEC_FULL.md section 2). Used by risk-gated ops
    /// (borrow, mint, liquidate, MTM) rather than display-only reads.
    pub fn price_checked(&self, symbol: &str, clock: Clock) -> CoreResult<MicroPrice> {
        let price = self.price(symbol, clock)?;
        let reading = self.readings.get(symbol).ok_or(ErrorCode::UnknownSymbol)?;
        let validity = classify(reading, &self.guard_rails)?;
        if let Some(err) = validity.into_error() {
            return Err(err);
        }
        Ok(price)
    }

    pub fn validity_of(&self, symbol: &str) -> CoreResult<OracleValidity> {
        let reading = self.readings.get(symbol).ok_or(ErrorCode::UnknownSymbol)?;
        classify(reading, &self.guard_rails)
    }

    pub fn is_allow_listed(&self, symbol: &str) -> bool {
        self.feeds.contains_key(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(symbol: &str, price: i128, last_update_ms: u64, max_staleness_ms: u64) -> OracleRegistry {
        let admin = AdminCap::new();
        let mut r = OracleRegistry::new();
        r.set_feed(&admin, symbol, 1, max_staleness_ms);
        r.push_reading(symbol, FeedReading { price, confidence_bps: 5, twap: price, last_update_ms }).unwrap();
        r
    }

    #[test]
    fn fresh_price_reads_ok() {
        let r = registry_with("BTC", 50_000_000_000, 1_000, 5_000);
        assert_eq!(r.price("BTC", Clock::at(2_000)).unwrap(), 50_000_000_000);
    }

    #[test]
    fn stale_price_rejected_at_boundary_plus_one() {
        let r = registry_with("BTC", 50_000_000_000, 0, 5_000);
        assert!(r.price("BTC", Clock::at(5_000)).is_ok());
        assert_eq!(r.price("BTC", Clock::at(5_001)), Err(ErrorCode::StalePrice));
    }

    #[test]
    fn unknown_symbol_rejected() {
        let r = OracleRegistry::new();
        assert_eq!(r.price("ETH", Clock::at(0)), Err(ErrorCode::UnknownSymbol));
    }

    #[test]
    fn negative_price_rejected() {
        let r = registry_with("BTC", -1, 0, 5_000);
        assert_eq!(r.price("BTC", Clock::at(0)), Err(ErrorCode::NegativePrice));
    }
}
