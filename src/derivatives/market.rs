//! DerivativesMarket (spec section 4.9): a single futures or perpetual
//! market. Grounded on the teacher's `state/market.rs` per-market
//! parameter-and-position-map shape, generalized from a spot order book
//! to a margined derivative the way the pack's `rwa-perps` market holds
//! one `MarketConfig` plus a map of `Position`s. Mark price is never read
//! from the oracle directly -- per spec's glossary, "mark derives from
//! the CLOB" -- so every entry point here takes the caller-supplied mark
//! price a keeper reads off the matching `orderbook::Market` rather than
//! holding a reference to it (spec section 9: "no bidirectional
//! references").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::clock::Clock;
use crate::derivatives::funding::{accrue_funding_index, clamped_premium_bps, settle_funding_payment, FUNDING_INTERVAL_MS};
use crate::derivatives::position::{DerivativePosition, PositionSide};
use crate::derivatives::twap::calculate_twap;
use crate::error::{CoreResult, ErrorCode};
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::{mul_bps_floor, Cast, SignedAmount};

/// Window (spec section 4.9) within which `settle_expiry` may be called
/// and a fresh mark sample still contributes to the settlement TWAP.
pub const SETTLEMENT_WINDOW_MS: u64 = 60 * 60 * 1_000;
/// Period the mark-price TWAP averages over; also the window
/// `settle_expiry` draws its settlement price from.
pub const TWAP_PERIOD_MS: u64 = 30 * 60 * 1_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarginParams {
    pub initial_margin_bps: u64,
    pub maintenance_margin_bps: u64,
    pub max_funding_band_bps: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivativesMarket {
    pub symbol: String,
    pub contract_size: u128,
    pub tick: u128,
    /// `None` for a perpetual; `Some(expiry_ms)` for a dated future
    /// (spec section 4.9).
    pub expiry_ms: Option<u64>,
    pub mark_price: u128,
    pub mark_twap: u128,
    pub last_twap_update_ms: u64,
    pub settlement_price: Option<u128>,
    pub funding_index: i128,
    pub last_funding_ms: u64,
    pub margin: MarginParams,
    pub paused: bool,
    positions: HashMap<String, DerivativePosition>,
}

impl DerivativesMarket {
    pub fn new(symbol: impl Into<String>, contract_size: u128, tick: u128, expiry_ms: Option<u64>, margin: MarginParams, now_ms: u64) -> Self {
        DerivativesMarket {
            symbol: symbol.into(),
            contract_size,
            tick,
            expiry_ms,
            mark_price: 0,
            mark_twap: 0,
            last_twap_update_ms: now_ms,
            settlement_price: None,
            funding_index: 0,
            last_funding_ms: now_ms,
            margin,
            paused: false,
            positions: HashMap::new(),
        }
    }

    pub fn is_perp(&self) -> bool {
        self.expiry_ms.is_none()
    }

    pub fn position(&self, owner: &str) -> Option<&DerivativePosition> {
        self.positions.get(owner)
    }

    pub fn set_paused(&mut self, _admin: &AdminCap, paused: bool) {
        self.paused = paused;
    }

    fn notional(&self, size: u128, price: u128) -> CoreResult<u128> {
        size.safe_mul(price)?.safe_mul(self.contract_size)
    }

    /// `open_position`: requires fresh margin at least `initial_margin_bps`
    /// of notional (spec section 3 invariant: `margin >= initial_margin_at_open`).
    /// One open position per account per market, matching the teacher's
    /// single-position-per-market-per-account model; repeat calls average
    /// into the existing position at a size-weighted entry price.
    pub fn open_position(
        &mut self,
        clock: Clock,
        owner: &str,
        side: PositionSide,
        size: u128,
        entry_price: u128,
        margin: u128,
    ) -> CoreResult<()> {
        if self.paused {
            return Err(ErrorCode::MarketPaused);
        }
        if size == 0 || entry_price == 0 {
            return Err(ErrorCode::BadPrice);
        }
        if entry_price % self.tick != 0 {
            return Err(ErrorCode::TickViolation);
        }
        let notional = self.notional(size, entry_price)?;
        let required = mul_bps_floor(notional, self.margin.initial_margin_bps)?;
        if margin < required {
            return Err(ErrorCode::InsufficientEscrow);
        }

        match self.positions.get_mut(owner) {
            Some(existing) if existing.side == side => {
                let total_size = existing.size.safe_add(size)?;
                let blended_entry = existing
                    .size
                    .safe_mul(existing.entry_price)?
                    .safe_add(size.safe_mul(entry_price)?)?
                    .safe_div(total_size)?;
                existing.size = total_size;
                existing.entry_price = blended_entry;
                existing.margin = existing.margin.safe_add(margin)?;
            }
            Some(_) => return Err(ErrorCode::NotCancelable),
            None => {
                self.positions.insert(
                    owner.to_string(),
                    DerivativePosition {
                        owner: owner.to_string(),
                        side,
                        size,
                        entry_price,
                        margin,
                        realized_pnl: SignedAmount::zero(),
                        funding_index_at_entry: self.funding_index,
                        flagged_for_liquidation: false,
                        opened_ms: clock.now_ms,
                    },
                );
            }
        }

        Ok(())
    }

    /// `close_position`: settles any outstanding funding, realizes P&L at
    /// `exit_price` and releases `margin + pnl` to the caller. Returns the
    /// net payout (may be less than posted margin if P&L is negative).
    pub fn close_position(&mut self, owner: &str, exit_price: u128) -> CoreResult<i128> {
        let pos = self.positions.remove(owner).ok_or(ErrorCode::UnknownOrder)?;
        let funding_payment = settle_funding_payment(pos.size, pos.side == PositionSide::Long, self.funding_index, pos.funding_index_at_entry)?;
        let price_delta: i128 = exit_price.cast::<i128>()?.safe_sub(pos.entry_price.cast()?)?;
        let price_pnl = SignedAmount::new(pos.size, pos.side.sign()).to_i128()?.safe_mul(price_delta)?;
        let pnl = price_pnl.safe_sub(funding_payment)?.safe_add(pos.realized_pnl.to_i128()?)?;
        pos.margin.cast::<i128>()?.safe_add(pnl)
    }

    /// `mtm_step` (spec section 4.9): given the keeper-supplied oracle
    /// price, realizes `size * (p - entry_price) * sign` for the move
    /// since the last mark and folds it into the running `realized_pnl`
    /// accumulator -- each pass adds to the total rather than replacing
    /// it, so P&L earned before the latest call is never dropped. The
    /// health check compares margin against the *cumulative* realized
    /// P&L, not just this step's delta, since that is what `close_position`
    /// and `liquidate_position` ultimately pay out.
    pub fn mtm_step(&mut self, oracle_price: u128) -> CoreResult<Vec<String>> {
        let mut liquidatable = Vec::new();
        for pos in self.positions.values_mut() {
            let signed_size = SignedAmount::new(pos.size, pos.side.sign()).to_i128()?;
            let price_delta: i128 = oracle_price.cast::<i128>()?.safe_sub(pos.entry_price.cast()?)?;
            let step_pnl = signed_size.safe_mul(price_delta)?;
            pos.realized_pnl = pos.realized_pnl.add(SignedAmount::from_i128(step_pnl)?)?;
            pos.entry_price = oracle_price;

            let notional = self.contract_size.safe_mul(pos.size)?.safe_mul(oracle_price)?;
            let maintenance = mul_bps_floor(notional, self.margin.maintenance_margin_bps)?;
            let effective_margin = pos.margin.cast::<i128>()?.safe_add(pos.realized_pnl.to_i128()?)?;
            let unhealthy = effective_margin < 0 || effective_margin.cast::<u128>()? < maintenance;
            pos.flagged_for_liquidation = unhealthy;
            if unhealthy {
                liquidatable.push(pos.owner.clone());
            }
        }
        Ok(liquidatable)
    }

    /// Refreshes `mark_twap` from a new mark sample, per the teacher's
    /// `calculate_twap` cadence -- called once per `mtm_step`/`funding_step`
    /// tick before the mark itself is used.
    pub fn update_mark(&mut self, clock: Clock, mark_price: u128) -> CoreResult<()> {
        self.mark_twap = calculate_twap(mark_price, clock.now_ms, self.mark_twap.max(mark_price), self.last_twap_update_ms, TWAP_PERIOD_MS)?;
        self.mark_price = mark_price;
        self.last_twap_update_ms = clock.now_ms;
        Ok(())
    }

    /// `funding_step` (perps only, spec section 4.9): accrues
    /// `funding_index` once per elapsed `FUNDING_INTERVAL`, clamped to the
    /// market's configured band.
    pub fn funding_step(&mut self, clock: Clock, oracle_price: u128) -> CoreResult<()> {
        if !self.is_perp() {
            return Err(ErrorCode::AlreadySettled);
        }
        let dt_ms = clock.now_ms.saturating_sub(self.last_funding_ms);
        if dt_ms < FUNDING_INTERVAL_MS {
            return Ok(());
        }
        let premium_bps = clamped_premium_bps(self.mark_twap.max(self.mark_price), oracle_price, self.margin.max_funding_band_bps)?;
        self.funding_index = accrue_funding_index(self.funding_index, premium_bps, dt_ms)?;
        self.last_funding_ms = clock.now_ms;
        Ok(())
    }

    /// `settle_expiry` (futures only, spec section 4.9): at or after
    /// `expiry_ms`, records the TWAP-derived settlement price once, within
    /// `SETTLEMENT_WINDOW_MS` of expiry.
    pub fn settle_expiry(&mut self, clock: Clock) -> CoreResult<u128> {
        let expiry_ms = self.expiry_ms.ok_or(ErrorCode::AlreadySettled)?;
        if self.settlement_price.is_some() {
            return Err(ErrorCode::AlreadySettled);
        }
        if clock.now_ms < expiry_ms {
            return Err(ErrorCode::BadExpiry);
        }
        if clock.now_ms > expiry_ms.saturating_add(SETTLEMENT_WINDOW_MS) {
            return Err(ErrorCode::BadExpiry);
        }
        let settlement_price = self.mark_twap.max(self.mark_price);
        self.settlement_price = Some(settlement_price);
        Ok(settlement_price)
    }

    /// After `settle_expiry`, releases `margin + pnl` for every remaining
    /// position finalized against the recorded settlement price (spec
    /// section 4.9: "margin + P&L is released on claim").
    pub fn claim_settlement(&mut self, owner: &str) -> CoreResult<i128> {
        let settlement_price = self.settlement_price.ok_or(ErrorCode::NotCancelable)?;
        self.close_position(owner, settlement_price)
    }

    /// Liquidates up to `close_size` of a position `mtm_step` has already
    /// flagged, at the given mark price. Reduces size and margin
    /// proportionally and releases the closed slice's margin + P&L; any
    /// cap on `close_size` (spec section 4.8's default 50% max share per
    /// call) is the caller's (`LiquidationDispatcher`'s) responsibility.
    pub fn liquidate_position(&mut self, owner: &str, close_size: u128, mark_price: u128) -> CoreResult<(u128, i128)> {
        let pos = self.positions.get_mut(owner).ok_or(ErrorCode::UnknownOrder)?;
        if !pos.flagged_for_liquidation {
            return Err(ErrorCode::VaultHealthy);
        }
        let close_size = close_size.min(pos.size);
        if close_size == 0 {
            return Ok((0, 0));
        }

        let signed_size = SignedAmount::new(close_size, pos.side.sign()).to_i128()?;
        let price_delta: i128 = mark_price.cast::<i128>()?.safe_sub(pos.entry_price.cast()?)?;
        let price_pnl = signed_size.safe_mul(price_delta)?;
        // `realized_pnl` is accumulated across every prior `mtm_step`; a
        // partial close only settles the closed slice's share of it, same
        // as the margin slice below.
        let realized_slice = pos
            .realized_pnl
            .to_i128()?
            .safe_mul(close_size.cast()?)?
            .safe_div(pos.size.cast()?)?;
        let pnl = price_pnl.safe_add(realized_slice)?;
        let margin_slice = pos.margin.safe_mul(close_size)?.safe_div(pos.size)?;
        let released = margin_slice.cast::<i128>()?.safe_add(pnl)?;

        pos.margin = pos.margin.safe_sub(margin_slice)?;
        pos.realized_pnl = SignedAmount::from_i128(pos.realized_pnl.to_i128()?.safe_sub(realized_slice)?)?;
        pos.size = pos.size.safe_sub(close_size)?;
        if pos.size == 0 {
            self.positions.remove(owner);
        }

        Ok((close_size, released))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(now_ms: u64, expiry_ms: Option<u64>) -> DerivativesMarket {
        let margin = MarginParams { initial_margin_bps: 1_000, maintenance_margin_bps: 500, max_funding_band_bps: 500 };
        DerivativesMarket::new("BTC-PERP", 1, 1, expiry_ms, margin, now_ms)
    }

    #[test]
    fn open_requires_initial_margin() {
        let mut m = market(0, None);
        // notional = 1 * 100 * 1 = 100; 10% initial margin = 10.
        assert_eq!(m.open_position(Clock::at(0), "alice", PositionSide::Long, 1, 100, 5), Err(ErrorCode::InsufficientEscrow));
        assert!(m.open_position(Clock::at(0), "alice", PositionSide::Long, 1, 100, 10).is_ok());
    }

    #[test]
    fn mtm_flags_under_maintenance() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        // price crashes; long loses (100-40)*10 = 600, wiping the 50 margin.
        let flagged = m.mtm_step(40).unwrap();
        assert_eq!(flagged, vec!["alice".to_string()]);
    }

    #[test]
    fn funding_step_noop_before_interval_elapses() {
        let mut m = market(0, None);
        m.update_mark(Clock::at(0), 110).unwrap();
        m.funding_step(Clock::at(1_000), 100).unwrap();
        assert_eq!(m.funding_index, 0);
    }

    #[test]
    fn funding_step_accrues_after_interval() {
        let mut m = market(0, None);
        m.update_mark(Clock::at(0), 110).unwrap();
        m.funding_step(Clock::at(FUNDING_INTERVAL_MS), 100).unwrap();
        assert!(m.funding_index > 0);
    }

    #[test]
    fn settle_expiry_requires_expiry_reached() {
        let mut m = market(0, Some(1_000));
        m.update_mark(Clock::at(0), 100).unwrap();
        assert_eq!(m.settle_expiry(Clock::at(500)), Err(ErrorCode::BadExpiry));
        assert!(m.settle_expiry(Clock::at(1_000)).is_ok());
        assert_eq!(m.settle_expiry(Clock::at(1_000)), Err(ErrorCode::AlreadySettled));
    }

    #[test]
    fn liquidate_position_rejects_unflagged() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        assert_eq!(m.liquidate_position("alice", 5, 100), Err(ErrorCode::VaultHealthy));
    }

    #[test]
    fn liquidate_position_partial_close_reduces_size() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        m.mtm_step(40).unwrap();
        let (closed, _released) = m.liquidate_position("alice", 5, 40).unwrap();
        assert_eq!(closed, 5);
        assert_eq!(m.position("alice").unwrap().size, 5);
    }

    #[test]
    fn close_position_releases_margin_plus_pnl() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        let payout = m.close_position("alice", 110).unwrap();
        // pnl = 10 * (110-100) = 100; payout = 50 + 100 = 150.
        assert_eq!(payout, 150);
    }

    #[test]
    fn mtm_step_accumulates_pnl_across_passes() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        m.mtm_step(110).unwrap(); // +100, entry now 110
        m.mtm_step(120).unwrap(); // +100 more, entry now 120; total realized = 200
        let payout = m.close_position("alice", 120).unwrap();
        // price_pnl since last mark (120->120) is 0; realized carries the full +200.
        assert_eq!(payout, 250);
    }

    #[test]
    fn liquidate_position_pays_out_accumulated_pnl_share() {
        let mut m = market(0, None);
        m.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        m.mtm_step(110).unwrap(); // +100, entry now 110
        let flagged = m.mtm_step(40).unwrap(); // -700 more, entry now 40; total realized = -600, flags unhealthy
        assert_eq!(flagged, vec!["alice".to_string()]);
        let (closed, released) = m.liquidate_position("alice", 5, 40).unwrap();
        assert_eq!(closed, 5);
        // half the position: margin slice 25, realized slice -300, price move since last mark is 0.
        assert_eq!(released, -275);
        let remaining = m.position("alice").unwrap();
        assert_eq!(remaining.size, 5);
        assert_eq!(remaining.realized_pnl.to_i128().unwrap(), -300);
    }
}
