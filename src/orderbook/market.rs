//! Market (spec section 3/4.5): the per-symbol CLOB. The hardest
//! subsystem in the core -- price-time priority matching, maker bonds,
//! partial fills, cancellation, expiry GC and per-fill maker escrow
//! claims, all as one serialized critical section per spec section 5.
//!
//! Grounded on the teacher's `state/market.rs` (there: a single
//! Phoenix-backed spot market wrapper with no in-program book; here the
//! book itself lives in this crate, since the spec requires the matching
//! engine to be part of the core rather than delegated to an external DEX).

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, VecDeque};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreResult, ErrorCode};
use crate::events::{CoreEvent, Side};
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::{mul_bps_floor, mul_bps_half_even};
use crate::orderbook::order::{Order, OrderStatus, TakerMode};

const MAX_CANCELS_PER_WINDOW: usize = 20;
const RATE_LIMIT_WINDOW_MS: u64 = 10_000;
const BOND_SLASH_BPS: u64 = 2_000;

/// One fill recorded during `place_order`'s crossing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Fill {
    pub buy_order_id: u64,
    pub sell_order_id: u64,
    pub price: u128,
    pub size: u128,
}

#[derive(Debug, Clone)]
pub struct PlaceOrderOutcome {
    pub order_id: u64,
    pub fills: Vec<Fill>,
    pub taker_fee_collected: u128,
    pub events: Vec<CoreEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Market {
    pub symbol: String,
    pub tick: u128,
    pub lot: u128,
    pub min_size: u128,
    pub bond_bps: u64,
    pub paused: bool,

    /// Price-level queues are a derived index over `orders`, not
    /// independent state; a host restoring a snapshot must replay `orders`
    /// back through `place_order` rather than expect these to round-trip.
    #[serde(skip)]
    #[borsh_skip]
    bids: BTreeMap<Reverse<u128>, VecDeque<u64>>,
    #[serde(skip)]
    #[borsh_skip]
    asks: BTreeMap<u128, VecDeque<u64>>,
    orders: HashMap<u64, Order>,
    index: HashMap<u64, Side>,

    pub last_match_price: Option<u128>,
    next_order_id: u64,
    next_sequence: u64,

    /// Per-owner recent cancel timestamps, for the rate-limit-triggered
    /// bond slash spec section 4.5 allows the admin to configure.
    #[serde(skip)]
    #[borsh_skip]
    recent_cancels: HashMap<String, VecDeque<u64>>,
}

impl Market {
    pub fn new(symbol: impl Into<String>, tick: u128, lot: u128, min_size: u128, bond_bps: u64) -> Self {
        Market {
            symbol: symbol.into(),
            tick,
            lot,
            min_size,
            bond_bps,
            paused: false,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            orders: HashMap::new(),
            index: HashMap::new(),
            last_match_price: None,
            next_order_id: 1,
            next_sequence: 1,
            recent_cancels: HashMap::new(),
        }
    }

    pub fn order(&self, id: u64) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Invariant 1 of spec section 8: at rest, best bid < best ask.
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => b >= a,
            _ => false,
        }
    }

    pub fn best_bid(&self) -> Option<u128> {
        self.bids.keys().next().map(|Reverse(p)| *p)
    }

    pub fn best_ask(&self) -> Option<u128> {
        self.asks.keys().next().copied()
    }

    fn required_bond(&self, remaining: u128, price: u128) -> CoreResult<u128> {
        let notional = remaining.safe_mul(price)?;
        mul_bps_floor(notional, self.bond_bps)
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    fn next_seq(&mut self) -> u64 {
        let s = self.next_sequence;
        self.next_sequence += 1;
        s
    }

    fn book_side_mut(&mut self, side: Side) -> SideMut<'_> {
        match side {
            Side::Bid => SideMut::Bids(&mut self.bids),
            Side::Ask => SideMut::Asks(&mut self.asks),
        }
    }

    fn insert_resting(&mut self, order_id: u64) {
        let side = self.orders.get(&order_id).expect("order exists").side;
        let price = self.orders.get(&order_id).expect("order exists").price;
        match self.book_side_mut(side) {
            SideMut::Bids(map) => map.entry(Reverse(price)).or_default().push_back(order_id),
            SideMut::Asks(map) => map.entry(price).or_default().push_back(order_id),
        }
        self.index.insert(order_id, side);
    }

    fn remove_resting(&mut self, order_id: u64) {
        let Some(side) = self.index.remove(&order_id) else { return };
        let Some(order) = self.orders.get(&order_id) else { return };
        let price = order.price;
        match side {
            Side::Bid => {
                if let Some(q) = self.bids.get_mut(&Reverse(price)) {
                    q.retain(|id| *id != order_id);
                    if q.is_empty() {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Ask => {
                if let Some(q) = self.asks.get_mut(&price) {
                    q.retain(|id| *id != order_id);
                    if q.is_empty() {
                        self.asks.remove(&price);
                    }
                }
            }
        }
    }

    /// `place_order` per spec section 4.5's full contract.
    #[allow(clippy::too_many_arguments)]
    pub fn place_order(
        &mut self,
        clock: Clock,
        owner: &str,
        side: Side,
        price: u128,
        size: u128,
        expiry_ms: u64,
        taker_mode: TakerMode,
        escrowed: u128,
        bond_provided: u128,
        taker_fee_bps: u64,
    ) -> CoreResult<PlaceOrderOutcome> {
        if self.paused {
            return Err(ErrorCode::MarketPaused);
        }
        if price == 0 || price >= (1u128 << 63) {
            return Err(ErrorCode::BadPrice);
        }
        if price % self.tick != 0 {
            return Err(ErrorCode::TickViolation);
        }
        if size % self.lot != 0 {
            return Err(ErrorCode::LotViolation);
        }
        if size < self.min_size {
            return Err(ErrorCode::BelowMinSize);
        }
        if expiry_ms <= clock.now_ms {
            return Err(ErrorCode::BadExpiry);
        }

        let required_bond = self.required_bond(size, price)?;
        if bond_provided < required_bond {
            return Err(ErrorCode::InsufficientEscrow);
        }

        // Escrow precondition: base for ask, quote for bid (spec section
        // 4.5). The host has already reserved `escrowed`; we just check
        // it covers the worst case (full resting notional) up front.
        let required_escrow = match side {
            Side::Ask => size,
            Side::Bid => size.safe_mul(price)?,
        };
        if escrowed < required_escrow {
            return Err(ErrorCode::InsufficientEscrow);
        }

        let order_id = self.next_id();
        let sequence = self.next_seq();
        let mut incoming = Order {
            id: order_id,
            side,
            price,
            size,
            remaining: size,
            owner: owner.to_string(),
            created_ms: clock.now_ms,
            expiry_ms,
            bond: bond_provided,
            status: OrderStatus::Open,
            sequence,
            maker_escrow: 0,
        };

        let mut events = vec![CoreEvent::OrderbookOrderPlaced {
            order_id,
            symbol: self.symbol.clone(),
            side,
            price,
            size,
            remaining: size,
            owner: owner.to_string(),
            created_at_ms: clock.now_ms,
            expiry_ms,
        }, CoreEvent::BondPosted { order_id, amount: bond_provided, ts: clock.now_ms }];

        let mut fills = Vec::new();
        let mut taker_fee_collected = 0u128;

        loop {
            if incoming.remaining == 0 {
                break;
            }
            let Some(counter_price) = self.best_counter_price(side) else { break };
            if !Self::crosses(side, price, counter_price) {
                break;
            }

            // Earliest-sequence resting order at that price, skipping any
            // whose wall-clock expiry has passed (spec section 4.5
            // invariant 4: expired orders must not match).
            let Some(&resting_id) = self.queue_at(side.opposite(), counter_price).and_then(|q| q.front()) else {
                break;
            };
            let resting_expired = self.orders.get(&resting_id).map(|o| o.expiry_ms <= clock.now_ms).unwrap_or(true);
            if resting_expired {
                // Route through GC: pop it out without matching and retry.
                self.expire_one(resting_id, clock.now_ms, &mut events);
                continue;
            }

            let resting = self.orders.get(&resting_id).expect("indexed order exists");
            let fill_qty = incoming.remaining.min(resting.remaining);
            let trade_price = resting.price;

            incoming.remaining -= fill_qty;
            let resting_owner = resting.owner.clone();

            let resting_mut = self.orders.get_mut(&resting_id).expect("indexed order exists");
            resting_mut.remaining -= fill_qty;
            let resting_done = resting_mut.remaining == 0;
            resting_mut.status = if resting_done { OrderStatus::Filled } else { OrderStatus::Partial };

            // Taker fee on the fill notional, credited to the vault by the
            // caller (we return the total; the caller owns the FeeVault).
            let fill_notional = fill_qty.safe_mul(trade_price)?;
            let fee = mul_bps_half_even(fill_notional, taker_fee_bps)?;
            taker_fee_collected = taker_fee_collected.safe_add(fee)?;

            // Maker proceeds go into the resting order's own escrow,
            // claimed later via `claim_maker_fills` (spec section 4.5).
            let resting_mut = self.orders.get_mut(&resting_id).expect("indexed order exists");
            resting_mut.maker_escrow = resting_mut.maker_escrow.safe_add(fill_notional)?;

            let (buy_id, sell_id) = match side {
                Side::Bid => (order_id, resting_id),
                Side::Ask => (resting_id, order_id),
            };
            fills.push(Fill { buy_order_id: buy_id, sell_order_id: sell_id, price: trade_price, size: fill_qty });
            events.push(CoreEvent::OrderMatched { buy_order_id: buy_id, sell_order_id: sell_id, price: trade_price, size: fill_qty, ts: clock.now_ms });
            events.push(CoreEvent::MakerRebatePaid { amount: 0, taker: owner.to_string(), maker: resting_owner, market: self.symbol.clone(), ts: clock.now_ms });

            self.last_match_price = Some(trade_price);

            if resting_done {
                self.remove_resting(resting_id);
            }
        }

        if !fills.is_empty() {
            events.push(CoreEvent::FeeCollected {
                amount: taker_fee_collected,
                payer: owner.to_string(),
                market: self.symbol.clone(),
                reason: "taker".to_string(),
                ts: clock.now_ms,
            });
        }

        incoming.status = if incoming.remaining == 0 {
            OrderStatus::Filled
        } else if incoming.remaining < incoming.size {
            OrderStatus::Partial
        } else {
            OrderStatus::Open
        };

        let resting_remaining = incoming.remaining;
        let final_status = incoming.status;
        self.orders.insert(order_id, incoming);

        if resting_remaining > 0 {
            if taker_mode == TakerMode::Ioc {
                // Discard the remainder; refund handled by caller via bond
                // return since the order never rests.
                let order = self.orders.get_mut(&order_id).expect("just inserted");
                order.status = OrderStatus::Canceled;
                order.remaining = 0;
                events.push(CoreEvent::BondRefunded { order_id, amount: bond_provided, ts: clock.now_ms });
            } else {
                self.insert_resting(order_id);
            }
        } else if final_status == OrderStatus::Filled {
            events.push(CoreEvent::BondRefunded { order_id, amount: bond_provided, ts: clock.now_ms });
        }

        Ok(PlaceOrderOutcome { order_id, fills, taker_fee_collected, events })
    }

    fn best_counter_price(&self, side: Side) -> Option<u128> {
        match side {
            Side::Bid => self.best_ask(),
            Side::Ask => self.best_bid(),
        }
    }

    fn crosses(side: Side, incoming_price: u128, counter_price: u128) -> bool {
        match side {
            Side::Bid => incoming_price >= counter_price,
            Side::Ask => incoming_price <= counter_price,
        }
    }

    fn queue_at(&self, side: Side, price: u128) -> Option<&VecDeque<u64>> {
        match side {
            Side::Bid => self.bids.get(&Reverse(price)),
            Side::Ask => self.asks.get(&price),
        }
    }

    fn expire_one(&mut self, order_id: u64, now_ms: u64, events: &mut Vec<CoreEvent>) {
        self.remove_resting(order_id);
        if let Some(order) = self.orders.get_mut(&order_id) {
            let bond = order.bond;
            order.status = OrderStatus::Expired;
            order.remaining = 0;
            events.push(CoreEvent::OrderExpiredSwept { order_id });
            events.push(CoreEvent::BondRefunded { order_id, amount: bond, ts: now_ms });
        }
    }

    /// `cancel_order(id, caller)` per spec section 4.5.
    pub fn cancel_order(&mut self, clock: Clock, order_id: u64, caller: &str) -> CoreResult<(u128, u128, Vec<CoreEvent>)> {
        let order = self.orders.get(&order_id).ok_or(ErrorCode::UnknownOrder)?;
        if order.owner != caller {
            return Err(ErrorCode::NotOwner);
        }
        if !order.is_cancelable() {
            return Err(ErrorCode::NotCancelable);
        }

        let bond = order.bond;
        let refunded_escrow = order.remaining;

        let slash = self.apply_rate_limit_and_maybe_slash(caller, clock.now_ms, bond);

        self.remove_resting(order_id);
        let order = self.orders.get_mut(&order_id).expect("just looked up");
        order.status = OrderStatus::Canceled;
        order.remaining = 0;

        let mut events = vec![CoreEvent::OrderbookOrderCancelled { order_id }];
        let refund = bond.saturating_sub(slash);
        if slash > 0 {
            events.push(CoreEvent::BondSlashed { order_id, amount: slash, ts: clock.now_ms });
        }
        if refund > 0 {
            events.push(CoreEvent::BondRefunded { order_id, amount: refund, ts: clock.now_ms });
        }

        Ok((refunded_escrow, refund, events))
    }

    fn apply_rate_limit_and_maybe_slash(&mut self, owner: &str, now_ms: u64, bond: u128) -> u128 {
        let window_start = now_ms.saturating_sub(RATE_LIMIT_WINDOW_MS);
        let entry = self.recent_cancels.entry(owner.to_string()).or_default();
        while entry.front().map(|t| *t < window_start).unwrap_or(false) {
            entry.pop_front();
        }
        entry.push_back(now_ms);
        if entry.len() > MAX_CANCELS_PER_WINDOW {
            mul_bps_floor(bond, BOND_SLASH_BPS).unwrap_or(0)
        } else {
            0
        }
    }

    /// `modify_order(id, new_qty, now)` per spec section 4.5 and the Open
    /// Question in spec section 9: observes post-fill state, rejects
    /// `InsufficientRemaining` if `new_qty > current_remaining`. Preserves
    /// id/priority only when downsizing.
    pub fn modify_order(&mut self, clock: Clock, order_id: u64, new_qty: u128, caller: &str) -> CoreResult<Vec<CoreEvent>> {
        let order = self.orders.get(&order_id).ok_or(ErrorCode::UnknownOrder)?;
        if order.owner != caller {
            return Err(ErrorCode::NotOwner);
        }
        if !order.is_cancelable() {
            return Err(ErrorCode::NotCancelable);
        }
        if new_qty > order.remaining {
            return Err(ErrorCode::InsufficientRemaining);
        }
        if new_qty % self.lot != 0 {
            return Err(ErrorCode::LotViolation);
        }
        if new_qty < self.min_size && new_qty != 0 {
            return Err(ErrorCode::BelowMinSize);
        }

        let price = order.price;
        let required_bond = self.required_bond(new_qty, price)?;

        if new_qty < order.remaining {
            // Downsize keeps time priority: edit remaining in place.
            let order = self.orders.get_mut(&order_id).expect("just looked up");
            let refund_bond = order.bond.saturating_sub(required_bond);
            order.remaining = new_qty;
            order.bond = required_bond;
            order.status = if new_qty == 0 { OrderStatus::Canceled } else { OrderStatus::Partial };
            let mut events = Vec::new();
            if new_qty == 0 {
                self.remove_resting(order_id);
                events.push(CoreEvent::OrderbookOrderCancelled { order_id });
            }
            if refund_bond > 0 {
                events.push(CoreEvent::BondRefunded { order_id, amount: refund_bond, ts: clock.now_ms });
            }
            Ok(events)
        } else {
            // new_qty == remaining: no-op, bond unchanged.
            Ok(Vec::new())
        }
    }

    /// `claim_maker_fills(id)`: transfers accumulated per-order maker
    /// escrow to the owner. Idempotent on zero balance; callable whether
    /// the order is still Open/Partial or fully Filled.
    pub fn claim_maker_fills(&mut self, clock: Clock, order_id: u64, caller: &str) -> CoreResult<(u128, Vec<CoreEvent>)> {
        let order = self.orders.get_mut(&order_id).ok_or(ErrorCode::UnknownOrder)?;
        if order.owner != caller {
            return Err(ErrorCode::NotOwner);
        }
        let amount = order.maker_escrow;
        order.maker_escrow = 0;
        let events = if amount > 0 {
            vec![CoreEvent::MakerClaimed { order_id, market: self.symbol.clone(), maker: caller.to_string(), amount, ts: clock.now_ms }]
        } else {
            Vec::new()
        };
        Ok((amount, events))
    }

    /// `gc_step(market, now, max_removals)`: sweeps up to `max_removals`
    /// expired orders, refunding escrow and bonds.
    pub fn gc_step(&mut self, clock: Clock, max_removals: usize) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        let expired_ids: Vec<u64> = self
            .orders
            .values()
            .filter(|o| !o.status.is_terminal() && o.expiry_ms <= clock.now_ms)
            .take(max_removals)
            .map(|o| o.id)
            .collect();
        for id in expired_ids {
            self.expire_one(id, clock.now_ms, &mut events);
        }
        events
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

trait SideExt {
    fn opposite(self) -> Side;
}

impl SideExt for Side {
    fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

enum SideMut<'a> {
    Bids(&'a mut BTreeMap<Reverse<u128>, VecDeque<u64>>),
    Asks(&'a mut BTreeMap<u128, VecDeque<u64>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market() -> Market {
        Market::new("BTC/USDC", 1, 1, 1, 10)
    }

    #[test]
    fn maker_then_taker_cross_scenario_1() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        let outcome = m.place_order(clock, "bob", Side::Bid, 100, 3, 10_000, TakerMode::Gtc, 300, 1, 10).unwrap();
        assert_eq!(outcome.fills.len(), 1);
        assert_eq!(outcome.fills[0].size, 3);
        assert_eq!(outcome.fills[0].price, 100);
        assert_eq!(m.last_match_price, Some(100));
        let alice_order = m.order(1).unwrap();
        assert_eq!(alice_order.remaining, 2);
    }

    #[test]
    fn price_time_priority_scenario_2() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 4, 10_000, TakerMode::Gtc, 4, 1, 0).unwrap();
        m.place_order(clock, "carol", Side::Ask, 100, 4, 10_000, TakerMode::Gtc, 4, 1, 0).unwrap();
        let outcome = m.place_order(clock, "bob", Side::Bid, 100, 5, 10_000, TakerMode::Gtc, 500, 1, 0).unwrap();
        assert_eq!(outcome.fills.len(), 2);
        assert_eq!(outcome.fills[0].sell_order_id, 1);
        assert_eq!(outcome.fills[0].size, 4);
        assert_eq!(outcome.fills[1].sell_order_id, 2);
        assert_eq!(outcome.fills[1].size, 1);
        let carol_order = m.order(2).unwrap();
        assert_eq!(carol_order.remaining, 3);
    }

    #[test]
    fn price_improvement_for_taker_scenario_3() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 98, 2, 10_000, TakerMode::Gtc, 2, 1, 0).unwrap();
        m.place_order(clock, "carol", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        let outcome = m.place_order(clock, "bob", Side::Bid, 100, 5, 10_000, TakerMode::Gtc, 500, 1, 0).unwrap();
        assert_eq!(outcome.fills[0].price, 98);
        assert_eq!(outcome.fills[0].size, 2);
        assert_eq!(outcome.fills[1].price, 100);
        assert_eq!(outcome.fills[1].size, 3);
    }

    #[test]
    fn book_never_crossed_at_rest() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        m.place_order(clock, "bob", Side::Bid, 90, 5, 10_000, TakerMode::Gtc, 450, 1, 0).unwrap();
        assert!(!m.is_crossed());
    }

    #[test]
    fn ioc_discards_unfilled_remainder() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 2, 10_000, TakerMode::Gtc, 2, 1, 0).unwrap();
        let outcome = m.place_order(clock, "bob", Side::Bid, 100, 5, 10_000, TakerMode::Ioc, 500, 1, 0).unwrap();
        assert_eq!(outcome.fills[0].size, 2);
        let bob_order = m.order(outcome.order_id).unwrap();
        assert_eq!(bob_order.remaining, 0);
        assert_eq!(bob_order.status, OrderStatus::Canceled);
        assert!(m.best_bid().is_none());
    }

    #[test]
    fn expiry_gc_scenario_6() {
        let mut m = market();
        let t0 = Clock::at(1_000);
        m.place_order(t0, "alice", Side::Ask, 100, 1, 2_000, TakerMode::Gtc, 1, 1, 0).unwrap();
        m.place_order(t0, "bob", Side::Ask, 101, 1, 2_000, TakerMode::Gtc, 1, 1, 0).unwrap();
        m.place_order(t0, "carol", Side::Ask, 102, 1, 2_000, TakerMode::Gtc, 1, 1, 0).unwrap();
        let later = Clock::at(3_000);
        let events = m.gc_step(later, 10);
        let swept = events.iter().filter(|e| matches!(e, CoreEvent::OrderExpiredSwept { .. })).count();
        assert_eq!(swept, 3);
        assert!(m.best_ask().is_none());
    }

    #[test]
    fn cancel_refunds_bond_and_rejects_terminal() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        let (escrow, bond, _events) = m.cancel_order(clock, 1, "alice").unwrap();
        assert_eq!(escrow, 5);
        assert_eq!(bond, 1);
        assert!(m.cancel_order(clock, 1, "alice").is_err());
    }

    #[test]
    fn modify_rejects_increase_past_remaining() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        assert_eq!(m.modify_order(clock, 1, 6, "alice"), Err(ErrorCode::InsufficientRemaining));
        assert!(m.modify_order(clock, 1, 2, "alice").is_ok());
        assert_eq!(m.order(1).unwrap().remaining, 2);
    }

    #[test]
    fn claim_maker_fills_is_idempotent() {
        let mut m = market();
        let clock = Clock::at(0);
        m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).unwrap();
        m.place_order(clock, "bob", Side::Bid, 100, 3, 10_000, TakerMode::Gtc, 300, 1, 10).unwrap();
        let (amount, _events) = m.claim_maker_fills(clock, 1, "alice").unwrap();
        assert_eq!(amount, 300);
        let (amount2, events2) = m.claim_maker_fills(clock, 1, "alice").unwrap();
        assert_eq!(amount2, 0);
        assert!(events2.is_empty());
    }

    #[test]
    fn below_min_size_rejected() {
        let mut m = Market::new("BTC/USDC", 1, 1, 5, 10);
        let clock = Clock::at(0);
        assert_eq!(
            m.place_order(clock, "alice", Side::Ask, 100, 4, 10_000, TakerMode::Gtc, 4, 1, 0),
            Err(ErrorCode::BelowMinSize)
        );
        assert!(m.place_order(clock, "alice", Side::Ask, 100, 5, 10_000, TakerMode::Gtc, 5, 1, 0).is_ok());
    }
}
