//! OrderBook (spec section 4.5): per-market CLOB with price-time priority
//! matching, maker bonds, partial fills, cancellation, expiry GC and
//! per-fill maker escrow claims. The matching algorithm lives directly on
//! [`Market`] (see `market.rs`) rather than a separate free-function
//! module -- the teacher's own Phoenix integration keeps order placement
//! and matching on one object (`state/market.rs`) and we follow that.

pub mod market;
pub mod order;

pub use market::{Fill, Market, PlaceOrderOutcome};
pub use order::{Order, OrderStatus, TakerMode};
