//! The shared event enum emitted by every component (spec section 6),
//! consumed by external indexers. Grounded on the teacher's pattern of a
//! plain serializable struct per Anchor `#[event]` -- here collapsed into
//! one enum per spec's single event table, since this crate has no
//! on-chain log sink of its own and simply hands events back to the host.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum CoreEvent {
    OrderbookOrderPlaced {
        order_id: u64,
        symbol: String,
        side: Side,
        price: u128,
        size: u128,
        remaining: u128,
        owner: String,
        created_at_ms: u64,
        expiry_ms: u64,
    },
    OrderbookOrderCancelled {
        order_id: u64,
    },
    OrderExpiredSwept {
        order_id: u64,
    },
    OrderMatched {
        buy_order_id: u64,
        sell_order_id: u64,
        price: u128,
        size: u128,
        ts: u64,
    },
    BondPosted {
        order_id: u64,
        amount: u128,
        ts: u64,
    },
    BondRefunded {
        order_id: u64,
        amount: u128,
        ts: u64,
    },
    BondSlashed {
        order_id: u64,
        amount: u128,
        ts: u64,
    },
    FeeCollected {
        amount: u128,
        payer: String,
        market: String,
        reason: String,
        ts: u64,
    },
    /// Rebate amount is always 0 under current policy -- spec section 9's
    /// reserved extension point. Emitters must not emit a nonzero amount.
    MakerRebatePaid {
        amount: u128,
        taker: String,
        maker: String,
        market: String,
        ts: u64,
    },
    MakerClaimed {
        order_id: u64,
        market: String,
        maker: String,
        amount: u128,
        ts: u64,
    },
    VaultCreated {
        vault_id: u64,
        owner: String,
        ts: u64,
    },
    CollateralDeposited {
        vault_id: u64,
        amount: u128,
        actor: String,
        ts: u64,
    },
    CollateralWithdrawn {
        vault_id: u64,
        amount: u128,
        actor: String,
        ts: u64,
    },
    SyntheticMinted {
        vault_id: u64,
        symbol: String,
        amount: u128,
        ts: u64,
    },
    SyntheticBurned {
        vault_id: u64,
        symbol: String,
        amount: u128,
        ts: u64,
    },
    StabilityAccrued {
        vault_id: u64,
        symbol: String,
        delta_units: u128,
        from_ms: u64,
        to_ms: u64,
    },
    LiquidationExecuted {
        vault_id: u64,
        liquidator: String,
        liquidated_amount: u128,
        collateral_seized: u128,
        penalty: u128,
        symbol: String,
        ts: u64,
    },
    AssetSupplied {
        user: String,
        asset: String,
        amount: u128,
        ts: u64,
    },
    AssetWithdrawn {
        user: String,
        asset: String,
        amount: u128,
        ts: u64,
    },
    AssetBorrowed {
        user: String,
        asset: String,
        amount: u128,
        ts: u64,
    },
    DebtRepaid {
        user: String,
        asset: String,
        amount: u128,
        ts: u64,
    },
    RateUpdated {
        asset: String,
        utilization_bps: u64,
        borrow_rate_bps: u64,
        supply_rate_bps: u64,
        borrow_index: u128,
        supply_index: u128,
        ts: u64,
    },
    InterestAccrued {
        asset: String,
        delta_borrows: u128,
        delta_reserves: u128,
        ts: u64,
    },
    ParamsUpdated {
        updater: String,
        ts: u64,
    },
    EmergencyPauseToggled {
        new_state: bool,
        by: String,
        ts: u64,
    },
}
