//! Error taxonomy for the Unxversal core.
//!
//! Every fallible entry point returns [`CoreResult`]. Variants are grouped the
//! way spec section 7 groups them (validation, authorization, state, solvency,
//! oracle, arithmetic) even though they live in one flat enum -- a caller that
//! wants to dispatch on a group can match sub-slices of variants.

use thiserror::Error;

pub type CoreResult<T = ()> = std::result::Result<T, ErrorCode>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // -- Validation --
    #[error("price is not a multiple of the market tick size")]
    TickViolation,
    #[error("size is not a multiple of the market lot size")]
    LotViolation,
    #[error("order size is below the market minimum")]
    BelowMinSize,
    #[error("expiry must be strictly in the future")]
    BadExpiry,
    #[error("price must be in (0, 2^63)")]
    BadPrice,
    #[error("symbol is paused")]
    SymbolPaused,

    // -- Authorization --
    #[error("caller does not own this object")]
    NotOwner,
    #[error("caller does not hold the admin capability")]
    NotAdmin,
    #[error("caller is not an eligible liquidator")]
    NotLiquidator,

    // -- State --
    #[error("unknown order id")]
    UnknownOrder,
    #[error("unknown symbol")]
    UnknownSymbol,
    #[error("market is paused")]
    MarketPaused,
    #[error("order is in a terminal state and cannot be cancelled")]
    NotCancelable,
    #[error("vault/position is healthy; liquidation refused")]
    VaultHealthy,
    #[error("market has already settled")]
    AlreadySettled,
    #[error("modify would require more than the order's current remaining size")]
    InsufficientRemaining,

    // -- Solvency --
    #[error("caller has not escrowed sufficient balance")]
    InsufficientEscrow,
    #[error("pool does not have sufficient cash on hand")]
    InsufficientCash,
    #[error("operation would breach the account's health factor")]
    HealthFactorBreach,
    #[error("operation would breach the vault's collateralization ratio")]
    CrBreach,
    #[error("operation would breach a configured debt/pool ceiling")]
    CeilingExceeded,

    // -- Oracle --
    #[error("oracle price is older than the configured staleness bound")]
    StalePrice,
    #[error("oracle reported a non-positive price")]
    NegativePrice,
    #[error("oracle price confidence interval is too wide")]
    OracleUncertain,
    #[error("oracle price is too volatile relative to its recent TWAP")]
    OracleVolatile,

    // -- Arithmetic (fatal; never surfaced as a normal validation error) --
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("division by zero")]
    DivByZero,
    #[error("numeric cast failed")]
    CastFailure,

    // -- Pool/market admin --
    #[error("pool is paused")]
    PoolPaused,
}

/// `validate!(condition, ErrorCode::X)` -- fails fast with a single error
/// variant, mirroring the teacher's `validate!` precondition macro used
/// throughout `state/market.rs` and `math/balance.rs`.
#[macro_export]
macro_rules! validate {
    ($condition:expr, $err:expr) => {
        if !($condition) {
            log::warn!(
                "validation failed at {}:{}: {}",
                file!(),
                line!(),
                stringify!($condition)
            );
            Err($err)
        } else {
            Ok(())
        }
    };
}
