//! Funding (perps only, spec section 4.9): accumulates a `funding_index`
//! every `FUNDING_INTERVAL` from `(mark - oracle) / oracle`, clamped to a
//! configured band. Grounded on the pack's `rwa-perps` `funding.rs`
//! (`calculate_funding_payment = size * rate * dt / BASIS_POINTS`),
//! generalized from a per-position running rate to a market-level
//! `funding_index` that positions settle against on touch, the way a
//! perpetual future's cumulative funding index is usually tracked.

use crate::error::CoreResult;
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::{BPS_DENOMINATOR, PRICE_DENOMINATOR};

/// 8 hours, the conventional perpetual-future funding cadence.
pub const FUNDING_INTERVAL_MS: u64 = 8 * 60 * 60 * 1_000;

/// Premium of mark over oracle, in bps, clamped to `+-max_band_bps`
/// (spec section 4.9: "clamped to a configured band").
pub fn clamped_premium_bps(mark_price: u128, oracle_price: u128, max_band_bps: u64) -> CoreResult<i128> {
    let mark = mark_price as i128;
    let oracle = oracle_price as i128;
    let premium_bps = mark.safe_sub(oracle)?.safe_mul(BPS_DENOMINATOR as i128)?.safe_div(oracle.max(1))?;
    Ok(premium_bps.clamp(-(max_band_bps as i128), max_band_bps as i128))
}

/// Grows the market's running `funding_index` by `premium_bps * dt_ms /
/// (FUNDING_INTERVAL_MS * BPS_DENOMINATOR)` scaled to the market's price
/// denominator -- the per-interval accrual a `funding_step` keeper call
/// applies once per `FUNDING_INTERVAL_MS` that has actually elapsed.
pub fn accrue_funding_index(funding_index: i128, premium_bps: i128, dt_ms: u64) -> CoreResult<i128> {
    if dt_ms == 0 {
        return Ok(funding_index);
    }
    let delta = premium_bps
        .safe_mul(dt_ms as i128)?
        .safe_mul(PRICE_DENOMINATOR as i128)?
        .safe_div((FUNDING_INTERVAL_MS as i128).safe_mul(BPS_DENOMINATOR as i128)?)?;
    funding_index.safe_add(delta)
}

/// Funding payment owed by a position touching now: `size * (funding_index
/// - funding_index_at_entry) / PRICE_DENOMINATOR`, signed by the
/// position's side the same way the pack's `calculate_funding_payment`
/// multiplies by signed `position.size`.
pub fn settle_funding_payment(size: u128, is_long: bool, funding_index: i128, funding_index_at_entry: i128) -> CoreResult<i128> {
    let signed_size: i128 = if is_long { size as i128 } else { -(size as i128) };
    signed_size
        .safe_mul(funding_index.safe_sub(funding_index_at_entry)?)?
        .safe_div(PRICE_DENOMINATOR as i128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_is_clamped_to_band() {
        // mark 10% above oracle, band capped at 5% (500bps).
        let bps = clamped_premium_bps(1_100, 1_000, 500).unwrap();
        assert_eq!(bps, 500);
    }

    #[test]
    fn zero_dt_leaves_index_unchanged() {
        assert_eq!(accrue_funding_index(0, 100, 0).unwrap(), 0);
    }

    #[test]
    fn index_grows_with_positive_premium() {
        let idx = accrue_funding_index(0, 100, FUNDING_INTERVAL_MS).unwrap();
        assert!(idx > 0);
    }

    #[test]
    fn long_pays_when_index_rises() {
        let payment = settle_funding_payment(1_000, true, 1_000, 0).unwrap();
        assert!(payment > 0);
        let receipt = settle_funding_payment(1_000, false, 1_000, 0).unwrap();
        assert!(receipt < 0);
    }
}
