//! Kinked utilization interest-rate model (spec section 4.6), grounded on
//! the pack's `XOXNO-rs-lending/liquidity_pool/src/rates.rs`
//! `compute_borrow_rate`/`compute_deposit_rate` -- same two-piece kink
//! shape, generalized from that crate's `ManagedDecimal` fixed-point type
//! to this crate's bps/ray integers and routed through [`SafeMath`].

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::BPS_DENOMINATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RateParams {
    /// All rates are bps-per-year.
    pub base_bps: u64,
    pub slope1_bps: u64,
    pub slope2_bps: u64,
    /// Utilization, in bps, at which the slope steepens.
    pub kink_bps: u64,
    pub reserve_factor_bps: u64,
}

/// `u = total_borrows / (cash + total_borrows)`, in bps.
pub fn utilization_bps(cash: u128, total_borrows: u128) -> CoreResult<u64> {
    let denom = cash.safe_add(total_borrows)?;
    if denom == 0 {
        return Ok(0);
    }
    let bps = total_borrows.safe_mul(BPS_DENOMINATOR)?.safe_div(denom)?;
    Ok(bps.min(BPS_DENOMINATOR) as u64)
}

/// `borrow_rate_per_year` per spec section 4.6's two-piece kink.
pub fn borrow_rate_bps_per_year(params: &RateParams, u_bps: u64) -> CoreResult<u64> {
    if u_bps <= params.kink_bps {
        if params.kink_bps == 0 {
            return Ok(params.base_bps);
        }
        let slope = (params.slope1_bps as u128).safe_mul(u_bps as u128)?.safe_div(params.kink_bps as u128)?;
        Ok(params.base_bps.saturating_add(slope as u64))
    } else {
        let denom = BPS_DENOMINATOR.saturating_sub(params.kink_bps as u128).max(1);
        let excess = (u_bps - params.kink_bps) as u128;
        let slope = (params.slope2_bps as u128).safe_mul(excess)?.safe_div(denom)?;
        Ok(params.base_bps.saturating_add(params.slope1_bps).saturating_add(slope as u64))
    }
}

/// `supply_rate = borrow_rate * u * (10_000 - reserve_factor) / 10_000^2`.
pub fn supply_rate_bps_per_year(params: &RateParams, u_bps: u64, borrow_rate_bps: u64) -> CoreResult<u64> {
    let numerator = (borrow_rate_bps as u128)
        .safe_mul(u_bps as u128)?
        .safe_mul((BPS_DENOMINATOR as u128).safe_sub(params.reserve_factor_bps as u128)?)?;
    let denom = BPS_DENOMINATOR.safe_mul(BPS_DENOMINATOR)?;
    Ok(numerator.safe_div(denom)?.min(u64::MAX as u128) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinked_rate_scenario_4() {
        // base=0, slope1=5%, slope2=300%, kink=80%, utilization=90%
        let params = RateParams {
            base_bps: 0,
            slope1_bps: 500,
            slope2_bps: 30_000,
            kink_bps: 8_000,
            reserve_factor_bps: 1_000,
        };
        let rate = borrow_rate_bps_per_year(&params, 9_000).unwrap();
        // 5% + 300% * (10/20) = 5% + 150% = 155%
        assert_eq!(rate, 15_500);
    }

    #[test]
    fn utilization_is_zero_when_pool_empty() {
        assert_eq!(utilization_bps(0, 0).unwrap(), 0);
    }

    #[test]
    fn below_kink_uses_slope1_only() {
        let params = RateParams { base_bps: 0, slope1_bps: 1_000, slope2_bps: 50_000, kink_bps: 8_000, reserve_factor_bps: 0 };
        let rate = borrow_rate_bps_per_year(&params, 4_000).unwrap();
        assert_eq!(rate, 500);
    }
}
