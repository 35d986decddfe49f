//! LendingPool<A> (spec section 4.6): a single-asset pool with kinked
//! rates, index-based continuous accrual and collateral-factor /
//! liquidation-threshold parameters. Grounded on the teacher's
//! `state/market.rs` index-accrual pattern and the pack's
//! `XOXNO-rs-lending` reserve-factor split, generalized to this crate's
//! ray-scaled [`FixedMath`] indices.

use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreResult, ErrorCode};
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::{accrue_index, mul_bps_floor, RAY, SECONDS_PER_YEAR};
use crate::lending::position::UserLendingPosition;
use crate::lending::rates::{borrow_rate_bps_per_year, supply_rate_bps_per_year, utilization_bps, RateParams};

#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct LendingPool {
    pub asset: String,
    pub cash: u128,
    pub total_borrows: u128,
    pub total_reserves: u128,
    pub supply_index: u128,
    pub borrow_index: u128,
    pub last_accrual_ms: u64,
    pub rate_params: RateParams,
    pub cf_bps: u64,
    pub liq_threshold_bps: u64,
    pub debt_ceiling: u128,
    pub paused: bool,
    pub(crate) positions: HashMap<String, UserLendingPosition>,
}

/// Accrual result, surfaced so the caller can emit `RateUpdated` /
/// `InterestAccrued` events (spec section 6) without this module owning
/// an event sink.
#[derive(Debug, Clone, Copy)]
pub struct AccrualReport {
    pub utilization_bps: u64,
    pub borrow_rate_bps: u64,
    pub supply_rate_bps: u64,
    pub delta_borrows: u128,
    pub delta_reserves: u128,
}

impl LendingPool {
    pub fn new(asset: impl Into<String>, rate_params: RateParams, cf_bps: u64, liq_threshold_bps: u64, debt_ceiling: u128, now_ms: u64) -> CoreResult<Self> {
        if cf_bps >= liq_threshold_bps {
            return Err(ErrorCode::CeilingExceeded);
        }
        Ok(LendingPool {
            asset: asset.into(),
            cash: 0,
            total_borrows: 0,
            total_reserves: 0,
            supply_index: RAY,
            borrow_index: RAY,
            last_accrual_ms: now_ms,
            rate_params,
            cf_bps,
            liq_threshold_bps,
            debt_ceiling,
            paused: false,
            positions: HashMap::new(),
        })
    }

    pub fn position_of(&self, account: &str) -> UserLendingPosition {
        *self.positions.get(account).unwrap_or(&UserLendingPosition::default())
    }

    /// `accrue(now)` per spec section 4.6: idempotent at `dt=0`, invoked
    /// before every user-facing mutation.
    pub fn accrue(&mut self, clock: Clock) -> CoreResult<AccrualReport> {
        let dt_ms = clock.now_ms.saturating_sub(self.last_accrual_ms);
        let u_bps = utilization_bps(self.cash, self.total_borrows)?;
        let borrow_rate_bps = borrow_rate_bps_per_year(&self.rate_params, u_bps)?;
        let supply_rate_bps = supply_rate_bps_per_year(&self.rate_params, u_bps, borrow_rate_bps)?;

        if dt_ms == 0 {
            self.last_accrual_ms = clock.now_ms;
            return Ok(AccrualReport { utilization_bps: u_bps, borrow_rate_bps, supply_rate_bps, delta_borrows: 0, delta_reserves: 0 });
        }

        let dt_sec = dt_ms / 1_000;
        // rate_per_sec_ray = borrow_rate_bps / 10_000 / SECONDS_PER_YEAR, ray-scaled.
        let rate_per_sec_ray = (borrow_rate_bps as u128)
            .safe_mul(RAY)?
            .safe_div(10_000)?
            .safe_div(SECONDS_PER_YEAR)?;

        let old_borrow_index = self.borrow_index;
        let new_borrow_index = accrue_index(old_borrow_index, rate_per_sec_ray, dt_sec)?;

        let old_total_borrows = self.total_borrows;
        let delta_borrows = old_total_borrows.safe_mul(new_borrow_index)?.safe_div(old_borrow_index)?.saturating_sub(old_total_borrows);

        self.borrow_index = new_borrow_index;
        self.total_borrows = old_total_borrows.safe_add(delta_borrows)?;

        let delta_reserves = mul_bps_floor(delta_borrows, self.rate_params.reserve_factor_bps)?;
        self.total_reserves = self.total_reserves.safe_add(delta_reserves)?;

        // supply_index grows so that claims on (cash + total_borrows -
        // reserves) stay proportional to scaled_supply (spec section 4.6).
        let distributable = delta_borrows.saturating_sub(delta_reserves);
        let underlying_supply_before = self.total_underlying_supply(old_borrow_index)?;
        if underlying_supply_before > 0 {
            let index_delta = distributable.safe_mul(RAY)?.safe_div(underlying_supply_before)?.safe_mul(self.supply_index)?.safe_div(RAY)?;
            self.supply_index = self.supply_index.safe_add(index_delta)?;
        }

        self.last_accrual_ms = clock.now_ms;

        Ok(AccrualReport { utilization_bps: u_bps, borrow_rate_bps, supply_rate_bps, delta_borrows, delta_reserves })
    }

    fn total_underlying_supply(&self, _borrow_index: u128) -> CoreResult<u128> {
        self.cash.safe_add(self.total_borrows)?.checked_sub(self.total_reserves).ok_or(ErrorCode::Underflow)
    }

    /// `supply(asset, amount)`: mints scaled supply units, increments cash.
    /// Caller must have already called [`Self::accrue`] this transaction.
    pub fn supply(&mut self, account: &str, amount: u128) -> CoreResult<()> {
        if self.paused {
            return Err(ErrorCode::PoolPaused);
        }
        let scaled = amount.safe_mul(RAY)?.safe_div(self.supply_index)?;
        let pos = self.positions.entry(account.to_string()).or_default();
        pos.scaled_supply = pos.scaled_supply.safe_add(scaled)?;
        self.cash = self.cash.safe_add(amount)?;
        Ok(())
    }

    /// `withdraw(asset, amount)`: burns scaled supply, requires enough
    /// cash on hand. Health-factor re-check across all of an account's
    /// pools is the caller's (`LendingMarket`) responsibility.
    pub fn withdraw(&mut self, account: &str, amount: u128) -> CoreResult<()> {
        if self.paused {
            return Err(ErrorCode::PoolPaused);
        }
        if amount > self.cash {
            return Err(ErrorCode::InsufficientCash);
        }
        let scaled = amount.safe_mul(RAY)?.safe_div(self.supply_index)?;
        let pos = self.positions.entry(account.to_string()).or_default();
        pos.scaled_supply = pos.scaled_supply.checked_sub(scaled).ok_or(ErrorCode::InsufficientCash)?;
        self.cash = self.cash.safe_sub(amount)?;
        Ok(())
    }

    /// `borrow(asset, amount)`: mints scaled borrow, applies origination
    /// fee (returned so the caller routes it through `FeeEngine`), debits
    /// cash. Debt-ceiling and health-factor checks are the caller's.
    pub fn borrow(&mut self, account: &str, amount: u128, origination_bps: u64) -> CoreResult<u128> {
        if self.paused {
            return Err(ErrorCode::PoolPaused);
        }
        if amount > self.cash {
            return Err(ErrorCode::InsufficientCash);
        }
        let new_total_borrows = self.total_borrows.safe_add(amount)?;
        if new_total_borrows > self.debt_ceiling {
            return Err(ErrorCode::CeilingExceeded);
        }
        let fee = mul_bps_floor(amount, origination_bps)?;
        let scaled = amount.safe_mul(RAY)?.safe_div(self.borrow_index)?;
        let pos = self.positions.entry(account.to_string()).or_default();
        pos.scaled_borrow = pos.scaled_borrow.safe_add(scaled)?;
        self.total_borrows = new_total_borrows;
        self.cash = self.cash.safe_sub(amount)?;
        Ok(fee)
    }

    /// `repay(asset, amount)`: reduces scaled borrow; any amount beyond
    /// the account's current underlying debt is returned to the caller to
    /// refund.
    pub fn repay(&mut self, account: &str, amount: u128) -> CoreResult<u128> {
        let pos = self.positions.entry(account.to_string()).or_default();
        let owed = pos.underlying_borrow(self.borrow_index)?;
        let applied = amount.min(owed);
        let excess = amount - applied;

        let scaled_reduction = applied.safe_mul(RAY)?.safe_div(self.borrow_index)?;
        pos.scaled_borrow = pos.scaled_borrow.saturating_sub(scaled_reduction);
        self.total_borrows = self.total_borrows.safe_sub(applied)?;
        self.cash = self.cash.safe_add(applied)?;
        Ok(excess)
    }

    pub fn invariant_cash_covers_reserves(&self) -> bool {
        self.cash.saturating_add(self.total_borrows) >= self.total_reserves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> LendingPool {
        let params = RateParams { base_bps: 0, slope1_bps: 500, slope2_bps: 30_000, kink_bps: 8_000, reserve_factor_bps: 1_000 };
        LendingPool::new("USDC", params, 7_000, 8_000, u128::MAX, 0).unwrap()
    }

    #[test]
    fn supply_then_withdraw_round_trips() {
        let mut p = pool();
        p.accrue(Clock::at(0)).unwrap();
        p.supply("alice", 1_000).unwrap();
        p.accrue(Clock::at(0)).unwrap();
        p.withdraw("alice", 1_000).unwrap();
        assert_eq!(p.cash, 0);
    }

    #[test]
    fn accrual_idempotent_at_zero_dt() {
        let mut p = pool();
        p.supply("alice", 1_000).unwrap();
        p.accrue(Clock::at(0)).unwrap();
        let idx0 = p.borrow_index;
        p.accrue(Clock::at(0)).unwrap();
        assert_eq!(p.borrow_index, idx0);
    }

    #[test]
    fn accrual_grows_indices_monotonically_and_reserves() {
        let mut p = pool();
        p.supply("alice", 10_000).unwrap();
        p.accrue(Clock::at(0)).unwrap();
        p.borrow("bob", 9_000, 0).unwrap();
        let b0 = p.borrow_index;
        let s0 = p.supply_index;
        let r0 = p.total_reserves;
        p.accrue(Clock::at(86_400_000)).unwrap();
        assert!(p.borrow_index >= b0);
        assert!(p.supply_index >= s0);
        assert!(p.total_reserves >= r0);
        assert!(p.invariant_cash_covers_reserves());
    }

    #[test]
    fn borrow_past_ceiling_rejected() {
        let params = RateParams { base_bps: 0, slope1_bps: 500, slope2_bps: 30_000, kink_bps: 8_000, reserve_factor_bps: 0 };
        let mut p = LendingPool::new("USDC", params, 7_000, 8_000, 500, 0).unwrap();
        p.supply("alice", 1_000).unwrap();
        p.accrue(Clock::at(0)).unwrap();
        assert_eq!(p.borrow("bob", 600, 0), Err(ErrorCode::CeilingExceeded));
    }
}
