//! LendingPool<A> aggregate (spec section 4.6): [`LendingMarket`] owns one
//! [`pool::LendingPool`] per asset and implements the account-level entry
//! points (`supply`, `withdraw`, `borrow`, `repay`). Health factor is
//! computed across *all* of an account's pools (collateral supplied in one
//! asset backs borrows in another), matching the way
//! `LiquidationDispatcher` (spec section 4.8) "iterates its lending
//! borrows" rather than checking a single isolated object -- see
//! `DESIGN.md` for this Open-Question resolution.

pub mod pool;
pub mod position;
pub mod rates;

pub use pool::{AccrualReport, LendingPool};
pub use position::UserLendingPosition;
pub use rates::RateParams;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::clock::Clock;
use crate::error::{CoreResult, ErrorCode};
use crate::events::CoreEvent;
use crate::fees::{FeeConfig, FeeVault};
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::mul_bps_floor;
use crate::oracle::OracleRegistry;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LendingMarket {
    pools: HashMap<String, LendingPool>,
}

impl LendingMarket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pool(&mut self, _admin: &AdminCap, pool: LendingPool) {
        self.pools.insert(pool.asset.clone(), pool);
    }

    pub fn pool(&self, asset: &str) -> Option<&LendingPool> {
        self.pools.get(asset)
    }

    pub fn pool_mut(&mut self, asset: &str) -> CoreResult<&mut LendingPool> {
        self.pools.get_mut(asset).ok_or(ErrorCode::UnknownSymbol)
    }

    /// `accrue_pool_interest(asset, now)`: keeper-driven, independent of
    /// any user mutation (spec section 6 entry-point surface).
    pub fn accrue_pool_interest(&mut self, asset: &str, clock: Clock) -> CoreResult<(AccrualReport, Vec<CoreEvent>)> {
        let pool = self.pool_mut(asset)?;
        let report = pool.accrue(clock)?;
        let events = vec![
            CoreEvent::RateUpdated {
                asset: asset.to_string(),
                utilization_bps: report.utilization_bps,
                borrow_rate_bps: report.borrow_rate_bps,
                supply_rate_bps: report.supply_rate_bps,
                borrow_index: pool.borrow_index,
                supply_index: pool.supply_index,
                ts: clock.now_ms,
            },
            CoreEvent::InterestAccrued { asset: asset.to_string(), delta_borrows: report.delta_borrows, delta_reserves: report.delta_reserves, ts: clock.now_ms },
        ];
        Ok((report, events))
    }

    /// `update_pool_rates`: admin setter for the rate curve, CF and
    /// liquidation threshold. Requires `cf_bps < liq_threshold_bps`
    /// unconditionally (spec section 8 invariant 6).
    pub fn update_pool_rates(&mut self, _admin: &AdminCap, asset: &str, rate_params: RateParams, cf_bps: u64, liq_threshold_bps: u64) -> CoreResult<()> {
        if cf_bps >= liq_threshold_bps {
            return Err(ErrorCode::CeilingExceeded);
        }
        let pool = self.pool_mut(asset)?;
        pool.rate_params = rate_params;
        pool.cf_bps = cf_bps;
        pool.liq_threshold_bps = liq_threshold_bps;
        Ok(())
    }

    /// Effective collateral factor for an asset after the staking bonus
    /// (spec section 4.6): bounded so it stays strictly below the
    /// liquidation threshold (spec section 8 invariant 6), even if the
    /// configured `lending_cf_bonus_bps_max` would otherwise push past it.
    pub fn effective_cf_bps(pool: &LendingPool, user_stake: u128, cfg: &FeeConfig) -> u64 {
        let bonus = if user_stake > 0 {
            // Bonus scales linearly up to the configured max at the top
            // stake tier; simplest faithful reading of "up to
            // cf_bonus_bps_max" with no further tier schedule specified.
            let top_tier_stake = cfg.stake_tiers.last().map(|t| t.min_stake).unwrap_or(0);
            if top_tier_stake == 0 {
                0
            } else {
                let scaled = (user_stake.min(top_tier_stake) * cfg.lending_cf_bonus_bps_max as u128) / top_tier_stake;
                scaled as u64
            }
        } else {
            0
        };
        let effective = pool.cf_bps.saturating_add(bonus);
        effective.min(pool.liq_threshold_bps.saturating_sub(1))
    }

    /// Sums collateral value (cf-weighted) and debt value across every
    /// pool the account touches, each priced at the pool's own oracle
    /// symbol (spec section 4.8: "no cross-offset", each asset priced
    /// independently).
    pub fn account_values(&self, account: &str, oracle: &OracleRegistry, clock: Clock, user_stake: u128, cfg: &FeeConfig) -> CoreResult<(u128, u128)> {
        let mut collateral_value = 0u128;
        let mut debt_value = 0u128;
        for pool in self.pools.values() {
            let pos = pool.position_of(account);
            if pos.is_empty() {
                continue;
            }
            let price = oracle.price_checked(&pool.asset, clock)?;
            if pos.scaled_supply > 0 {
                let underlying = pos.underlying_supply(pool.supply_index)?;
                let value = underlying.checked_mul(price).ok_or(ErrorCode::Overflow)?;
                let eff_cf = Self::effective_cf_bps(pool, user_stake, cfg);
                collateral_value = collateral_value.checked_add(mul_bps_floor(value, eff_cf)?).ok_or(ErrorCode::Overflow)?;
            }
            if pos.scaled_borrow > 0 {
                let underlying = pos.underlying_borrow(pool.borrow_index)?;
                let value = underlying.checked_mul(price).ok_or(ErrorCode::Overflow)?;
                debt_value = debt_value.checked_add(value).ok_or(ErrorCode::Overflow)?;
            }
        }
        Ok((collateral_value, debt_value))
    }

    fn require_healthy(&self, account: &str, oracle: &OracleRegistry, clock: Clock, user_stake: u128, cfg: &FeeConfig) -> CoreResult<()> {
        let (collateral_value, debt_value) = self.account_values(account, oracle, clock, user_stake, cfg)?;
        if debt_value > 0 && collateral_value < debt_value {
            return Err(ErrorCode::HealthFactorBreach);
        }
        Ok(())
    }

    pub fn supply(&mut self, clock: Clock, asset: &str, account: &str, amount: u128) -> CoreResult<Vec<CoreEvent>> {
        let pool = self.pool_mut(asset)?;
        pool.accrue(clock)?;
        pool.supply(account, amount)?;
        Ok(vec![CoreEvent::AssetSupplied { user: account.to_string(), asset: asset.to_string(), amount, ts: clock.now_ms }])
    }

    pub fn withdraw(
        &mut self,
        clock: Clock,
        asset: &str,
        account: &str,
        amount: u128,
        oracle: &OracleRegistry,
        user_stake: u128,
        cfg: &FeeConfig,
    ) -> CoreResult<Vec<CoreEvent>> {
        let pool = self.pool_mut(asset)?;
        pool.accrue(clock)?;
        pool.withdraw(account, amount)?;
        self.require_healthy(account, oracle, clock, user_stake, cfg)?;
        Ok(vec![CoreEvent::AssetWithdrawn { user: account.to_string(), asset: asset.to_string(), amount, ts: clock.now_ms }])
    }

    #[allow(clippy::too_many_arguments)]
    pub fn borrow(
        &mut self,
        clock: Clock,
        asset: &str,
        account: &str,
        amount: u128,
        oracle: &OracleRegistry,
        user_stake: u128,
        cfg: &FeeConfig,
        fee_vault: &mut FeeVault,
    ) -> CoreResult<Vec<CoreEvent>> {
        let pool = self.pool_mut(asset)?;
        pool.accrue(clock)?;
        let fee = pool.borrow(account, amount, cfg.lending_origination_bps)?;
        self.require_healthy(account, oracle, clock, user_stake, cfg)?;
        fee_vault.accrue_generic(asset, fee)?;
        let mut events = vec![CoreEvent::AssetBorrowed { user: account.to_string(), asset: asset.to_string(), amount, ts: clock.now_ms }];
        if fee > 0 {
            events.push(CoreEvent::FeeCollected { amount: fee, payer: account.to_string(), market: asset.to_string(), reason: "origination".to_string(), ts: clock.now_ms });
        }
        Ok(events)
    }

    pub fn repay(&mut self, clock: Clock, asset: &str, account: &str, amount: u128) -> CoreResult<(u128, Vec<CoreEvent>)> {
        let pool = self.pool_mut(asset)?;
        pool.accrue(clock)?;
        let excess = pool.repay(account, amount)?;
        let applied = amount - excess;
        Ok((excess, vec![CoreEvent::DebtRepaid { user: account.to_string(), asset: asset.to_string(), amount: applied, ts: clock.now_ms }]))
    }

    /// `liquidate` (spec section 4.6/4.8): called by the
    /// [`crate::liquidation::LiquidationDispatcher`] once it has found the
    /// account's lending silo unhealthy. Repays up to `repay_amount` of
    /// `debt_asset`'s debt and seizes the equivalent value (plus
    /// `liquidation_bonus_bps`) from the account's `collateral_asset`
    /// supply, capped at what it actually holds there.
    #[allow(clippy::too_many_arguments)]
    pub fn liquidate(
        &mut self,
        clock: Clock,
        debt_asset: &str,
        collateral_asset: &str,
        account: &str,
        repay_amount: u128,
        oracle: &OracleRegistry,
        liquidation_bonus_bps: u64,
    ) -> CoreResult<(u128, u128, Vec<CoreEvent>)> {
        if debt_asset == collateral_asset {
            return Err(ErrorCode::UnknownSymbol);
        }

        let debt_pool = self.pool_mut(debt_asset)?;
        debt_pool.accrue(clock)?;
        let owed = debt_pool.position_of(account).underlying_borrow(debt_pool.borrow_index)?;
        if owed == 0 {
            return Err(ErrorCode::VaultHealthy);
        }
        let repay = repay_amount.min(owed);
        debt_pool.repay(account, repay)?;

        let debt_price = oracle.price_checked(debt_asset, clock)?;
        let seize_value = mul_bps_floor(repay.safe_mul(debt_price)?, 10_000u64.safe_add(liquidation_bonus_bps)?)?;

        let collateral_pool = self.pool_mut(collateral_asset)?;
        collateral_pool.accrue(clock)?;
        let collateral_price = oracle.price_checked(collateral_asset, clock)?;
        let held = collateral_pool.position_of(account).underlying_supply(collateral_pool.supply_index)?;
        let seize = seize_value.safe_div(collateral_price.max(1))?.min(held);
        collateral_pool.withdraw(account, seize)?;

        let events = vec![
            CoreEvent::DebtRepaid { user: account.to_string(), asset: debt_asset.to_string(), amount: repay, ts: clock.now_ms },
            CoreEvent::AssetWithdrawn { user: account.to_string(), asset: collateral_asset.to_string(), amount: seize, ts: clock.now_ms },
        ];
        Ok((repay, seize, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::rates::RateParams;

    fn market_with_usdc_and_btc() -> (LendingMarket, OracleRegistry, FeeConfig) {
        let admin = AdminCap::new();
        let mut market = LendingMarket::new();
        let usdc_params = RateParams { base_bps: 0, slope1_bps: 500, slope2_bps: 30_000, kink_bps: 8_000, reserve_factor_bps: 1_000 };
        let btc_params = usdc_params;
        market.create_pool(&admin, LendingPool::new("USDC", usdc_params, 9_000, 9_500, u128::MAX, 0).unwrap());
        market.create_pool(&admin, LendingPool::new("BTC", btc_params, 7_000, 8_000, u128::MAX, 0).unwrap());

        let mut oracle = OracleRegistry::new();
        oracle.set_feed(&admin, "USDC", 1, 10_000);
        oracle.set_feed(&admin, "BTC", 2, 10_000);
        oracle.push_reading("USDC", crate::oracle::feed::FeedReading { price: 1_000_000, confidence_bps: 1, twap: 1_000_000, last_update_ms: 0 }).unwrap();
        oracle.push_reading("BTC", crate::oracle::feed::FeedReading { price: 50_000_000_000, confidence_bps: 1, twap: 50_000_000_000, last_update_ms: 0 }).unwrap();

        (market, oracle, FeeConfig::default())
    }

    #[test]
    fn cross_pool_borrow_respects_health_factor() {
        let (mut market, oracle, cfg) = market_with_usdc_and_btc();
        let clock = Clock::at(0);
        market.supply(clock, "USDC", "alice", 100_000_000).unwrap();
        let mut fee_vault = FeeVault::new();
        // USDC cf=9000bps -> 90_000_000 micro-usd borrowing power in BTC.
        let res = market.borrow(clock, "BTC", "alice", 1, &oracle, 0, &cfg, &mut fee_vault);
        assert!(res.is_ok());
    }

    #[test]
    fn borrow_past_health_factor_rejected() {
        let (mut market, oracle, cfg) = market_with_usdc_and_btc();
        let clock = Clock::at(0);
        market.supply(clock, "USDC", "alice", 1_000_000).unwrap();
        let mut fee_vault = FeeVault::new();
        // 1 BTC at 50k >> collateral.
        let res = market.borrow(clock, "BTC", "alice", 1_000_000, &oracle, 0, &cfg, &mut fee_vault);
        assert!(matches!(res, Err(ErrorCode::HealthFactorBreach)));
    }
}
