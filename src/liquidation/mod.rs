//! LiquidationDispatcher (spec section 4.8): the unified solvency check
//! and routing layer shared by lending, synth and derivatives. Grounded on
//! spec section 9's "dynamic dispatch across product types is expressed as
//! an enumerated variant with exhaustive handling" -- [`LiquidationCall`]
//! is that enum, and [`LiquidationDispatcher::dispatch`]'s `match` has one
//! arm per declared product with no wildcard, so adding a product is a
//! source-level change to both the enum and the match, never a runtime
//! registration. The dispatcher itself holds no state of its own beyond
//! its policy (max share per call) -- it never owns a Market, Pool or
//! Vault, matching spec section 9's "no cyclic graphs, no hidden ambient
//! singletons".

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::clock::Clock;
use crate::derivatives::DerivativesRegistry;
use crate::error::{CoreResult, ErrorCode};
use crate::events::CoreEvent;
use crate::fees::{FeeConfig, FeeVault};
use crate::fixed_math::mul_bps_floor;
use crate::lending::LendingMarket;
use crate::oracle::OracleRegistry;
use crate::synth::SynthVaultBook;

/// Default max share of an account's debt/position a single liquidation
/// call may repay/close (spec section 4.8: "default 50%").
pub const DEFAULT_MAX_SHARE_BPS: u64 = 5_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LiquidationPolicy {
    pub max_share_bps: u64,
}

impl Default for LiquidationPolicy {
    fn default() -> Self {
        LiquidationPolicy { max_share_bps: DEFAULT_MAX_SHARE_BPS }
    }
}

/// Per-silo health readout (spec section 4.8): "liquidatable if total
/// collateral-adjusted value < total debt-adjusted value for any silo
/// evaluated in isolation (no cross-offset)". Each field is independent;
/// a caller may liquidate any subset of the flagged silos in any order
/// (spec section 4.8: "no prioritization is imposed by the core").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvencyReport {
    pub lending_unhealthy: bool,
    pub synth_unhealthy_symbols: Vec<String>,
    pub derivatives_unhealthy_markets: Vec<String>,
}

impl SolvencyReport {
    pub fn is_liquidatable(&self) -> bool {
        self.lending_unhealthy || !self.synth_unhealthy_symbols.is_empty() || !self.derivatives_unhealthy_markets.is_empty()
    }
}

/// One liquidation call's target, naming exactly the mutable aggregate(s)
/// that call touches. The `'a` borrows keep the dispatcher itself free of
/// any reference to the product state between calls (spec section 5: each
/// entry point runs to completion over its own object's critical section).
pub enum LiquidationCall<'a> {
    Lending {
        market: &'a mut LendingMarket,
        debt_asset: String,
        collateral_asset: String,
        liquidation_bonus_bps: u64,
    },
    Synth {
        book: &'a mut SynthVaultBook,
        fee_vault: &'a mut FeeVault,
        vault_id: u64,
        symbol: String,
    },
    Derivatives {
        registry: &'a mut DerivativesRegistry,
        market_symbol: String,
        mark_price: u128,
    },
}

pub enum LiquidationOutcome {
    Lending { repaid: u128, collateral_seized: u128, events: Vec<CoreEvent> },
    Synth { repaid: u128, collateral_seized: u128, events: Vec<CoreEvent> },
    Derivatives { closed_size: u128, released: i128 },
}

/// LiquidationDispatcher (spec section 4.8). Stateless aside from
/// [`LiquidationPolicy`]; every other input is borrowed for the duration
/// of a single call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidationDispatcher {
    pub policy: LiquidationPolicy,
}

impl LiquidationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_policy(&mut self, _admin: &AdminCap, policy: LiquidationPolicy) {
        self.policy = policy;
    }

    fn capped_repay(&self, owed: u128, requested: u128) -> CoreResult<u128> {
        let cap = mul_bps_floor(owed, self.policy.max_share_bps)?;
        Ok(requested.min(cap))
    }

    /// The unified solvency signal (spec section 4.8): iterates the
    /// account's lending borrows (across every pool, via
    /// [`LendingMarket::account_values`]), its synth vault's per-symbol
    /// debt (if `synth_vault_id` is given -- vaults are addressed by id,
    /// not by owner lookup, so the caller supplies it), and whichever
    /// derivatives markets the caller names. No cross-silo offset: a
    /// healthy lending position does not cover an unhealthy synth vault.
    #[allow(clippy::too_many_arguments)]
    pub fn account_solvency(
        &self,
        lending: &LendingMarket,
        synth: &SynthVaultBook,
        derivatives: &DerivativesRegistry,
        account: &str,
        synth_vault_id: Option<u64>,
        derivative_markets: &[String],
        oracle: &OracleRegistry,
        clock: Clock,
        user_stake: u128,
        cfg: &FeeConfig,
    ) -> CoreResult<SolvencyReport> {
        let (collateral_value, debt_value) = lending.account_values(account, oracle, clock, user_stake, cfg)?;
        let lending_unhealthy = debt_value > 0 && collateral_value < debt_value;

        let mut synth_unhealthy_symbols = Vec::new();
        if let Some(vault_id) = synth_vault_id {
            for symbol in synth.vault(vault_id)?.debt_symbols() {
                if synth.is_symbol_breached(vault_id, &symbol, oracle, clock)? {
                    synth_unhealthy_symbols.push(symbol);
                }
            }
        }

        let mut derivatives_unhealthy_markets = Vec::new();
        for market_symbol in derivative_markets {
            if let Ok(market) = derivatives.market(market_symbol) {
                if let Some(pos) = market.position(account) {
                    if pos.flagged_for_liquidation {
                        derivatives_unhealthy_markets.push(market_symbol.clone());
                    }
                }
            }
        }

        Ok(SolvencyReport { lending_unhealthy, synth_unhealthy_symbols, derivatives_unhealthy_markets })
    }

    /// Routes one liquidation call to its product's own entry point,
    /// capping `requested_repay`/`requested_close_size` to
    /// `policy.max_share_bps` of the account's current exposure in that
    /// silo (spec section 4.8). The underlying component call still
    /// performs its own per-call solvency check (`VaultHealthy` /
    /// `HealthFactorBreach` on a healthy target), so this cap is
    /// advisory-but-enforced, not a substitute for that check. Exhaustive
    /// `match` over every declared product -- spec section 9.
    pub fn dispatch(
        &self,
        clock: Clock,
        account: &str,
        liquidator: &str,
        requested_repay: u128,
        oracle: &OracleRegistry,
        call: LiquidationCall,
    ) -> CoreResult<LiquidationOutcome> {
        match call {
            LiquidationCall::Lending { market, debt_asset, collateral_asset, liquidation_bonus_bps } => {
                let pool = market.pool(&debt_asset).ok_or(ErrorCode::UnknownSymbol)?;
                let owed = pool.position_of(account).underlying_borrow(pool.borrow_index)?;
                let capped = self.capped_repay(owed, requested_repay)?;
                let (repaid, collateral_seized, events) =
                    market.liquidate(clock, &debt_asset, &collateral_asset, account, capped, oracle, liquidation_bonus_bps)?;
                Ok(LiquidationOutcome::Lending { repaid, collateral_seized, events })
            }
            LiquidationCall::Synth { book, fee_vault, vault_id, symbol } => {
                let owed = book.vault(vault_id)?.debt_of(&symbol);
                let capped = self.capped_repay(owed, requested_repay)?;
                let (repaid, collateral_seized, events) = book.liquidate_vault(clock, vault_id, &symbol, capped, oracle, liquidator, fee_vault)?;
                Ok(LiquidationOutcome::Synth { repaid, collateral_seized, events })
            }
            LiquidationCall::Derivatives { registry, market_symbol, mark_price } => {
                let owed_size = registry.market(&market_symbol)?.position(account).ok_or(ErrorCode::UnknownOrder)?.size;
                let capped = self.capped_repay(owed_size, requested_repay)?;
                let market = registry.market_mut(&market_symbol)?;
                let (closed_size, released) = market.liquidate_position(account, capped, mark_price)?;
                Ok(LiquidationOutcome::Derivatives { closed_size, released })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivatives::market::MarginParams;
    use crate::derivatives::position::PositionSide;
    use crate::derivatives::DerivativesMarket;
    use crate::lending::rates::RateParams;
    use crate::lending::LendingPool;
    use crate::oracle::feed::FeedReading;
    use crate::synth::SyntheticParams;

    fn oracle_with(admin: &AdminCap, symbol: &str, price: i128) -> OracleRegistry {
        let mut oracle = OracleRegistry::new();
        oracle.set_feed(admin, symbol, 1, 1_000_000_000);
        oracle.push_reading(symbol, FeedReading { price, confidence_bps: 1, twap: price, last_update_ms: 0 }).unwrap();
        oracle
    }

    #[test]
    fn lending_liquidation_caps_to_max_share_and_routes_through_pool() {
        let admin = AdminCap::new();
        let mut market = LendingMarket::new();
        let usdc_params = RateParams { base_bps: 0, slope1_bps: 500, slope2_bps: 30_000, kink_bps: 8_000, reserve_factor_bps: 1_000 };
        market.create_pool(&admin, LendingPool::new("USDC", usdc_params, 9_000, 9_500, u128::MAX, 0).unwrap());
        market.create_pool(&admin, LendingPool::new("BTC", usdc_params, 7_000, 8_000, u128::MAX, 0).unwrap());

        let mut oracle = OracleRegistry::new();
        oracle.set_feed(&admin, "USDC", 1, 10_000);
        oracle.set_feed(&admin, "BTC", 2, 10_000);
        oracle.push_reading("USDC", FeedReading { price: 1_000_000, confidence_bps: 1, twap: 1_000_000, last_update_ms: 0 }).unwrap();
        oracle.push_reading("BTC", FeedReading { price: 50_000_000_000, confidence_bps: 1, twap: 50_000_000_000, last_update_ms: 0 }).unwrap();

        let clock = Clock::at(0);
        market.supply(clock, "USDC", "alice", 100_000_000).unwrap();
        let mut fee_vault = FeeVault::new();
        market.borrow(clock, "BTC", "alice", 1_700, &oracle, 0, &FeeConfig::default(), &mut fee_vault).unwrap();

        // price spikes so alice's BTC debt now exceeds her 90%-cf USDC collateral.
        oracle.push_reading("BTC", FeedReading { price: 80_000_000_000, confidence_bps: 1, twap: 80_000_000_000, last_update_ms: 0 }).unwrap();

        let dispatcher = LiquidationDispatcher::new();
        let cfg = FeeConfig::default();
        let report = dispatcher
            .account_solvency(&market, &SynthVaultBook::new("USDC"), &DerivativesRegistry::new(), "alice", None, &[], &oracle, clock, 0, &cfg)
            .unwrap();
        assert!(report.lending_unhealthy);

        let owed = market.pool("BTC").unwrap().position_of("alice").underlying_borrow(market.pool("BTC").unwrap().borrow_index).unwrap();
        let outcome = dispatcher
            .dispatch(
                clock,
                "alice",
                "liquidator",
                owed, // requests full repayment, should be capped at 50%
                &oracle,
                LiquidationCall::Lending { market: &mut market, debt_asset: "BTC".to_string(), collateral_asset: "USDC".to_string(), liquidation_bonus_bps: 500 },
            )
            .unwrap();

        match outcome {
            LiquidationOutcome::Lending { repaid, collateral_seized, .. } => {
                assert!(repaid <= owed / 2 + 1);
                assert!(collateral_seized > 0);
            }
            _ => panic!("expected Lending outcome"),
        }
    }

    #[test]
    fn synth_silo_flagged_independently_of_healthy_lending() {
        let admin = AdminCap::new();
        let lending = LendingMarket::new();
        let mut synth = SynthVaultBook::new("USDC");
        synth
            .set_symbol(
                &admin,
                "sBTC",
                SyntheticParams {
                    decimals: 8,
                    min_cr_bps: 15_000,
                    liq_threshold_bps: 12_000,
                    stability_fee_bps_per_year: 0,
                    liquidation_bonus_bps: 1_000,
                    mint_bps: 0,
                    burn_bps: 0,
                    debt_ceiling: u128::MAX,
                    paused: false,
                },
            )
            .unwrap();

        let clock = Clock::at(0);
        let (vault_id, _) = synth.create_vault(clock, "alice");
        let mut oracle = oracle_with(&admin, "USDC", 1_000_000);
        oracle.set_feed(&admin, "sBTC", 2, 1_000_000_000);
        oracle.push_reading("sBTC", FeedReading { price: 1_000 * 1_000_000, confidence_bps: 1, twap: 1_000 * 1_000_000, last_update_ms: 0 }).unwrap();
        synth.deposit_collateral(clock, vault_id, 3_000).unwrap();
        let mut fv = FeeVault::new();
        synth.mint_synthetic(clock, vault_id, "sBTC", 2, &oracle, &mut fv).unwrap();

        let dispatcher = LiquidationDispatcher::new();
        let derivatives = DerivativesRegistry::new();
        let cfg = FeeConfig::default();
        let report = dispatcher.account_solvency(&lending, &synth, &derivatives, "alice", Some(vault_id), &[], &oracle, clock, 0, &cfg).unwrap();
        assert!(!report.lending_unhealthy);
        assert!(report.synth_unhealthy_symbols.is_empty());

        oracle.push_reading("sBTC", FeedReading { price: 1_300 * 1_000_000, confidence_bps: 1, twap: 1_300 * 1_000_000, last_update_ms: 0 }).unwrap();
        let report = dispatcher.account_solvency(&lending, &synth, &derivatives, "alice", Some(vault_id), &[], &oracle, clock, 0, &cfg).unwrap();
        assert_eq!(report.synth_unhealthy_symbols, vec!["sBTC".to_string()]);
        assert!(report.is_liquidatable());

        let outcome = dispatcher
            .dispatch(
                clock,
                "alice",
                "liquidator",
                2,
                &oracle,
                LiquidationCall::Synth { book: &mut synth, fee_vault: &mut fv, vault_id, symbol: "sBTC".to_string() },
            )
            .unwrap();
        match outcome {
            LiquidationOutcome::Synth { repaid, collateral_seized, .. } => {
                assert_eq!(repaid, 1); // capped at 50% of the 2-unit debt
                assert!(collateral_seized > 0);
            }
            _ => panic!("expected Synth outcome"),
        }
    }

    #[test]
    fn derivatives_silo_uses_mtm_flag_and_caps_close_size() {
        let margin = MarginParams { initial_margin_bps: 1_000, maintenance_margin_bps: 500, max_funding_band_bps: 500 };
        let mut market = DerivativesMarket::new("BTC-PERP", 1, 1, None, margin, 0);
        market.open_position(Clock::at(0), "alice", PositionSide::Long, 10, 100, 50).unwrap();
        let flagged = market.mtm_step(40).unwrap();
        assert_eq!(flagged, vec!["alice".to_string()]);

        let mut registry = DerivativesRegistry::new();
        let admin = AdminCap::new();
        registry.create_market(&admin, market);

        let dispatcher = LiquidationDispatcher::new();
        let oracle = oracle_with(&admin, "USDC", 1_000_000);
        let outcome = dispatcher
            .dispatch(
                Clock::at(0),
                "alice",
                "liquidator",
                10, // full size requested, capped at 50%
                &oracle,
                LiquidationCall::Derivatives { registry: &mut registry, market_symbol: "BTC-PERP".to_string(), mark_price: 40 },
            )
            .unwrap();
        match outcome {
            LiquidationOutcome::Derivatives { closed_size, .. } => assert_eq!(closed_size, 5),
            _ => panic!("expected Derivatives outcome"),
        }
        assert_eq!(registry.market("BTC-PERP").unwrap().position("alice").unwrap().size, 5);
    }
}
