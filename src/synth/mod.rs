//! SynthVault<C> (spec section 4.7): USDC-collateralized synthetic debt
//! vaults with continuous stability-fee accrual and per-symbol
//! collateralization checks. [`SynthVaultBook`] is the aggregate shared
//! object owning every vault, the way `orderbook::Market` owns every
//! order -- grounded on the teacher's per-object ownership discipline
//! (spec section 9: "users own vaults/positions... no bidirectional
//! references").

pub mod registry;
pub mod vault;

pub use registry::{SyntheticParams, SyntheticRegistry};
pub use vault::Vault;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::clock::Clock;
use crate::error::{CoreResult, ErrorCode};
use crate::events::CoreEvent;
use crate::fees::FeeVault;
use crate::fixed_math::safe_math::SafeMath;
use crate::fixed_math::{mul_bps_floor, MAX_ACCRUAL_DT_SEC, SECONDS_PER_YEAR};
use crate::oracle::OracleRegistry;

const YEAR_MS: u64 = (SECONDS_PER_YEAR as u64) * 1_000;
const BPS_DENOMINATOR: u128 = crate::fixed_math::BPS_DENOMINATOR;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthVaultBook {
    pub registry: SyntheticRegistry,
    pub collateral_symbol: String,
    vaults: HashMap<u64, Vault>,
    next_vault_id: u64,
}

impl SynthVaultBook {
    pub fn new(collateral_symbol: impl Into<String>) -> Self {
        SynthVaultBook { registry: SyntheticRegistry::new(), collateral_symbol: collateral_symbol.into(), vaults: HashMap::new(), next_vault_id: 1 }
    }

    pub fn set_symbol(&mut self, admin: &AdminCap, symbol: &str, params: SyntheticParams) -> CoreResult<()> {
        self.registry.set_symbol(admin, symbol, params)
    }

    pub fn vault(&self, id: u64) -> CoreResult<&Vault> {
        self.vaults.get(&id).ok_or(ErrorCode::UnknownOrder)
    }

    pub fn create_vault(&mut self, clock: Clock, owner: &str) -> (u64, Vec<CoreEvent>) {
        let id = self.next_vault_id;
        self.next_vault_id += 1;
        self.vaults.insert(id, Vault { id, owner: owner.to_string(), ..Default::default() });
        (id, vec![CoreEvent::VaultCreated { vault_id: id, owner: owner.to_string(), ts: clock.now_ms }])
    }

    fn vault_mut(&mut self, id: u64) -> CoreResult<&mut Vault> {
        self.vaults.get_mut(&id).ok_or(ErrorCode::UnknownOrder)
    }

    /// Lazy stability accrual for one (vault, symbol) per spec section
    /// 4.7: runs before any CR check.
    fn accrue_stability_one(&mut self, vault_id: u64, symbol: &str, clock: Clock) -> CoreResult<u128> {
        let params = self.registry.params(symbol)?;
        let vault = self.vault_mut(vault_id)?;
        let last = *vault.last_stability_accrual_ms.get(symbol).unwrap_or(&clock.now_ms);
        let dt_ms = clock.now_ms.saturating_sub(last).min((MAX_ACCRUAL_DT_SEC as u64) * 1_000);
        let units = vault.debt_of(symbol);
        let delta = if units == 0 || dt_ms == 0 {
            0
        } else {
            units
                .safe_mul(params.stability_fee_bps_per_year as u128)?
                .safe_mul(dt_ms as u128)?
                .safe_div((YEAR_MS as u128).safe_mul(BPS_DENOMINATOR)?)?
        };
        if delta > 0 {
            let entry = vault.debts.entry(symbol.to_string()).or_insert(0);
            *entry = entry.safe_add(delta)?;
        }
        vault.last_stability_accrual_ms.insert(symbol.to_string(), clock.now_ms);
        Ok(delta)
    }

    /// Runs stability accrual for every symbol the vault has debt in,
    /// returning the per-symbol deltas for event emission.
    fn accrue_all(&mut self, vault_id: u64, clock: Clock) -> CoreResult<Vec<(String, u128, u64)>> {
        let symbols = self.vault(vault_id)?.debt_symbols();
        let mut out = Vec::new();
        for symbol in symbols {
            let last = *self.vault(vault_id)?.last_stability_accrual_ms.get(&symbol).unwrap_or(&clock.now_ms);
            let delta = self.accrue_stability_one(vault_id, &symbol, clock)?;
            if delta > 0 {
                out.push((symbol, delta, last));
            }
        }
        Ok(out)
    }

    fn stability_events(vault_id: u64, accruals: Vec<(String, u128, u64)>, now_ms: u64) -> Vec<CoreEvent> {
        accruals
            .into_iter()
            .map(|(symbol, delta_units, from_ms)| CoreEvent::StabilityAccrued { vault_id, symbol, delta_units, from_ms, to_ms: now_ms })
            .collect()
    }

    /// Collateral value in the oracle's pricing unit, plus the strictest
    /// (maximum) `min_cr_bps` among symbols the vault currently owes
    /// (spec section 4.7: "governed by the strictest symbol").
    fn collateral_value_and_strictest_cr(&self, vault: &Vault, oracle: &OracleRegistry, clock: Clock) -> CoreResult<(u128, u64)> {
        let price = oracle.price_checked(&self.collateral_symbol, clock)?;
        let collateral_value = vault.collateral_units.safe_mul(price)?;
        let mut strictest = 0u64;
        for symbol in vault.debt_symbols() {
            let params = self.registry.params(&symbol)?;
            strictest = strictest.max(params.min_cr_bps);
        }
        Ok((collateral_value, strictest))
    }

    fn total_debt_value(&self, vault: &Vault, oracle: &OracleRegistry, clock: Clock) -> CoreResult<u128> {
        let mut total = 0u128;
        for symbol in vault.debt_symbols() {
            let price = oracle.price_checked(&symbol, clock)?;
            let units = vault.debt_of(&symbol);
            total = total.safe_add(units.safe_mul(price)?)?;
        }
        Ok(total)
    }

    pub fn deposit_collateral(&mut self, clock: Clock, vault_id: u64, amount: u128) -> CoreResult<Vec<CoreEvent>> {
        let vault = self.vault_mut(vault_id)?;
        vault.collateral_units = vault.collateral_units.safe_add(amount)?;
        let owner = vault.owner.clone();
        Ok(vec![CoreEvent::CollateralDeposited { vault_id, amount, actor: owner, ts: clock.now_ms }])
    }

    pub fn withdraw_collateral(&mut self, clock: Clock, vault_id: u64, amount: u128, oracle: &OracleRegistry) -> CoreResult<Vec<CoreEvent>> {
        let accruals = self.accrue_all(vault_id, clock)?;
        let mut events = Self::stability_events(vault_id, accruals, clock.now_ms);

        let vault = self.vault_mut(vault_id)?;
        if amount > vault.collateral_units {
            return Err(ErrorCode::InsufficientEscrow);
        }
        let new_units = vault.collateral_units - amount;
        let owner = vault.owner.clone();

        if vault.has_any_debt() {
            let mut probe = vault.clone();
            probe.collateral_units = new_units;
            self.require_cr_ok(&probe, oracle, clock)?;
        }

        let vault = self.vault_mut(vault_id)?;
        vault.collateral_units = new_units;
        events.push(CoreEvent::CollateralWithdrawn { vault_id, amount, actor: owner, ts: clock.now_ms });
        Ok(events)
    }

    fn require_cr_ok(&self, vault: &Vault, oracle: &OracleRegistry, clock: Clock) -> CoreResult<()> {
        if !vault.has_any_debt() {
            return Ok(());
        }
        let (collateral_value, min_cr_bps) = self.collateral_value_and_strictest_cr(vault, oracle, clock)?;
        let debt_value = self.total_debt_value(vault, oracle, clock)?;
        if collateral_value.safe_mul(BPS_DENOMINATOR)? < debt_value.safe_mul(min_cr_bps as u128)? {
            return Err(ErrorCode::CrBreach);
        }
        Ok(())
    }

    /// `mint_synthetic`: charges `mint_bps`, requires post-mint CR to
    /// satisfy the strictest symbol's `min_cr_bps` across the vault's
    /// full debt set (spec section 4.7). The mint fee is entirely
    /// governed by the symbol's own `SyntheticParams::mint_bps`, so this
    /// takes no `FeeConfig` -- that struct's UNXV/staking discount stack
    /// (spec section 4.3) applies to orderbook trading fees, not synth
    /// mint/burn fees.
    pub fn mint_synthetic(
        &mut self,
        clock: Clock,
        vault_id: u64,
        symbol: &str,
        amount: u128,
        oracle: &OracleRegistry,
        fee_vault: &mut FeeVault,
    ) -> CoreResult<Vec<CoreEvent>> {
        if !self.registry.is_known(symbol) {
            return Err(ErrorCode::UnknownSymbol);
        }
        let params = self.registry.params(symbol)?;
        if params.paused {
            return Err(ErrorCode::SymbolPaused);
        }

        let accruals = self.accrue_all(vault_id, clock)?;
        let mut events = Self::stability_events(vault_id, accruals, clock.now_ms);

        let new_total_units = self.registry.total_debt_units(symbol).safe_add(amount)?;
        if new_total_units > params.debt_ceiling {
            return Err(ErrorCode::CeilingExceeded);
        }

        let vault = self.vault_mut(vault_id)?;
        let entry = vault.debts.entry(symbol.to_string()).or_insert(0);
        *entry = entry.safe_add(amount)?;
        let probe = vault.clone();
        let owner = vault.owner.clone();

        self.require_cr_ok(&probe, oracle, clock)?;
        self.registry.set_total_debt_units(symbol, new_total_units);

        let price = oracle.price_checked(symbol, clock)?;
        let minted_value = amount.safe_mul(price)?;
        let fee_value = mul_bps_floor(minted_value, params.mint_bps)?;
        if fee_value > 0 {
            fee_vault.accrue_generic(symbol, fee_value.safe_div(price.max(1))?)?;
        }

        events.push(CoreEvent::SyntheticMinted { vault_id, symbol: symbol.to_string(), amount, ts: clock.now_ms });
        let _ = owner;
        Ok(events)
    }

    /// `burn_synthetic`: reduces debt units; partial burn permitted. Same
    /// `FeeConfig`-free fee model as `mint_synthetic` -- the burn fee comes
    /// from `SyntheticParams::burn_bps`.
    pub fn burn_synthetic(&mut self, clock: Clock, vault_id: u64, symbol: &str, amount: u128, fee_vault: &mut FeeVault) -> CoreResult<Vec<CoreEvent>> {
        let params = self.registry.params(symbol)?;
        let accruals = self.accrue_all(vault_id, clock)?;
        let mut events = Self::stability_events(vault_id, accruals, clock.now_ms);

        let vault = self.vault_mut(vault_id)?;
        let owed = vault.debt_of(symbol);
        if amount > owed {
            return Err(ErrorCode::InsufficientEscrow);
        }
        let entry = vault.debts.entry(symbol.to_string()).or_insert(0);
        *entry -= amount;

        let new_total = self.registry.total_debt_units(symbol).saturating_sub(amount);
        self.registry.set_total_debt_units(symbol, new_total);

        let fee = mul_bps_floor(amount, params.burn_bps)?;
        if fee > 0 {
            fee_vault.accrue_generic(symbol, fee)?;
        }

        events.push(CoreEvent::SyntheticBurned { vault_id, symbol: symbol.to_string(), amount, ts: clock.now_ms });
        Ok(events)
    }

    /// Read-only health probe for one (vault, symbol), used by
    /// [`crate::liquidation::LiquidationDispatcher::account_solvency`] to
    /// decide which symbols are worth an actual `liquidate_vault` call.
    /// Does not run stability accrual -- a caller wanting a fully
    /// up-to-date figure should drive a keeper accrual step first (or
    /// simply call `liquidate_vault`, which accrues internally before
    /// checking).
    pub fn is_symbol_breached(&self, vault_id: u64, symbol: &str, oracle: &OracleRegistry, clock: Clock) -> CoreResult<bool> {
        let params = self.registry.params(symbol)?;
        let vault = self.vault(vault_id)?;
        let owed = vault.debt_of(symbol);
        if owed == 0 {
            return Ok(false);
        }
        let debt_price = oracle.price_checked(symbol, clock)?;
        let debt_value = owed.safe_mul(debt_price)?;
        let collateral_price = oracle.price_checked(&self.collateral_symbol, clock)?;
        let collateral_value = vault.collateral_units.safe_mul(collateral_price)?;
        Ok(collateral_value.safe_mul(BPS_DENOMINATOR)? < debt_value.safe_mul(params.liq_threshold_bps as u128)?)
    }

    /// `liquidate_vault` (per-symbol), per spec section 4.7's worked
    /// example: liquidator repays up to `repay_units` of `symbol`'s debt,
    /// seizes `repay_units * price * (10_000 + bonus_bps) / 10_000`
    /// collateral capped at what remains.
    pub fn liquidate_vault(
        &mut self,
        clock: Clock,
        vault_id: u64,
        symbol: &str,
        repay_units: u128,
        oracle: &OracleRegistry,
        liquidator: &str,
        fee_vault: &mut FeeVault,
    ) -> CoreResult<(u128, u128, Vec<CoreEvent>)> {
        let params = self.registry.params(symbol)?;
        let accruals = self.accrue_all(vault_id, clock)?;
        let mut events = Self::stability_events(vault_id, accruals, clock.now_ms);

        let vault = self.vault(vault_id)?.clone();
        let (collateral_value, _) = self.collateral_value_and_strictest_cr(&vault, oracle, clock)?;
        let debt_value = self.total_debt_value(&vault, oracle, clock)?;
        let is_unhealthy = debt_value > 0 && collateral_value.safe_mul(BPS_DENOMINATOR)? < debt_value.safe_mul(params.liq_threshold_bps as u128)?;
        if !is_unhealthy {
            return Err(ErrorCode::VaultHealthy);
        }

        let owed = vault.debt_of(symbol);
        let repay = repay_units.min(owed);
        let price = oracle.price_checked(symbol, clock)?;
        let seize_gross = repay.safe_mul(price)?.safe_mul(BPS_DENOMINATOR.safe_add(params.liquidation_bonus_bps as u128)?)?.safe_div(BPS_DENOMINATOR)?;
        let collateral_price = oracle.price_checked(&self.collateral_symbol, clock)?;
        let seize_collateral_units = seize_gross.safe_div(collateral_price.max(1))?.min(vault.collateral_units);

        let vault_mut = self.vault_mut(vault_id)?;
        let entry = vault_mut.debts.entry(symbol.to_string()).or_insert(0);
        *entry = entry.saturating_sub(repay);
        vault_mut.collateral_units = vault_mut.collateral_units.saturating_sub(seize_collateral_units);

        let new_total = self.registry.total_debt_units(symbol).saturating_sub(repay);
        self.registry.set_total_debt_units(symbol, new_total);

        let penalty = mul_bps_floor(repay.safe_mul(price)?, params.liquidation_bonus_bps)?;
        fee_vault.accrue_generic(symbol, penalty)?;

        events.push(CoreEvent::LiquidationExecuted {
            vault_id,
            liquidator: liquidator.to_string(),
            liquidated_amount: repay,
            collateral_seized: seize_collateral_units,
            penalty,
            symbol: symbol.to_string(),
            ts: clock.now_ms,
        });

        Ok((repay, seize_collateral_units, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::feed::FeedReading;

    fn setup() -> (SynthVaultBook, OracleRegistry, FeeVault) {
        let admin = AdminCap::new();
        let mut book = SynthVaultBook::new("USDC");
        book.set_symbol(
            &admin,
            "sBTC",
            SyntheticParams {
                decimals: 8,
                min_cr_bps: 15_000,
                liq_threshold_bps: 12_000,
                stability_fee_bps_per_year: 200,
                liquidation_bonus_bps: 1_200,
                mint_bps: 50,
                burn_bps: 50,
                debt_ceiling: u128::MAX,
                paused: false,
            },
        )
        .unwrap();

        let mut oracle = OracleRegistry::new();
        oracle.set_feed(&admin, "USDC", 1, 1_000_000);
        oracle.set_feed(&admin, "sBTC", 2, 1_000_000);
        oracle.push_reading("USDC", FeedReading { price: 1_000_000, confidence_bps: 1, twap: 1_000_000, last_update_ms: 0 }).unwrap();
        oracle.push_reading("sBTC", FeedReading { price: 1_000 * 1_000_000, confidence_bps: 1, twap: 1_000 * 1_000_000, last_update_ms: 0 }).unwrap();

        (book, oracle, FeeVault::new())
    }

    #[test]
    fn mint_requires_min_cr() {
        let (mut book, oracle, mut fv) = setup();
        let clock = Clock::at(0);
        let (vault_id, _) = book.create_vault(clock, "alice");
        // 1,500 collateral units @ price 1.0, min_cr 150%, debt 1 sBTC @
        // $1,000 -> CR exactly 150%: allowed at the boundary.
        book.deposit_collateral(clock, vault_id, 1_500).unwrap();
        assert!(book.mint_synthetic(clock, vault_id, "sBTC", 1, &oracle, &mut fv).is_ok());
        // one more unit would breach CR.
        assert_eq!(book.mint_synthetic(clock, vault_id, "sBTC", 1, &oracle, &mut fv), Err(ErrorCode::CrBreach));
    }

    #[test]
    fn liquidation_scenario_5() {
        let (mut book, mut oracle, mut fv) = setup();
        let clock = Clock::at(0);
        let (vault_id, _) = book.create_vault(clock, "alice");
        book.deposit_collateral(clock, vault_id, 3_000).unwrap();
        book.mint_synthetic(clock, vault_id, "sBTC", 2, &oracle, &mut fv).unwrap();

        // healthy vault refuses liquidation.
        assert_eq!(
            book.liquidate_vault(clock, vault_id, "sBTC", 1, &oracle, "liquidator", &mut fv).err(),
            Some(ErrorCode::VaultHealthy)
        );

        // price jumps to 1,300 -> CR ~115.4% < 120% threshold.
        oracle.push_reading("sBTC", FeedReading { price: 1_300 * 1_000_000, confidence_bps: 1, twap: 1_300 * 1_000_000, last_update_ms: 0 }).unwrap();

        let (repaid, seized, _events) = book.liquidate_vault(clock, vault_id, "sBTC", 1, &oracle, "liquidator", &mut fv).unwrap();
        assert_eq!(repaid, 1);
        assert!(seized > 0);
        let vault = book.vault(vault_id).unwrap();
        assert_eq!(vault.debt_of("sBTC"), 1);
        assert!(vault.collateral_units < 3_000);

        // still unhealthy: a second partial liquidation call is allowed.
        assert!(book.liquidate_vault(clock, vault_id, "sBTC", 1, &oracle, "liquidator", &mut fv).is_ok());
    }
}
