//! SyntheticRegistry (spec section 3): per-symbol configuration for a
//! mintable synthetic asset. Grounded on the teacher's `state/market.rs`
//! per-market parameter struct, generalized from a single spot market to
//! a registry of synthetic symbols each with their own CR/fee/ceiling
//! parameters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::error::{CoreResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticParams {
    pub decimals: u8,
    pub min_cr_bps: u64,
    pub liq_threshold_bps: u64,
    pub stability_fee_bps_per_year: u64,
    pub liquidation_bonus_bps: u64,
    pub mint_bps: u64,
    pub burn_bps: u64,
    pub debt_ceiling: u128,
    pub paused: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyntheticRegistry {
    symbols: HashMap<String, SyntheticParams>,
    total_debt_units: HashMap<String, u128>,
}

impl SyntheticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_symbol(&mut self, _admin: &AdminCap, symbol: &str, params: SyntheticParams) -> CoreResult<()> {
        if params.min_cr_bps <= params.liq_threshold_bps {
            // min_cr must stay strictly above the liquidation threshold,
            // otherwise a freshly-minted position at exactly min_cr would
            // already be liquidatable (spec section 4.7/8).
            return Err(ErrorCode::CeilingExceeded);
        }
        self.symbols.insert(symbol.to_string(), params);
        Ok(())
    }

    pub fn params(&self, symbol: &str) -> CoreResult<SyntheticParams> {
        self.symbols.get(symbol).copied().ok_or(ErrorCode::UnknownSymbol)
    }

    pub fn total_debt_units(&self, symbol: &str) -> u128 {
        *self.total_debt_units.get(symbol).unwrap_or(&0)
    }

    pub(crate) fn set_total_debt_units(&mut self, symbol: &str, units: u128) {
        self.total_debt_units.insert(symbol.to_string(), units);
    }

    pub fn is_known(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }
}
