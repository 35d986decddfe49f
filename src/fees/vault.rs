//! FeeVault (spec section 3 / 4.3): the sink for protocol fees, keyed by
//! asset type tag (here, a plain string symbol since this crate has no
//! on-chain type-tag mechanism). Grounded on the teacher's `state/market.rs`
//! fee-pool fields, generalized from a single quote asset to any asset.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fixed_math::safe_math::SafeMath;
use crate::error::CoreResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeVault {
    balances: HashMap<String, u128>,
    /// UNXV held under the treasury key after the stakers/burn split.
    treasury_unxv: u128,
}

impl FeeVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// `accrue_generic`: credits `amount` of `asset` to the vault.
    pub fn accrue_generic(&mut self, asset: &str, amount: u128) -> CoreResult<()> {
        let entry = self.balances.entry(asset.to_string()).or_insert(0);
        *entry = entry.safe_add(amount)?;
        Ok(())
    }

    pub fn balance_of(&self, asset: &str) -> u128 {
        *self.balances.get(asset).unwrap_or(&0)
    }

    pub fn treasury_unxv(&self) -> u128 {
        self.treasury_unxv
    }

    pub(crate) fn credit_treasury_unxv(&mut self, amount: u128) -> CoreResult<()> {
        self.treasury_unxv = self.treasury_unxv.safe_add(amount)?;
        Ok(())
    }

    /// Debits `amount` of `asset`, used when the vault pays out a claim
    /// (e.g. a maker's per-order escrow draws down the vault's escrow
    /// ledger rather than the fee ledger -- see `orderbook::market`).
    pub fn debit(&mut self, asset: &str, amount: u128) -> CoreResult<()> {
        let entry = self.balances.entry(asset.to_string()).or_insert(0);
        *entry = entry.checked_sub(amount).ok_or(crate::error::ErrorCode::Underflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrual_accumulates_per_asset() {
        let mut v = FeeVault::new();
        v.accrue_generic("USDC", 100).unwrap();
        v.accrue_generic("USDC", 50).unwrap();
        v.accrue_generic("BTC", 1).unwrap();
        assert_eq!(v.balance_of("USDC"), 150);
        assert_eq!(v.balance_of("BTC"), 1);
    }
}
