//! Vault<C> (spec section 4.7): a user's USDC-collateralized synthetic
//! debt position. Grounded on the teacher's `state/user_position.rs`
//! scaled-balance idiom for the collateral side, generalized to a
//! multi-symbol debt map with lazy per-symbol stability accrual.

use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Vault {
    pub id: u64,
    pub owner: String,
    pub collateral_units: u128,
    pub debts: HashMap<String, u128>,
    pub last_stability_accrual_ms: HashMap<String, u64>,
}

impl Vault {
    pub fn debt_of(&self, symbol: &str) -> u128 {
        *self.debts.get(symbol).unwrap_or(&0)
    }

    pub fn has_any_debt(&self) -> bool {
        self.debts.values().any(|u| *u > 0)
    }

    pub fn debt_symbols(&self) -> Vec<String> {
        self.debts.iter().filter(|(_, u)| **u > 0).map(|(s, _)| s.clone()).collect()
    }
}
