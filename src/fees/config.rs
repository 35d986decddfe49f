//! FeeConfig (spec section 3): taker/maker bps, UNXV discount, staking
//! tiers and the lending-specific fee params, set once by governance and
//! mutated only through admin setters thereafter -- grounded on the
//! teacher's `state/config.rs::State` parameter struct.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::admin::AdminCap;
use crate::error::{CoreResult, ErrorCode};

pub const MAX_BPS: u64 = 10_000;

/// One entry of the ordered stake-tier table: `min_stake` UNXV staked
/// unlocks `discount_bps` off taker and maker fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct StakeTier {
    pub min_stake: u128,
    pub discount_bps: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct FeeConfig {
    pub taker_bps: u64,
    pub maker_bps: u64,
    pub unxv_discount_bps: u64,
    pub pool_creation_fee_unxv: u128,
    /// Strictly increasing on both `min_stake` and `discount_bps` per
    /// spec section 3 -- validated on every admin write.
    pub stake_tiers: Vec<StakeTier>,
    pub lending_origination_bps: u64,
    pub lending_cf_bonus_bps_max: u64,
    /// Split of the UNXV fee stream: stakers / treasury / burn, bps of the
    /// UNXV fee, must sum to `MAX_BPS` (spec section 4.3).
    pub unxv_stakers_share_bps: u64,
    pub unxv_treasury_share_bps: u64,
    pub unxv_burn_share_bps: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig {
            taker_bps: 10,
            maker_bps: 5,
            unxv_discount_bps: 3,
            pool_creation_fee_unxv: 0,
            stake_tiers: vec![
                StakeTier { min_stake: 1_000, discount_bps: 5 },
                StakeTier { min_stake: 10_000, discount_bps: 10 },
                StakeTier { min_stake: 100_000, discount_bps: 20 },
            ],
            lending_origination_bps: 10,
            lending_cf_bonus_bps_max: 500,
            unxv_stakers_share_bps: 5_000,
            unxv_treasury_share_bps: 4_000,
            unxv_burn_share_bps: 1_000,
        }
    }
}

impl FeeConfig {
    /// Validates the invariants spec section 3 states: every bps in
    /// `[0, 10_000]`, tiers strictly increasing on both dimensions.
    pub fn validate(&self) -> CoreResult<()> {
        let bpses = [
            self.taker_bps,
            self.maker_bps,
            self.unxv_discount_bps,
            self.lending_origination_bps,
            self.lending_cf_bonus_bps_max,
            self.unxv_stakers_share_bps,
            self.unxv_treasury_share_bps,
            self.unxv_burn_share_bps,
        ];
        for bps in bpses {
            if bps > MAX_BPS {
                return Err(ErrorCode::BadPrice);
            }
        }
        if self.unxv_stakers_share_bps + self.unxv_treasury_share_bps + self.unxv_burn_share_bps != MAX_BPS {
            return Err(ErrorCode::BadPrice);
        }
        let mut last_stake = 0u128;
        let mut last_discount = 0u64;
        for (i, tier) in self.stake_tiers.iter().enumerate() {
            if tier.discount_bps > MAX_BPS {
                return Err(ErrorCode::BadPrice);
            }
            if i > 0 && (tier.min_stake <= last_stake || tier.discount_bps <= last_discount) {
                return Err(ErrorCode::BadPrice);
            }
            last_stake = tier.min_stake;
            last_discount = tier.discount_bps;
        }
        Ok(())
    }

    /// Highest tier the user qualifies for, i.e. the last tier in the
    /// ascending table whose `min_stake <= user_stake`.
    pub fn tier_for_stake(&self, user_stake: u128) -> Option<&StakeTier> {
        self.stake_tiers.iter().rev().find(|t| t.min_stake <= user_stake)
    }

    pub fn set(&mut self, _admin: &AdminCap, new_cfg: FeeConfig) -> CoreResult<()> {
        new_cfg.validate()?;
        *self = new_cfg;
        Ok(())
    }
}
