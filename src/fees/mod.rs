//! FeeEngine (spec section 4.3): computes effective bps after UNXV/stake
//! discounts and routes protocol fees into the shared [`FeeVault`] and
//! [`StakingPool`] reward buckets. Grounded on the teacher's
//! fee-calculation call sites in `state/market.rs` (there: a single
//! taker/maker bps pair with no discount layer; here generalized to the
//! spec's two-stage discount stack).

pub mod config;
pub mod vault;

pub use config::{FeeConfig, StakeTier, MAX_BPS};
pub use vault::FeeVault;

use crate::error::CoreResult;
use crate::fixed_math::mul_bps_floor;
use crate::staking::StakingPool;

/// `apply_discounts` per spec section 4.3: fixed order of operations --
/// UNXV payment discount first, then the staking tier discount, each
/// floored at 0 bps. No volume-tier discount, no maker rebate.
pub fn apply_discounts(
    taker_bps: u64,
    maker_bps: u64,
    paying_in_unxv: bool,
    user_stake: u128,
    cfg: &FeeConfig,
) -> (u64, u64) {
    let mut taker = taker_bps;
    let mut maker = maker_bps;

    if paying_in_unxv {
        taker = taker.saturating_sub(cfg.unxv_discount_bps);
    }

    if let Some(tier) = cfg.tier_for_stake(user_stake) {
        taker = taker.saturating_sub(tier.discount_bps);
        maker = maker.saturating_sub(tier.discount_bps);
    }

    (taker, maker)
}

/// `accrue_generic`: credits the input asset to the vault keyed by its
/// type tag (here, its symbol string).
pub fn accrue_generic(vault: &mut FeeVault, asset: &str, amount: u128) -> CoreResult<()> {
    vault.accrue_generic(asset, amount)
}

/// `accrue_unxv_and_split`: splits a UNXV fee into stakers / treasury /
/// burn shares per `cfg`. Stakers' share is deposited into the current
/// weekly reward bucket; treasury share is held under the treasury key;
/// burn share is irrevocably removed (never credited anywhere -- the
/// caller's UNXV balance primitive already debited it on transfer-in, so
/// simply not crediting it back out is the burn).
pub fn accrue_unxv_and_split(
    vault: &mut FeeVault,
    staking: &mut StakingPool,
    now_ms: u64,
    unxv_in: u128,
    cfg: &FeeConfig,
) -> CoreResult<()> {
    let stakers_share = mul_bps_floor(unxv_in, cfg.unxv_stakers_share_bps)?;
    let treasury_share = mul_bps_floor(unxv_in, cfg.unxv_treasury_share_bps)?;
    // Burn share is whatever floor-rounding leaves over, so the three
    // shares always sum to `unxv_in` exactly -- the rounding discrepancy
    // goes to the burn, never back to a claimant (spec section 8's fee
    // conservation property: never negative, discrepancy favors the
    // protocol, not a claimant).

    staking.add_weekly_reward(now_ms, "UNXV", stakers_share)?;
    vault.credit_treasury_unxv(treasury_share)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unxv_and_stake_discounts_compose_and_floor_at_zero() {
        let cfg = FeeConfig::default();
        let (taker, maker) = apply_discounts(cfg.taker_bps, cfg.maker_bps, true, 1_000_000, &cfg);
        // taker: 10 - 3 (unxv) - 20 (top tier) would be negative -> floors at 0
        assert_eq!(taker, 0);
        assert_eq!(maker, 0);
    }

    #[test]
    fn no_discounts_when_not_paying_unxv_and_unstaked() {
        let cfg = FeeConfig::default();
        let (taker, maker) = apply_discounts(cfg.taker_bps, cfg.maker_bps, false, 0, &cfg);
        assert_eq!(taker, cfg.taker_bps);
        assert_eq!(maker, cfg.maker_bps);
    }

    #[test]
    fn unxv_split_sums_to_input_and_credits_stakers_and_treasury() {
        let cfg = FeeConfig::default();
        let mut vault = FeeVault::new();
        let mut staking = StakingPool::new();
        accrue_unxv_and_split(&mut vault, &mut staking, 0, 1_000, &cfg).unwrap();
        let epoch = StakingPool::epoch_of(0);
        assert_eq!(staking.claim("someone-with-no-stake", epoch, "UNXV").unwrap(), 0);
        assert_eq!(vault.treasury_unxv(), 400);
    }
}
