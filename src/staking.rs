//! Staking (spec section 4.4): per-user active stake used for FeeEngine
//! discounts and weekly revenue-share claims. Grounded on the teacher's
//! balance-tracking idiom (`math/balance.rs`/`math/spot_balance.rs`) --
//! scaled principal tracked directly rather than through an index, since
//! stake itself does not accrue interest (only its reward bucket does).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ErrorCode};
use crate::fixed_math::safe_math::SafeMath;

pub const WEEK_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EpochBucket {
    /// Snapshot of total active stake taken lazily on first touch of this
    /// epoch (spec section 4.4). `None` until that first touch.
    total_stake_snapshot: Option<u128>,
    rewards: HashMap<String, u128>,
    /// Per-user stake snapshot at first touch, and per-user claimed flags
    /// keyed by asset so a user can claim each asset's reward once.
    user_stake_snapshot: HashMap<String, u128>,
    claimed: HashMap<(String, String), bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakingPool {
    active_stake: HashMap<String, u128>,
    total_active_stake: u128,
    epochs: HashMap<u64, EpochBucket>,
}

impl StakingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch_of(now_ms: u64) -> u64 {
        now_ms / WEEK_MS
    }

    pub fn active_stake_of(&self, user: &str) -> u128 {
        *self.active_stake.get(user).unwrap_or(&0)
    }

    pub fn total_active_stake(&self) -> u128 {
        self.total_active_stake
    }

    /// `stake(user, amount)`: adds to `active_stake[user]` and the pool's
    /// current epoch total is updated lazily (the epoch's snapshot is
    /// taken on first read of that epoch per spec section 4.4, so a
    /// deposit after the snapshot was taken does not retroactively change
    /// the reward split for that epoch).
    pub fn stake(&mut self, user: &str, amount: u128) -> CoreResult<()> {
        let entry = self.active_stake.entry(user.to_string()).or_insert(0);
        *entry = entry.safe_add(amount)?;
        self.total_active_stake = self.total_active_stake.safe_add(amount)?;
        Ok(())
    }

    /// `unstake(user, amount)`: fails if it would go below zero.
    pub fn unstake(&mut self, user: &str, amount: u128) -> CoreResult<()> {
        let entry = self.active_stake.entry(user.to_string()).or_insert(0);
        if *entry < amount {
            return Err(ErrorCode::InsufficientEscrow);
        }
        *entry -= amount;
        self.total_active_stake = self.total_active_stake.safe_sub(amount)?;
        if *entry == 0 {
            self.active_stake.remove(user);
        }
        Ok(())
    }

    fn touch_epoch(&mut self, epoch: u64, user: &str) -> &mut EpochBucket {
        let total = self.total_active_stake;
        let user_stake = self.active_stake_of(user);
        let bucket = self.epochs.entry(epoch).or_default();
        if bucket.total_stake_snapshot.is_none() {
            bucket.total_stake_snapshot = Some(total);
        }
        bucket.user_stake_snapshot.entry(user.to_string()).or_insert(user_stake);
        bucket
    }

    /// `add_weekly_reward(asset, amount)`: deposits into the current
    /// epoch's bucket, `epoch = floor(now_ms / WEEK_MS)`.
    pub fn add_weekly_reward(&mut self, now_ms: u64, asset: &str, amount: u128) -> CoreResult<()> {
        let epoch = Self::epoch_of(now_ms);
        // Snapshot at first touch uses total stake at reward-deposit time
        // if the epoch has never been read before.
        let bucket = self.epochs.entry(epoch).or_default();
        if bucket.total_stake_snapshot.is_none() {
            bucket.total_stake_snapshot = Some(self.total_active_stake);
        }
        let entry = bucket.rewards.entry(asset.to_string()).or_insert(0);
        *entry = entry.safe_add(amount)?;
        Ok(())
    }

    /// `claim(user, epoch)`: pays `amount * user_stake_at_epoch /
    /// total_stake_at_epoch`, idempotent per (user, asset, epoch).
    pub fn claim(&mut self, user: &str, epoch: u64, asset: &str) -> CoreResult<u128> {
        self.touch_epoch(epoch, user);
        let bucket = self.epochs.get_mut(&epoch).ok_or(ErrorCode::UnknownSymbol)?;
        let key = (user.to_string(), asset.to_string());
        if *bucket.claimed.get(&key).unwrap_or(&false) {
            return Ok(0);
        }
        let total_stake = bucket.total_stake_snapshot.unwrap_or(0);
        if total_stake == 0 {
            return Ok(0);
        }
        let user_stake = *bucket.user_stake_snapshot.get(user).unwrap_or(&0);
        let reward_pool = *bucket.rewards.get(asset).unwrap_or(&0);
        let payout = reward_pool.safe_mul(user_stake)?.safe_div(total_stake)?;
        bucket.claimed.insert(key, true);
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_and_unstake_track_totals() {
        let mut p = StakingPool::new();
        p.stake("alice", 100).unwrap();
        p.stake("bob", 300).unwrap();
        assert_eq!(p.total_active_stake(), 400);
        p.unstake("alice", 100).unwrap();
        assert_eq!(p.active_stake_of("alice"), 0);
        assert_eq!(p.total_active_stake(), 300);
    }

    #[test]
    fn unstake_below_zero_rejected() {
        let mut p = StakingPool::new();
        p.stake("alice", 10).unwrap();
        assert!(p.unstake("alice", 11).is_err());
    }

    #[test]
    fn claim_splits_pro_rata_and_is_idempotent() {
        let mut p = StakingPool::new();
        p.stake("alice", 100).unwrap();
        p.stake("bob", 300).unwrap();
        let epoch = StakingPool::epoch_of(0);
        p.add_weekly_reward(0, "UNXV", 400).unwrap();
        assert_eq!(p.claim("alice", epoch, "UNXV").unwrap(), 100);
        assert_eq!(p.claim("alice", epoch, "UNXV").unwrap(), 0);
        assert_eq!(p.claim("bob", epoch, "UNXV").unwrap(), 300);
    }
}
