//! Mark-price TWAP (spec section 4.9), grounded on the teacher's
//! `math/twap.rs::weighted_average`/`calculate_twap`: a time-weighted
//! blend of the previous TWAP and the incoming sample, weighted by the
//! elapsed time on each side, re-expressed on this crate's `u128`
//! micro-price convention and checked-math traits instead of the
//! teacher's `i64`/`saturating_*` pair.

use crate::error::CoreResult;
use crate::fixed_math::safe_math::SafeMath;

/// Blends `data_point_1` (the previous TWAP) and `data_point_2` (the new
/// sample) by their respective weightages. A zero weightage on either side
/// short-circuits to the other data point untouched, matching the
/// teacher's zero-weightage escape hatch.
pub fn weighted_average(data_point_1: u128, data_point_2: u128, weightage_1: u64, weightage_2: u64) -> CoreResult<u128> {
    if weightage_1 == 0 {
        return Ok(data_point_2);
    }
    if weightage_2 == 0 {
        return Ok(data_point_1);
    }
    let denominator = (weightage_1 as u128).safe_add(weightage_2 as u128)?;
    let previous_weighted = data_point_1.safe_mul(weightage_1 as u128)?;
    let current_weighted = data_point_2.safe_mul(weightage_2 as u128)?;
    previous_weighted.safe_add(current_weighted)?.safe_div(denominator)
}

/// `calculate_twap`: derives the backwards/forwards weightages from
/// elapsed wall-clock time the way the teacher does -- `backwards` is the
/// time since the last TWAP update (clamped at 0), `forwards` is whatever
/// remains of the averaging period (clamped at 1 so a same-instant update
/// never divides by zero).
pub fn calculate_twap(curr_price: u128, curr_ms: u64, last_twap: u128, last_ts_of_twap_ms: u64, period_ms: u64) -> CoreResult<u128> {
    let backwards = curr_ms.saturating_sub(last_ts_of_twap_ms);
    let forwards = period_ms.saturating_sub(backwards).max(1);
    weighted_average(last_twap, curr_price, backwards.min(u64::MAX), forwards)
}
