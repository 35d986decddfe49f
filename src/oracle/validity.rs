//! Oracle guard rails beyond bare staleness, grounded on the teacher's
//! `math/oracle_validity.rs` + `state/guard_rails.rs`. Spec section 4.2
//! only requires the staleness/allow-list gate (`StalePrice`,
//! `UnknownSymbol`, `NegativePrice`); this module supplies the additional
//! confidence/volatility checks every consumer of this crate's risk
//! checks expects from the pack, as an `OracleValidity` classification
//! layered on top of the spec's gate rather than a replacement for it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ErrorCode};
use crate::fixed_math::safe_math::SafeMath;
use crate::oracle::feed::FeedReading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleValidity {
    Valid,
    Uncertain,
    Volatile,
    Invalid,
}

/// Admin-configurable guard rails, defaulting to the teacher's own
/// defaults (2% confidence divergence, 5x volatility ratio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleGuardRails {
    /// Confidence interval width, as bps of price, above which a reading
    /// is `Uncertain`.
    pub confidence_max_bps: u64,
    /// Ratio (price vs. twap, whichever is larger, over whichever is
    /// smaller) above which a reading is `Volatile`.
    pub max_volatility_ratio: u64,
}

impl Default for OracleGuardRails {
    fn default() -> Self {
        OracleGuardRails {
            confidence_max_bps: 200,
            max_volatility_ratio: 5,
        }
    }
}

/// Classifies a feed reading. Does not itself enforce staleness -- that is
/// the registry's job (spec section 4.2) -- this only adds the confidence
/// and volatility dimensions the teacher's `oracle_validity` carries.
pub fn classify(reading: &FeedReading, guard_rails: &OracleGuardRails) -> CoreResult<OracleValidity> {
    let price = reading.price_as_micro()?;

    let twap = if reading.twap > 0 {
        reading.twap as u128
    } else {
        price
    };

    let hi = price.max(twap);
    let lo = price.min(twap).max(1);
    let ratio = hi.safe_div(lo)?;
    if ratio > guard_rails.max_volatility_ratio as u128 {
        return Ok(OracleValidity::Volatile);
    }

    let confidence_bps = reading.confidence_bps as u128;
    if confidence_bps > guard_rails.confidence_max_bps as u128 {
        return Ok(OracleValidity::Uncertain);
    }

    Ok(OracleValidity::Valid)
}

impl OracleValidity {
    /// Whether a risk check may proceed; fail-closed on anything but
    /// `Valid`, matching spec section 7's "oracle failures abort the
    /// operation" rule.
    pub fn is_usable(self) -> bool {
        matches!(self, OracleValidity::Valid)
    }

    pub fn into_error(self) -> Option<ErrorCode> {
        match self {
            OracleValidity::Valid => None,
            OracleValidity::Uncertain => Some(ErrorCode::OracleUncertain),
            OracleValidity::Volatile => Some(ErrorCode::OracleVolatile),
            OracleValidity::Invalid => Some(ErrorCode::NegativePrice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(price: i128, twap: i128, confidence_bps: u64) -> FeedReading {
        FeedReading { price, confidence_bps, twap, last_update_ms: 0 }
    }

    #[test]
    fn valid_when_within_bounds() {
        let g = OracleGuardRails::default();
        let r = reading(1_000_000, 1_000_000, 10);
        assert_eq!(classify(&r, &g).unwrap(), OracleValidity::Valid);
    }

    #[test]
    fn volatile_when_price_diverges_from_twap() {
        let g = OracleGuardRails::default();
        let r = reading(10_000_000, 1_000_000, 10);
        assert_eq!(classify(&r, &g).unwrap(), OracleValidity::Volatile);
    }

    #[test]
    fn uncertain_when_confidence_too_wide() {
        let g = OracleGuardRails::default();
        let r = reading(1_000_000, 1_000_000, 500);
        assert_eq!(classify(&r, &g).unwrap(), OracleValidity::Uncertain);
    }
}
