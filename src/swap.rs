use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::config::SwapSettings;
use crate::error::{BotError, Result, SwapAttempt};
use crate::units::decimal_to_units;

/// Which way a swap goes between the wrapped-native and the stable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSide {
    WrappedToStable,
    StableToWrapped,
}

impl SwapSide {
    /// The router's `directions` argument is only uncertain for stable -> wrapped.
    pub fn direction_policy(self) -> DirectionPolicy {
        match self {
            SwapSide::WrappedToStable => DirectionPolicy::Fixed(0),
            SwapSide::StableToWrapped => DirectionPolicy::Fallback { primary: 1, alternate: 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionPolicy {
    Fixed(u64),
    Fallback { primary: u64, alternate: u64 },
}

impl DirectionPolicy {
    /// Directions to try, in order. Never more than two.
    pub fn directions(self) -> Vec<u64> {
        match self {
            DirectionPolicy::Fixed(direction) => vec![direction],
            DirectionPolicy::Fallback { primary, alternate } => vec![primary, alternate],
        }
    }

    /// Folds the failures of every attempt into the error reported to the user.
    /// A single-attempt policy reports its failure unchanged.
    pub fn into_error(self, mut failures: Vec<(u64, BotError)>) -> BotError {
        match self {
            DirectionPolicy::Fixed(_) if failures.len() == 1 => failures.remove(0).1,
            _ => BotError::SwapFailed {
                attempts: failures
                    .into_iter()
                    .map(|(direction, err)| SwapAttempt {
                        direction,
                        reason: err.summary(),
                    })
                    .collect(),
            },
        }
    }
}

/// Expected and minimum acceptable output of a swap, in output-token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub expected: Decimal,
    pub minimum: Decimal,
    pub expected_units: U256,
    pub minimum_units: U256,
}

/// Quotes a swap from the configured static rate.
///
/// The rate is stable-token per wrapped-token, so wrapped -> stable multiplies
/// and stable -> wrapped divides. The minimum applies `min_return_factor` to the
/// unrounded expected amount; both are rounded to the output precision.
pub fn quote(amount: Decimal, side: SwapSide, settings: &SwapSettings, out_decimals: u8) -> Result<SwapQuote> {
    let raw = match side {
        SwapSide::WrappedToStable => amount.checked_mul(settings.rate),
        SwapSide::StableToWrapped => amount.checked_div(settings.rate),
    }
    .ok_or(BotError::InvalidAmount)?;

    let raw_minimum = raw
        .checked_mul(settings.min_return_factor)
        .ok_or(BotError::InvalidAmount)?;

    let places = u32::from(out_decimals);
    let expected = raw.round_dp(places).normalize();
    let minimum = raw_minimum.round_dp(places).normalize();

    Ok(SwapQuote {
        expected,
        minimum,
        expected_units: decimal_to_units(expected, out_decimals)?,
        minimum_units: decimal_to_units(minimum, out_decimals)?,
    })
}
