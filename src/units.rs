use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{BotError, Result};

/// A user-entered amount together with its smallest-unit representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub human: Decimal,
    pub units: U256,
    pub decimals: u8,
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.human)
    }
}

/// Parses a positive decimal amount and converts it to smallest units.
///
/// Fractional digits beyond `decimals` are truncated. Anything that is empty,
/// non-numeric, zero or negative (including values that truncate to zero) is
/// rejected with [`BotError::InvalidAmount`].
pub fn parse_amount(input: &str, decimals: u8) -> Result<Amount> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BotError::InvalidAmount);
    }

    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| BotError::InvalidAmount)?;

    let human = value.trunc_with_scale(u32::from(decimals)).normalize();
    if human <= Decimal::ZERO {
        return Err(BotError::InvalidAmount);
    }

    let units = decimal_to_units(human, decimals).map_err(|_| BotError::InvalidAmount)?;
    Ok(Amount { human, units, decimals })
}

/// Parses a strictly positive transfer count.
pub fn parse_count(input: &str) -> Result<u32> {
    match input.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(BotError::InvalidCount),
    }
}

/// Converts a non-negative decimal to smallest units, rounding to `decimals` places.
pub fn decimal_to_units(value: Decimal, decimals: u8) -> Result<U256> {
    let rounded = value.round_dp(u32::from(decimals)).normalize();
    parse_units(&rounded.to_string(), decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| BotError::Config(format!("cannot convert {rounded} to units: {e}")))
}

/// Formats smallest units as a human amount without trailing zeros.
pub fn format_amount(units: U256, decimals: u8) -> String {
    let formatted = format_units(units, decimals).unwrap_or_else(|_| units.to_string());
    trim_fraction(&formatted)
}

fn trim_fraction(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted.to_string()
    }
}

/// Converts a wei value to gwei with two decimals, for the banner.
pub fn format_gwei(wei: u128) -> String {
    let gwei = format_units(U256::from(wei), "gwei").unwrap_or_else(|_| wei.to_string());
    match Decimal::from_str(&gwei) {
        Ok(value) => format!("{:.2}", value),
        Err(_) => gwei,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_amount_converts_to_wei_and_back() {
        let amount = parse_amount("1.5", 18).unwrap();
        assert_eq!(amount.units, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(format_amount(amount.units, 18), "1.5");
    }

    #[test]
    fn stable_amount_uses_six_decimals() {
        let amount = parse_amount("2.345678", 6).unwrap();
        assert_eq!(amount.units, U256::from(2_345_678u64));
        assert_eq!(format_amount(amount.units, 6), "2.345678");
    }

    #[test]
    fn extra_precision_is_truncated_not_rounded() {
        let amount = parse_amount("0.1234569", 6).unwrap();
        assert_eq!(amount.units, U256::from(123_456u64));
        assert_eq!(amount.human.to_string(), "0.123456");
    }

    #[test]
    fn smallest_unit_round_trips() {
        let amount = parse_amount("0.000000000000000001", 18).unwrap();
        assert_eq!(amount.units, U256::from(1u64));
        assert_eq!(format_amount(amount.units, 18), "0.000000000000000001");
    }

    #[test]
    fn whole_numbers_and_scientific_notation_are_accepted() {
        assert_eq!(parse_amount(" 3 ", 18).unwrap().units, U256::from(3_000_000_000_000_000_000u128));
        assert_eq!(parse_amount("1e-3", 6).unwrap().units, U256::from(1_000u64));
    }

    #[test]
    fn rejects_non_positive_and_garbage() {
        for input in ["", "   ", "0", "0.0", "-1", "-0.5", "abc", "NaN", "inf", "1.2.3"] {
            assert!(
                matches!(parse_amount(input, 18), Err(BotError::InvalidAmount)),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_amounts_below_token_precision() {
        assert!(matches!(parse_amount("0.0000001", 6), Err(BotError::InvalidAmount)));
    }

    #[test]
    fn count_must_be_positive_integer() {
        assert_eq!(parse_count("5").unwrap(), 5);
        assert_eq!(parse_count(" 12\n").unwrap(), 12);
        for input in ["0", "-3", "2.5", "", "ten"] {
            assert!(matches!(parse_count(input), Err(BotError::InvalidCount)));
        }
    }

    #[test]
    fn decimal_rounds_to_token_precision() {
        let value = Decimal::from_str("1071.5684449").unwrap();
        assert_eq!(decimal_to_units(value, 6).unwrap(), U256::from(1_071_568_445u64));
    }

    #[test]
    fn gas_price_formats_as_gwei() {
        assert_eq!(format_gwei(1_500_000_000), "1.50");
        assert_eq!(format_gwei(1_234_567), "0.00");
    }
}
