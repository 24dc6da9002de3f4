use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::Error;

pub const CENTS_PER_UNIT: i64 = 100;

/// Parses a plain decimal amount such as "1250.50" or "-3".
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s).ok()
}

/// Absolute value in cents, rounding half away from zero.
pub fn minor_units(amount: Decimal) -> Result<i64, Error> {
    amount
        .abs()
        .checked_mul(Decimal::from(CENTS_PER_UNIT))
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or(Error::AmountOutOfRange(amount))
}

/// Absolute cents, zero-padded to `width` digits.
pub fn cents_field(amount: Decimal, width: usize) -> Result<String, Error> {
    Ok(zero_pad(minor_units(amount)?, width))
}

pub fn zero_pad(value: impl core::fmt::Display, width: usize) -> String {
    format!("{:0>width$}", value.to_string(), width = width)
}
