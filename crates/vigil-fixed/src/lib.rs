//! # vigil-fixed
//!
//! Non-negative fixed-point numbers with 18 decimals for prices and ratios.
//!
//! A [`Fix`] wraps a [`rust_decimal::Decimal`] that is never negative and
//! never carries more than 18 fractional digits. Every product or quotient is
//! brought back to 18 places with a rounding mode chosen by the caller.
//!
//! ## Rounding
//!
//! - [`Rounding::Floor`]: toward zero
//! - [`Rounding::Round`]: to nearest, ties away from zero (the default for
//!   [`Fix::mul`])
//! - [`Rounding::Ceil`]: away from zero
//!
//! ## Modules
//!
//! - [`format`]: decimal string parsing, display and serde

pub mod format;

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional decimal digits.
pub const DECIMALS: u32 = 18;

/// Error types for fixed-point arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedError {
    /// Division by a zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// Result does not fit in the decimal range.
    #[error("fixed-point overflow")]
    Overflow,

    /// Result would go below zero.
    #[error("fixed-point underflow")]
    Underflow,

    /// Value has more than 18 fractional digits.
    #[error("more than {DECIMALS} decimals: {0}")]
    Precision(String),

    /// Malformed decimal string.
    #[error("invalid fixed-point literal: {0}")]
    Parse(String),
}

/// Convenience result type for fixed-point operations.
pub type Result<T> = std::result::Result<T, FixedError>;

/// Rounding mode applied when a result is brought back to 18 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rounding {
    /// Truncate toward zero.
    Floor,
    /// Round to nearest; exact halves go up.
    Round,
    /// Any remainder rounds up.
    Ceil,
}

impl Rounding {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Rounding::Floor => RoundingStrategy::ToZero,
            Rounding::Round => RoundingStrategy::MidpointAwayFromZero,
            Rounding::Ceil => RoundingStrategy::AwayFromZero,
        }
    }
}

/// A non-negative fixed-point number with at most 18 decimals.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Fix(Decimal);

impl Fix {
    /// Zero.
    pub const ZERO: Fix = Fix(Decimal::ZERO);

    /// One.
    pub const ONE: Fix = Fix(Decimal::ONE);

    /// Smallest positive value, `10^-18`.
    pub const EPSILON: Fix = Fix::from_parts(1, DECIMALS);

    /// Largest representable value. Also used as the "unbounded" high price.
    pub const MAX: Fix = Fix(Decimal::MAX);

    /// `value / 10^decimals`, for constants. `decimals` above 18 is treated
    /// as 18.
    pub const fn from_parts(value: u64, decimals: u32) -> Self {
        let scale = if decimals > DECIMALS { DECIMALS } else { decimals };
        Fix(Decimal::from_parts(
            value as u32,
            (value >> 32) as u32,
            0,
            false,
            scale,
        ))
    }

    /// Whole number `n`.
    pub const fn from_int(n: u64) -> Self {
        Fix::from_parts(n, 0)
    }

    /// Convert an integer reported with `decimals` fractional digits.
    ///
    /// Oracle feeds commonly report answers as integers with their own
    /// decimal count, e.g. `100_000_000` with 8 decimals is `1.0`. Digits
    /// past the 18th decimal are truncated.
    ///
    /// # Errors
    ///
    /// - [`FixedError::Overflow`] if the value does not fit
    pub fn from_scaled(value: u128, decimals: u32) -> Result<Self> {
        let mantissa = i128::try_from(value).map_err(|_| FixedError::Overflow)?;
        let decimal = Decimal::try_from_i128_with_scale(mantissa, decimals)
            .map_err(|_| FixedError::Overflow)?;
        Ok(Fix::rounded(decimal, Rounding::Floor))
    }

    /// The underlying decimal.
    pub fn to_decimal(self) -> Decimal {
        self.0.normalize()
    }

    fn rounded(value: Decimal, rounding: Rounding) -> Fix {
        Fix(value.round_dp_with_strategy(DECIMALS, rounding.strategy()))
    }

    /// Whether the value is zero.
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Fix) -> Result<Fix> {
        self.0
            .checked_add(rhs.0)
            .map(Fix)
            .ok_or(FixedError::Overflow)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: Fix) -> Result<Fix> {
        if rhs > self {
            return Err(FixedError::Underflow);
        }
        self.0
            .checked_sub(rhs.0)
            .map(Fix)
            .ok_or(FixedError::Underflow)
    }

    /// `self * rhs`, rounded to nearest.
    pub fn mul(self, rhs: Fix) -> Result<Fix> {
        self.mul_rounded(rhs, Rounding::Round)
    }

    /// `self * rhs` with an explicit rounding mode.
    ///
    /// # Errors
    ///
    /// - [`FixedError::Overflow`] if the product does not fit
    pub fn mul_rounded(self, rhs: Fix, rounding: Rounding) -> Result<Fix> {
        self.0
            .checked_mul(rhs.0)
            .map(|product| Fix::rounded(product, rounding))
            .ok_or(FixedError::Overflow)
    }

    /// `self * num / den` for integer factors, e.g. remaining seconds over a
    /// timeout.
    ///
    /// # Errors
    ///
    /// - [`FixedError::DivisionByZero`] if `den` is zero
    /// - [`FixedError::Overflow`] if an intermediate does not fit
    pub fn mul_div_int(self, num: u64, den: u64, rounding: Rounding) -> Result<Fix> {
        if den == 0 {
            return Err(FixedError::DivisionByZero);
        }
        self.0
            .checked_mul(Decimal::from(num))
            .and_then(|product| product.checked_div(Decimal::from(den)))
            .map(|quotient| Fix::rounded(quotient, rounding))
            .ok_or(FixedError::Overflow)
    }

    /// `1 - self`.
    ///
    /// # Errors
    ///
    /// - [`FixedError::Underflow`] if `self > 1`
    pub fn complement(self) -> Result<Fix> {
        Fix::ONE.checked_sub(self)
    }
}

impl TryFrom<Decimal> for Fix {
    type Error = FixedError;

    fn try_from(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FixedError::Underflow);
        }
        let value = value.normalize();
        if value.scale() > DECIMALS {
            return Err(FixedError::Precision(value.to_string()));
        }
        // Drops the sign of a negative zero.
        Ok(Fix(value.abs()))
    }
}

impl From<Fix> for Decimal {
    fn from(value: Fix) -> Self {
        value.to_decimal()
    }
}

impl fmt::Debug for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fix({self})")
    }
}
