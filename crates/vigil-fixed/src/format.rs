//! Decimal string parsing and display.
//!
//! [`Fix`] values serialize as decimal strings (`"1.98001"`) through
//! [`rust_decimal`]'s serde support, so configuration files and JSON reports
//! never round-trip through floats.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{Fix, FixedError};

impl FromStr for Fix {
    type Err = FixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = Decimal::from_str(s).map_err(|_| FixedError::Parse(s.to_string()))?;
        Fix::try_from(value)
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_decimal(), f)
    }
}
