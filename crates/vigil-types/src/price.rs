//! Conservative price intervals.
//!
//! A price is never a single number: it is a `[low, high]` interval whose
//! bounds are rounded outward at every step. The interval `[0, Fix::MAX]` is
//! the UNPRICED sentinel meaning "nothing is known about this price".

use serde::{Deserialize, Serialize};
use vigil_fixed::{Fix, Rounding};

/// A `[low, high]` price interval with `low <= high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceInterval {
    low: Fix,
    high: Fix,
}

impl PriceInterval {
    /// The fully-uninformative interval.
    pub const UNPRICED: PriceInterval = PriceInterval {
        low: Fix::ZERO,
        high: Fix::MAX,
    };

    /// Create an interval. Returns `None` if `low > high`.
    pub fn new(low: Fix, high: Fix) -> Option<Self> {
        (low <= high).then_some(Self { low, high })
    }

    /// `[price * (1 - error), price * (1 + error)]`, rounded outward.
    ///
    /// A high bound past [`Fix::MAX`] yields [`PriceInterval::UNPRICED`].
    ///
    /// # Errors
    ///
    /// Fails if `error > 1`.
    pub fn around(price: Fix, error: Fix) -> vigil_fixed::Result<Self> {
        let low = price.mul_rounded(error.complement()?, Rounding::Floor);
        let high = Fix::ONE
            .checked_add(error)
            .and_then(|factor| price.mul_rounded(factor, Rounding::Ceil));
        Ok(Self::saturating(low, high))
    }

    /// Lower bound.
    pub fn low(&self) -> Fix {
        self.low
    }

    /// Upper bound.
    pub fn high(&self) -> Fix {
        self.high
    }

    /// Whether this is the uninformative interval (unbounded above).
    pub fn is_unpriced(&self) -> bool {
        self.high == Fix::MAX
    }

    /// Whether `price` lies inside the interval.
    pub fn contains(&self, price: Fix) -> bool {
        self.low <= price && price <= self.high
    }

    /// Multiply both bounds by a scalar: low rounds down, high rounds up.
    ///
    /// An UNPRICED interval stays UNPRICED, and so does a product too large
    /// to represent.
    pub fn scale(&self, factor: Fix) -> Self {
        if self.is_unpriced() {
            return Self::UNPRICED;
        }
        Self::saturating(
            self.low.mul_rounded(factor, Rounding::Floor),
            self.high.mul_rounded(factor, Rounding::Ceil),
        )
    }

    /// Interval product `[a.low * b.low, a.high * b.high]` for non-negative
    /// intervals, rounded outward. Saturates to UNPRICED like [`Self::scale`].
    pub fn product(&self, other: &PriceInterval) -> Self {
        if self.is_unpriced() || other.is_unpriced() {
            return Self::UNPRICED;
        }
        Self::saturating(
            self.low.mul_rounded(other.low, Rounding::Floor),
            self.high.mul_rounded(other.high, Rounding::Ceil),
        )
    }

    /// Bounds computed independently; any failure means nothing is known.
    fn saturating(low: vigil_fixed::Result<Fix>, high: vigil_fixed::Result<Fix>) -> Self {
        match (low, high) {
            (Ok(low), Ok(high)) => Self::new(low, high).unwrap_or(Self::UNPRICED),
            _ => Self::UNPRICED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(s: &str) -> Fix {
        s.parse().expect("valid literal")
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(PriceInterval::new(fix("2"), fix("1")).is_none());
        assert!(PriceInterval::new(fix("1"), fix("1")).is_some());
    }

    #[test]
    fn test_around() {
        let interval = PriceInterval::around(Fix::ONE, fix("0.0025")).expect("around");
        assert_eq!(interval.low(), fix("0.9975"));
        assert_eq!(interval.high(), fix("1.0025"));
    }

    #[test]
    fn test_around_overflow_is_unpriced() {
        let interval = PriceInterval::around(Fix::MAX, fix("0.0025")).expect("around");
        assert!(interval.is_unpriced());
        assert!(PriceInterval::around(Fix::ONE, fix("1.5")).is_err());
    }

    #[test]
    fn test_scale_rounds_outward() {
        let third = Fix::ONE.mul_div_int(1, 3, Rounding::Floor).expect("third");
        let interval = PriceInterval::new(third, third).expect("point");
        let scaled = interval.scale(fix("0.5"));
        assert!(scaled.low() < scaled.high());
        assert_eq!(
            scaled.low().checked_add(Fix::EPSILON).expect("add"),
            scaled.high()
        );
    }

    #[test]
    fn test_scale_overflow_is_unpriced() {
        let interval = PriceInterval::new(Fix::ONE, fix("100000000000000000000"))
            .expect("interval");
        assert!(interval.scale(Fix::from_int(10_000_000_000)).is_unpriced());
        assert!(!interval.scale(Fix::from_int(2)).is_unpriced());
    }

    #[test]
    fn test_unpriced_propagates() {
        assert!(PriceInterval::UNPRICED.scale(fix("2")).is_unpriced());
        let one = PriceInterval::new(Fix::ONE, Fix::ONE).expect("point");
        assert!(one.product(&PriceInterval::UNPRICED).is_unpriced());
    }

    #[test]
    fn test_product() {
        let a = PriceInterval::new(fix("0.99"), fix("1.01")).expect("a");
        let b = PriceInterval::new(fix("2000"), fix("2010")).expect("b");
        let p = a.product(&b);
        assert_eq!(p.low(), fix("1980"));
        assert_eq!(p.high(), fix("2030.1"));
    }
}
