//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are Chilean pesos. The backend sends them as plain JSON numbers,
//! so the wire form stays numeric while arithmetic is done on [`Decimal`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price in CLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of pesos.
    #[must_use]
    pub fn from_pesos(pesos: i64) -> Self {
        Self(Decimal::from(pesos))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `percent`% of this price (e.g. `percent(10)` for a 10% discount).
    #[must_use]
    pub fn percent(&self, percent: u32) -> Self {
        let factor = Decimal::from(percent);
        self.0.checked_mul(factor).map_or_else(
            || Self((self.0 / Decimal::ONE_HUNDRED).saturating_mul(factor)),
            |scaled| Self(scaled / Decimal::ONE_HUNDRED),
        )
    }

    /// Subtract, saturating at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(Decimal::ZERO))
    }

    /// Whole number of `unit`s contained in this price, rounded down.
    ///
    /// Used for loyalty points: one point per 1000 pesos spent.
    #[must_use]
    pub fn whole_units_of(&self, unit: u32) -> u32 {
        if unit == 0 || self.0 <= Decimal::ZERO {
            return 0;
        }
        (self.0 / Decimal::from(unit))
            .floor()
            .to_u32()
            .unwrap_or(u32::MAX)
    }
}

/// Saturates at `Decimal::MAX`/`Decimal::MIN` instead of panicking.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// Saturates at `Decimal::MAX`/`Decimal::MIN` instead of panicking.
impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as CLP with `.` thousands separators: `$1.234.567`.
///
/// Fractions are rounded to the nearest peso.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round();
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = rounded.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if negative {
            write!(f, "-${grouped}")
        } else {
            write!(f, "${grouped}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_pesos(0).to_string(), "$0");
        assert_eq!(Price::from_pesos(999).to_string(), "$999");
        assert_eq!(Price::from_pesos(1000).to_string(), "$1.000");
        assert_eq!(Price::from_pesos(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Price::new(Decimal::new(199_906, 1)).to_string(), "$19.991");
    }

    #[test]
    fn test_percent_and_saturating_sub() {
        let subtotal = Price::from_pesos(30_000);
        let discount = subtotal.percent(10);
        assert_eq!(discount, Price::from_pesos(3000));
        assert_eq!(subtotal.saturating_sub(discount), Price::from_pesos(27_000));
        assert_eq!(discount.saturating_sub(subtotal), Price::ZERO);
    }

    #[test]
    fn test_whole_units_of() {
        assert_eq!(Price::from_pesos(999).whole_units_of(1000), 0);
        assert_eq!(Price::from_pesos(27_000).whole_units_of(1000), 27);
        assert_eq!(Price::from_pesos(27_999).whole_units_of(1000), 27);
        assert_eq!(Price::from_pesos(-5000).whole_units_of(1000), 0);
        assert_eq!(Price::from_pesos(5000).whole_units_of(0), 0);
    }

    #[test]
    fn test_json_is_numeric() {
        let price: Price = serde_json::from_str("1000").unwrap();
        assert_eq!(price, Price::from_pesos(1000));
        let price: Price = serde_json::from_str("29990.0").unwrap();
        assert_eq!(price, Price::from_pesos(29_990));

        let json = serde_json::to_value(Price::from_pesos(1000)).unwrap();
        assert!(json.is_number());
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_overflowing() {
        let huge = Price::new(Decimal::MAX);
        assert_eq!(huge + Price::from_pesos(1), huge);
        assert_eq!(huge * 2, huge);
        assert_eq!(Price::new(Decimal::MIN) * 3, Price::new(Decimal::MIN));
        assert_eq!([huge, huge, huge].into_iter().sum::<Price>(), huge);
        assert_eq!(huge.saturating_sub(Price::new(Decimal::MIN)), huge);
        assert!(huge.percent(10) > Price::ZERO);
        assert_eq!(huge.whole_units_of(1000), u32::MAX);
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from_pesos(1000), Price::from_pesos(2500)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_pesos(3500));
    }
}
