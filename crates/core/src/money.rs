use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// A transaction amount, always carried to exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    pub fn to_decimal(self) -> Decimal {
        self.0
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn one() -> Self {
        Money(Decimal::ONE)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Parses a spreadsheet amount cell. Tolerates thousands separators
    /// (spaces, non-breaking spaces) and a comma decimal mark.
    pub fn parse(s: &str) -> Result<Self, rust_decimal::Error> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        Decimal::from_str(&cleaned).map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_decimal_rounds_to_two_places() {
        let m = Money::from_decimal(Decimal::from_str("10.006").unwrap());
        assert_eq!(m.to_string(), "10.01");
        let m = Money::from_decimal(Decimal::from_str("10.004").unwrap());
        assert_eq!(m.to_string(), "10.00");
    }

    #[test]
    fn parse_plain() {
        assert_eq!(Money::parse("123.45").unwrap().to_string(), "123.45");
    }

    #[test]
    fn parse_comma_decimal_mark() {
        assert_eq!(Money::parse("123,45").unwrap().to_string(), "123.45");
    }

    #[test]
    fn parse_with_thousands_spaces() {
        assert_eq!(Money::parse("1 234 567.89").unwrap().to_string(), "1234567.89");
        assert_eq!(Money::parse("1\u{a0}234,50").unwrap().to_string(), "1234.50");
    }

    #[test]
    fn parse_negative() {
        assert!(!Money::parse("-50.00").unwrap().is_positive());
    }

    #[test]
    fn parse_invalid() {
        assert!(Money::parse("not_a_number").is_err());
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn sum_is_exact() {
        let total: Money = ["0.10", "0.20", "0.30"]
            .iter()
            .map(|s| Money::parse(s).unwrap())
            .sum();
        assert_eq!(total.to_string(), "0.60");
    }

    #[test]
    fn zero_is_not_positive() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::one().is_positive());
    }
}
