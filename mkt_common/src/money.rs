use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::{
    error::BoxDynError,
    sqlite::{SqliteTypeInfo, SqliteValueRef},
    Decode,
    Sqlite,
    Type,
};
use thiserror::Error;

use crate::op;

//--------------------------------------       Money         ---------------------------------------------------------
/// A fixed-point monetary amount in Indonesian rupiah.
///
/// Whole amounts display without decimals ("Rp 125,000"). Anything with a fraction shows exactly two decimal places
/// ("Rp 4,500.50").
///
/// Amounts are never converted to floating point. In SQLite they are stored as TEXT, so that the exact decimal
/// representation survives a round trip through the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a monetary amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim())
            .map(Self)
            .map_err(|e| MoneyConversionError(format!("'{s}' is not a valid decimal amount. {e}")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.2}", rounded.abs());
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, "00")) => (w, None),
            Some((w, frac)) => (w, Some(frac)),
            None => (digits.as_str(), None),
        };
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, c) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        match fraction {
            Some(frac) => write!(f, "{sign}Rp {grouped}.{frac}"),
            None => write!(f, "{sign}Rp {grouped}"),
        }
    }
}

impl Type<Sqlite> for Money {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Sqlite> for Money {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<Sqlite>>::decode(value)?;
        Ok(text.parse::<Money>()?)
    }
}

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The exact decimal representation, without currency symbol or grouping. This is the storage format.
    pub fn to_plain_string(&self) -> String {
        self.0.to_string()
    }

    /// Rounds to `dp` decimal places, with midpoints rounded away from zero (i.e. "half-up" for positive amounts).
    pub fn round_half_up(&self, dp: u32) -> Self {
        Self(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Divides the amount into `parts` equal shares, rounded half-up to 2 decimal places. Dividing by zero yields zero.
    pub fn average_over(&self, parts: usize) -> Self {
        if parts == 0 {
            return Self::zero();
        }
        Self(self.0 / Decimal::from(parts)).round_half_up(2)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_is_exact() {
        let a: Money = "0.10".parse().unwrap();
        let b: Money = "0.20".parse().unwrap();
        assert_eq!(a + b, "0.30".parse().unwrap());
        assert_eq!(Money::from(12_500) * 3, Money::from(37_500));
        let total: Money = [Money::from(1), Money::from(2), Money::from(3)].iter().sum();
        assert_eq!(total, Money::from(6));
        let mut m = Money::from(10);
        m -= Money::from(4);
        assert_eq!(m, Money::from(6));
    }

    #[test]
    fn average_rounds_half_up() {
        let total: Money = "100".parse().unwrap();
        assert_eq!(total.average_over(3), "33.33".parse().unwrap());
        let total: Money = "0.05".parse().unwrap();
        assert_eq!(total.average_over(2), "0.03".parse().unwrap());
        assert_eq!(total.average_over(0), Money::zero());
    }

    #[test]
    fn display() {
        assert_eq!(Money::from(0).to_string(), "Rp 0");
        assert_eq!(Money::from(999).to_string(), "Rp 999");
        assert_eq!(Money::from(125_000).to_string(), "Rp 125,000");
        assert_eq!(Money::from(1_250_000).to_string(), "Rp 1,250,000");
        assert_eq!("-4500.5".parse::<Money>().unwrap().to_string(), "-Rp 4,500.50");
        assert_eq!("4500.5".parse::<Money>().unwrap().to_string(), "Rp 4,500.50");
        assert_eq!("118333.333".parse::<Money>().unwrap().to_string(), "Rp 118,333.33");
        assert_eq!("0.005".parse::<Money>().unwrap().to_string(), "Rp 0.01");
        assert_eq!("15000.00".parse::<Money>().unwrap().to_string(), "Rp 15,000");
        assert_eq!("-0.001".parse::<Money>().unwrap().to_string(), "Rp 0");
    }

    #[test]
    fn parsing() {
        assert!("12abc".parse::<Money>().is_err());
        let m: Money = " 15000.00 ".parse().unwrap();
        assert_eq!(m, Money::from(15_000));
        assert_eq!(m.to_plain_string(), "15000.00");
    }
}
