//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

use serde::{Deserialize, Serialize};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" a
/// value object, create a new one with the new values.
///
/// The trait requires:
/// - **Clone**: value objects are cheap to copy
/// - **PartialEq**: compared by their attribute values
/// - **Debug**: helpful for logging and tests
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Monetary amount in minor currency units (e.g. cents).
///
/// Amounts arrive from the wire as loosely-typed decimals; they are rounded to
/// cents once, at the boundary, so arithmetic afterwards is exact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Convert a decimal amount in major units, rounding half away from zero.
    ///
    /// Non-finite input yields zero.
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Self::ZERO;
        }
        Self((amount * 100.0).round() as i64)
    }

    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    pub const fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        self.saturating_add(rhs)
    }
}

impl core::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        self.saturating_sub(rhs)
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(12.345).minor_units(), 1235);
        assert_eq!(Money::from_major(0.1 + 0.2).minor_units(), 30);
        assert_eq!(Money::from_major(-4.5).minor_units(), -450);
    }

    #[test]
    fn non_finite_amounts_become_zero() {
        assert_eq!(Money::from_major(f64::NAN), Money::ZERO);
        assert_eq!(Money::from_major(f64::INFINITY), Money::ZERO);
    }

    #[test]
    fn arithmetic_is_exact() {
        let total = Money::from_major(450.10);
        let paid = Money::from_major(200.05);
        assert_eq!((total - paid).minor_units(), 25005);
        let sum: Money = [total, paid].into_iter().sum();
        assert_eq!(sum.minor_units(), 65015);
    }
}
