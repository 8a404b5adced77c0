use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// Signed transaction amount. Negative is an outflow, positive an inflow.
///
/// The scale of the parsed value is kept as-is so `"2500.00"` prints back
/// as `2500.00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn new(decimal: Decimal) -> Self {
        Money(decimal)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Forces the amount to be an outflow.
    pub fn as_outflow(self) -> Self {
        -self.abs()
    }

    /// Forces the amount to be an inflow.
    pub fn as_inflow(self) -> Self {
        self.abs()
    }

    /// `None` when the result falls outside the decimal range.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(decimal: Decimal) -> Self {
        Money(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Normalise "-0" so zero never prints with a sign.
        if self.0.is_zero() {
            write!(f, "{}", self.0.abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money(-self.0)
    }
}
