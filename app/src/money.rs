//! This module contains definitions for monetary amounts. Balances are stored as decimal amounts,
//! while the payout gateway only ever sees integer minor units.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

/// A signed balance or balance delta, in major currency units.
#[derive(Debug, Clone, Copy, Default, PartialOrd, PartialEq)]
pub struct Amount(pub f64);

/// An amount in minor currency units (cents).
#[derive(Debug, Clone, Copy, Default, PartialOrd, Ord, PartialEq, Eq)]
pub struct Cents(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Eur,
}

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Converts to minor units, rounding to the nearest cent. Returns `None` if the result does
    /// not fit in an `i64`.
    pub fn cents(&self) -> Option<Cents> {
        let cents = (self.0 * 100.0).round();
        // i64::MAX as f64 rounds up to 2^63, which is already out of range.
        if cents.is_finite() && cents >= i64::MIN as f64 && cents < i64::MAX as f64 {
            Some(Cents(cents as i64))
        } else {
            None
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "eur",
        }
    }
}
