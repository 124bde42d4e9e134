// ============================================================================
// Power Term
// A base raised to an integer exponent, kept in normal form
// ============================================================================

use crate::numeric::{ArithmeticError, ArithmeticResult, BinaryFloat, Interval, LossyArithmetic};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Values that can serve as the base of a [`PowerTerm`].
pub trait PowerBase: LossyArithmetic + fmt::Debug + PartialEq {
    type Float: BinaryFloat;

    fn zero() -> Self;
    fn one() -> Self;
    fn is_zero_base(&self) -> bool;
    fn is_one_base(&self) -> bool;
    fn is_minus_one_base(&self) -> bool;

    /// Interval enclosing this value.
    fn enclose(&self) -> Interval<Self::Float>;
}

macro_rules! impl_scalar_base {
    ($t:ty) => {
        impl PowerBase for $t {
            type Float = $t;

            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn is_zero_base(&self) -> bool {
                *self == 0.0
            }

            fn is_one_base(&self) -> bool {
                *self == 1.0
            }

            fn is_minus_one_base(&self) -> bool {
                *self == -1.0
            }

            fn enclose(&self) -> Interval<$t> {
                Interval::from_bounds(*self, *self)
            }
        }
    };
}

macro_rules! impl_interval_base {
    ($t:ty) => {
        impl PowerBase for Interval<$t> {
            type Float = $t;

            fn zero() -> Self {
                Interval::from_bounds(0.0, 0.0)
            }

            fn one() -> Self {
                Interval::from_bounds(1.0, 1.0)
            }

            fn is_zero_base(&self) -> bool {
                self.is_zero()
            }

            fn is_one_base(&self) -> bool {
                self.as_scalar() == Some(1.0)
            }

            fn is_minus_one_base(&self) -> bool {
                self.as_scalar() == Some(-1.0)
            }

            fn enclose(&self) -> Interval<$t> {
                *self
            }
        }
    };
}

impl_scalar_base!(f32);
impl_scalar_base!(f64);
impl_interval_base!(f32);
impl_interval_base!(f64);

/// `base^exponent` in normal form.
///
/// - a nonzero exponent unless the base is zero (`0^0` is kept and fails on
///   evaluation);
/// - bases `1` and `-1` only with exponent 1 (`(-1)^even` becomes `1^1`);
/// - any `x^0` with `x != 0` becomes `1^1`.
///
/// Negative exponents are kept until [`PowerTerm::standardize`] moves them
/// onto an enclosing interval of `1 / base`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerTerm<B> {
    base: B,
    exponent: i64,
}

impl<B: PowerBase> PowerTerm<B> {
    pub fn new(base: B, exponent: i64) -> Self {
        let mut term = Self { base, exponent };
        term.normalize();
        term
    }

    /// `base^1`
    pub fn of(base: B) -> Self {
        Self::new(base, 1)
    }

    fn normalize(&mut self) {
        if self.base.is_zero_base() {
            if self.exponent > 0 {
                self.exponent = 1;
            }
            return;
        }
        if self.exponent == 0 || self.base.is_one_base() {
            *self = Self {
                base: B::one(),
                exponent: 1,
            };
            return;
        }
        if self.base.is_minus_one_base() {
            if self.exponent % 2 == 0 {
                self.base = B::one();
            }
            self.exponent = 1;
        }
    }

    #[inline]
    pub fn base(&self) -> &B {
        &self.base
    }

    #[inline]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// `0^0`
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.exponent == 0
    }

    /// Same value with a nonnegative exponent over an interval base. A
    /// negative exponent is carried by an enclosure of `1 / base`.
    pub fn standardize(&self) -> ArithmeticResult<PowerTerm<Interval<B::Float>>>
    where
        Interval<B::Float>: PowerBase,
    {
        let base = self.base.enclose();
        if self.exponent >= 0 {
            return Ok(PowerTerm::new(base, self.exponent));
        }
        let exponent = self
            .exponent
            .checked_neg()
            .ok_or(ArithmeticError::Overflow("power exponent"))?;
        let reciprocal = <Interval<B::Float> as PowerBase>::one().lossy_quotient(base)?;
        Ok(PowerTerm::new(reciprocal, exponent))
    }

    /// Base and nonnegative exponent, reciprocating the base through lossy
    /// division when the exponent is negative.
    pub fn positive_parts(&self) -> ArithmeticResult<(B, u64)> {
        if self.exponent >= 0 {
            return Ok((self.base, self.exponent as u64));
        }
        if self.base.is_zero_base() {
            return Err(ArithmeticError::DivisionByZero);
        }
        let reciprocal = B::one().lossy_quotient(self.base)?;
        Ok((reciprocal, self.exponent.unsigned_abs()))
    }

    /// Evaluate by repeated squaring through the overflow-checked primitives.
    pub fn eval(&self) -> ArithmeticResult<B> {
        if self.is_degenerate() {
            return Err(ArithmeticError::IndeterminateForm("zero to the power zero"));
        }
        let (base, exponent) = self.positive_parts()?;
        power_by_squaring(base, B::one(), exponent)
    }
}

/// `base^exponent` with `base^0 == one`.
pub(crate) fn power_by_squaring<B: LossyArithmetic>(
    base: B,
    one: B,
    exponent: u64,
) -> ArithmeticResult<B> {
    let mut result = one;
    let mut square = base;
    let mut remaining = exponent;
    while remaining > 0 {
        if remaining % 2 == 1 {
            result = result.lossy_product(square)?;
            remaining -= 1;
        } else {
            square = square.lossy_square()?;
            remaining /= 2;
        }
    }
    Ok(result)
}

impl<B: PowerBase + fmt::Display> fmt::Display for PowerTerm<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}^{}", self.base, self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normal_forms() {
        assert_eq!(PowerTerm::new(5.0f64, 0), PowerTerm::new(1.0, 1));
        assert_eq!(PowerTerm::new(1.0f64, 42).exponent(), 1);
        assert_eq!(PowerTerm::new(0.0f64, 7).exponent(), 1);
        assert!(PowerTerm::new(0.0f64, 0).is_degenerate());

        let even = PowerTerm::new(-1.0f64, 10);
        assert_eq!((*even.base(), even.exponent()), (1.0, 1));
        let odd = PowerTerm::new(-1.0f64, -3);
        assert_eq!((*odd.base(), odd.exponent()), (-1.0, 1));

        let kept = PowerTerm::new(3.0f64, -2);
        assert_eq!(kept.exponent(), -2);
    }

    #[test]
    fn test_eval() {
        assert_eq!(PowerTerm::new(3.0f64, 4).eval(), Ok(81.0));
        assert_eq!(PowerTerm::new(2.0f64, -3).eval(), Ok(0.125));
        assert_eq!(PowerTerm::new(7.0f64, 0).eval(), Ok(1.0));
        assert!(matches!(
            PowerTerm::new(0.0f64, 0).eval(),
            Err(ArithmeticError::IndeterminateForm(_))
        ));
        assert_eq!(
            PowerTerm::new(0.0f64, -1).eval(),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_eval_overflow() {
        assert!(matches!(
            PowerTerm::new(10.0f64, 400).eval(),
            Err(ArithmeticError::Overflow(_))
        ));
        assert_eq!(PowerTerm::new(f64::INFINITY, 3).eval(), Ok(f64::INFINITY));
    }

    #[test]
    fn test_standardize_negative_exponent() {
        let term = PowerTerm::new(3.0f64, -2).standardize().unwrap();
        assert_eq!(term.exponent(), 2);
        assert!(term.base().contains(1.0 / 3.0));
        assert!(!term.base().is_degenerate());

        let value = term.eval().unwrap();
        assert!(value.contains(1.0 / 9.0));
    }

    #[test]
    fn test_standardize_exact_reciprocal() {
        let term = PowerTerm::new(4.0f32, -1).standardize().unwrap();
        assert_eq!(term.base().as_scalar(), Some(0.25));
    }

    #[test]
    fn test_interval_base() {
        let base = Interval::new(-2.0f64, 3.0).unwrap();
        let squared = PowerTerm::new(base, 2).eval().unwrap();
        assert_eq!(squared, Interval::new(0.0, 9.0).unwrap());
        let minus_one = Interval::point(-1.0f64).unwrap();
        assert_eq!(PowerTerm::new(minus_one, 4).base().as_scalar(), Some(1.0));
    }

    proptest! {
        #[test]
        fn prop_small_powers_match_powi(x in -8.0f64..8.0, n in 0i64..12) {
            let expected = x.powi(n as i32);
            let actual = PowerTerm::new(x, n).eval();
            if x == 0.0 && n == 0 {
                prop_assert!(actual.is_err());
            } else {
                // squaring rounds in a different order than powi
                let actual = actual.unwrap();
                prop_assert!((actual - expected).abs() <= expected.abs() * 1e-13 + 1e-300);
            }
        }
    }
}
