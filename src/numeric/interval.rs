// ============================================================================
// Interval
// Closed floating point interval with outward rounding
// ============================================================================

use super::errors::{ArithmeticError, ArithmeticResult};
use super::float::{two_sum, BinaryFloat};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed interval `[lo, hi]` of binary floats.
///
/// Bounds are never NaN, `lo <= hi` always holds, and the total interval
/// `(-inf, inf)` is rejected: it carries no information and every operation
/// on it would be an indeterminate form. Arithmetic rounds outward, and skips
/// the widening step whenever an error-free transform shows the endpoint
/// computation was exact.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interval<F> {
    lo: F,
    hi: F,
}

impl<F: BinaryFloat> Interval<F> {
    /// Validated constructor.
    pub fn new(lo: F, hi: F) -> ArithmeticResult<Self> {
        if lo.is_nan() || hi.is_nan() {
            return Err(ArithmeticError::IndeterminateForm("NaN interval bound"));
        }
        if lo > hi {
            return Err(ArithmeticError::IndeterminateForm("inverted interval bounds"));
        }
        if lo == F::neg_infinity() && hi == F::infinity() {
            return Err(ArithmeticError::IndeterminateForm(
                "interval spanning (-infinity, infinity)",
            ));
        }
        Ok(Self { lo, hi })
    }

    /// Degenerate interval `[x, x]`.
    pub fn point(x: F) -> ArithmeticResult<Self> {
        Self::new(x, x)
    }

    /// Caller guarantees the bounds are valid.
    #[inline]
    pub(crate) fn from_bounds(lo: F, hi: F) -> Self {
        debug_assert!(Self::new(lo, hi).is_ok(), "invalid interval [{:?}, {:?}]", lo, hi);
        Self { lo, hi }
    }

    #[inline]
    pub fn lo(&self) -> F {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> F {
        self.hi
    }

    pub fn set_bounds(&mut self, lo: F, hi: F) -> ArithmeticResult<()> {
        *self = Self::new(lo, hi)?;
        Ok(())
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }

    /// The single value of a degenerate interval. The upper bound is used so
    /// `[-0, +0]` reads as `+0`.
    #[inline]
    pub fn as_scalar(&self) -> Option<F> {
        if self.is_degenerate() {
            Some(self.hi)
        } else {
            None
        }
    }

    #[inline]
    pub fn contains(&self, x: F) -> bool {
        self.lo <= x && x <= self.hi
    }

    #[inline]
    pub fn contains_zero(&self) -> bool {
        self.contains(F::zero())
    }

    /// Zero lies strictly inside.
    #[inline]
    pub fn straddles_zero(&self) -> bool {
        self.lo < F::zero() && F::zero() < self.hi
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.lo.is_zero() && self.hi.is_zero()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite()
    }

    #[inline]
    pub fn has_infinite_bound(&self) -> bool {
        self.lo.is_infinite() || self.hi.is_infinite()
    }

    /// Entirely on the nonpositive side without being zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.hi <= F::zero() && self.lo < F::zero()
    }

    /// `hi - lo`, rounded up.
    pub fn width(&self) -> F {
        sum_up(self.hi, -self.lo)
    }

    pub fn negate(&mut self) {
        let lo = self.lo;
        self.lo = -self.hi;
        self.hi = -lo;
    }

    pub fn negated(mut self) -> Self {
        self.negate();
        self
    }

    /// Enclosure of a possibly inexact quotient of two scalars.
    pub fn enclose_quotient(numerator: F, denominator: F) -> ArithmeticResult<Self> {
        if denominator.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Self::new(
            quotient_down(numerator, denominator),
            quotient_up(numerator, denominator),
        )
    }

    /// Smallest interval enclosing the exact value of `numerator / denominator`
    /// given as integers.
    pub fn enclose_ratio(numerator: i128, denominator: i128) -> ArithmeticResult<Self> {
        if denominator == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        let (n_lo, n_hi) = enclose_integer::<F>(numerator);
        let (d_lo, d_hi) = enclose_integer::<F>(denominator);
        let numerator = Self::new(n_lo, n_hi)?;
        let denominator = Self::new(d_lo, d_hi)?;
        numerator.div(denominator)
    }

    // ------------------------------------------------------------------------
    // Outward-rounded arithmetic. Results may be invalid (NaN, total); callers
    // route them through the overflow-checked primitives which validate.
    // ------------------------------------------------------------------------

    pub fn add_raw(self, rhs: Self) -> (F, F) {
        (sum_down(self.lo, rhs.lo), sum_up(self.hi, rhs.hi))
    }

    pub fn mul_raw(self, rhs: Self) -> (F, F) {
        let pairs = [
            (self.lo, rhs.lo),
            (self.lo, rhs.hi),
            (self.hi, rhs.lo),
            (self.hi, rhs.hi),
        ];
        let mut lo = F::infinity();
        let mut hi = F::neg_infinity();
        for (a, b) in pairs {
            lo = lo.min(product_down(a, b));
            hi = hi.max(product_up(a, b));
        }
        (lo, hi)
    }

    pub fn square_raw(self) -> (F, F) {
        if self.straddles_zero() {
            let lo_sq = product_up(self.lo, self.lo);
            let hi_sq = product_up(self.hi, self.hi);
            return (F::zero(), lo_sq.max(hi_sq));
        }
        let (near, far) = if self.lo >= F::zero() {
            (self.lo, self.hi)
        } else {
            (self.hi, self.lo)
        };
        (product_down(near, near), product_up(far, far))
    }

    pub fn div(self, rhs: Self) -> ArithmeticResult<Self> {
        let (lo, hi) = self.div_raw(rhs)?;
        Self::new(lo, hi)
    }

    pub fn div_raw(self, rhs: Self) -> ArithmeticResult<(F, F)> {
        if rhs.contains_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        let pairs = [
            (self.lo, rhs.lo),
            (self.lo, rhs.hi),
            (self.hi, rhs.lo),
            (self.hi, rhs.hi),
        ];
        let mut lo = F::infinity();
        let mut hi = F::neg_infinity();
        for (a, b) in pairs {
            lo = lo.min(quotient_down(a, b));
            hi = hi.max(quotient_up(a, b));
        }
        Ok((lo, hi))
    }
}

impl<F: BinaryFloat> fmt::Display for Interval<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

// ============================================================================
// Directed Rounding Helpers
// ============================================================================

#[inline]
pub fn sum_down<F: BinaryFloat>(a: F, b: F) -> F {
    let (s, e) = two_sum(a, b);
    if s.is_finite() && e < F::zero() {
        s.step_down()
    } else {
        s
    }
}

#[inline]
pub fn sum_up<F: BinaryFloat>(a: F, b: F) -> F {
    let (s, e) = two_sum(a, b);
    if s.is_finite() && e > F::zero() {
        s.step_up()
    } else {
        s
    }
}

#[inline]
pub fn product_down<F: BinaryFloat>(a: F, b: F) -> F {
    if a.is_zero() || b.is_zero() {
        return F::zero();
    }
    let p = a * b;
    if !p.is_finite() {
        return p;
    }
    if !p.is_normal() {
        return p.step_down();
    }
    if a.mul_add(b, -p) < F::zero() {
        p.step_down()
    } else {
        p
    }
}

#[inline]
pub fn product_up<F: BinaryFloat>(a: F, b: F) -> F {
    if a.is_zero() || b.is_zero() {
        return F::zero();
    }
    let p = a * b;
    if !p.is_finite() {
        return p;
    }
    if !p.is_normal() {
        return p.step_up();
    }
    if a.mul_add(b, -p) > F::zero() {
        p.step_up()
    } else {
        p
    }
}

fn quotient_is_exact<F: BinaryFloat>(q: F, a: F, b: F) -> bool {
    q.is_normal() && q.mul_add(b, -a).is_zero()
}

#[inline]
pub fn quotient_down<F: BinaryFloat>(a: F, b: F) -> F {
    if a.is_zero() {
        return F::zero();
    }
    if a.is_infinite() && b.is_infinite() {
        return if a.is_sign_negative() == b.is_sign_negative() {
            F::zero()
        } else {
            F::neg_infinity()
        };
    }
    let q = a / b;
    if !q.is_finite() || b.is_infinite() || quotient_is_exact(q, a, b) {
        q
    } else {
        q.step_down()
    }
}

#[inline]
pub fn quotient_up<F: BinaryFloat>(a: F, b: F) -> F {
    if a.is_zero() {
        return F::zero();
    }
    if a.is_infinite() && b.is_infinite() {
        return if a.is_sign_negative() == b.is_sign_negative() {
            F::infinity()
        } else {
            F::zero()
        };
    }
    let q = a / b;
    if !q.is_finite() || b.is_infinite() || quotient_is_exact(q, a, b) {
        q
    } else {
        q.step_up()
    }
}

/// Bounds enclosing an integer that may not be exactly representable.
pub fn enclose_integer<F: BinaryFloat>(value: i128) -> (F, F) {
    let magnitude = value.unsigned_abs();
    let (lo, hi) = if magnitude <= u64::MAX as u128 {
        let m = magnitude as u64;
        match F::from_u64_exact(m) {
            Some(exact) => (exact, exact),
            None => {
                let rounded = F::from_u64_rounded(m);
                (rounded.step_down(), rounded.step_up())
            },
        }
    } else {
        // beyond u64 only needs to be enclosed, not tight
        let rounded = F::from(magnitude).unwrap_or_else(F::infinity);
        (rounded.step_down(), rounded.step_up())
    };
    if value < 0 {
        (-hi, -lo)
    } else {
        (lo, hi)
    }
}
