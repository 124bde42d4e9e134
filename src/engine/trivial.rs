// ============================================================================
// Trivial Shortcuts
// Identity, zero and infinity rules resolved before any real arithmetic
// ============================================================================
//
// Every shortcut leaves the pair (lhs, rhs) with the same exact sum, product
// or quotient it had on entry. An annihilated operand is reset to the
// operation's identity (0 for sums, 1 for products and divisors) and the
// survivor holds the complete result.

use crate::numeric::{ArithmeticError, ArithmeticResult, BinaryFloat, Interval};
use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a shortcut or rearrangement step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rearranged {
    /// Nothing applied; the caller performs the plain operation
    Unchanged,
    /// The left operand was absorbed; the right holds the result
    LhsAnnihilated,
    /// The right operand was absorbed; the left holds the result
    RhsAnnihilated,
    /// Operands changed without either being absorbed; retry shortcuts
    Progress,
}

impl Rearranged {
    /// Numeric form: 0, -1, +1 and 2.
    pub const fn code(self) -> i8 {
        match self {
            Rearranged::Unchanged => 0,
            Rearranged::LhsAnnihilated => -1,
            Rearranged::RhsAnnihilated => 1,
            Rearranged::Progress => 2,
        }
    }

    #[inline]
    pub const fn is_annihilated(self) -> bool {
        matches!(self, Rearranged::LhsAnnihilated | Rearranged::RhsAnnihilated)
    }
}

#[inline]
fn signs_differ<F: BinaryFloat>(a: F, b: F) -> bool {
    a.is_sign_negative() != b.is_sign_negative()
}

#[inline]
fn signed_zero<F: BinaryFloat>(negative: bool) -> F {
    if negative {
        -F::zero()
    } else {
        F::zero()
    }
}

#[inline]
fn signed_infinity<F: BinaryFloat>(negative: bool) -> F {
    if negative {
        F::neg_infinity()
    } else {
        F::infinity()
    }
}

// ============================================================================
// Sums
// ============================================================================

pub fn trivial_sum_scalar<F: BinaryFloat>(
    lhs: &mut F,
    rhs: &mut F,
) -> ArithmeticResult<Rearranged> {
    if rhs.is_zero() {
        // -0 + +0 is +0
        *lhs = *lhs + *rhs;
        *rhs = F::zero();
        return Ok(Rearranged::RhsAnnihilated);
    }
    if lhs.is_zero() {
        *lhs = F::zero();
        return Ok(Rearranged::LhsAnnihilated);
    }
    match (lhs.is_infinite(), rhs.is_infinite()) {
        (true, true) if signs_differ(*lhs, *rhs) => {
            Err(ArithmeticError::IndeterminateForm("infinity - infinity"))
        },
        (true, _) => {
            *rhs = F::zero();
            Ok(Rearranged::RhsAnnihilated)
        },
        (false, true) => {
            *lhs = F::zero();
            Ok(Rearranged::LhsAnnihilated)
        },
        (false, false) => Ok(Rearranged::Unchanged),
    }
}

/// One bound of an interval sum when it needs no arithmetic.
fn settled_bound_sum<F: BinaryFloat>(a: F, b: F) -> ArithmeticResult<Option<F>> {
    if a.is_infinite() && b.is_infinite() && signs_differ(a, b) {
        return Err(ArithmeticError::IndeterminateForm("infinity - infinity"));
    }
    if a.is_infinite() {
        return Ok(Some(a));
    }
    if b.is_infinite() {
        return Ok(Some(b));
    }
    if b.is_zero() {
        return Ok(Some(a + b));
    }
    if a.is_zero() {
        return Ok(Some(b));
    }
    Ok(None)
}

pub fn trivial_sum_interval<F: BinaryFloat>(
    lhs: &mut Interval<F>,
    rhs: &mut Interval<F>,
) -> ArithmeticResult<Rearranged> {
    if rhs.is_zero() {
        *rhs = zero_interval();
        return Ok(Rearranged::RhsAnnihilated);
    }
    if lhs.is_zero() {
        *lhs = zero_interval();
        return Ok(Rearranged::LhsAnnihilated);
    }
    if let (Some(mut a), Some(mut b)) = (lhs.as_scalar(), rhs.as_scalar()) {
        let outcome = trivial_sum_scalar(&mut a, &mut b)?;
        if outcome != Rearranged::Unchanged {
            *lhs = Interval::from_bounds(a, a);
            *rhs = Interval::from_bounds(b, b);
        }
        return Ok(outcome);
    }

    let lo = settled_bound_sum(lhs.lo(), rhs.lo())?;
    let hi = settled_bound_sum(lhs.hi(), rhs.hi())?;
    let reaches_down = lhs.lo() == F::neg_infinity() || rhs.lo() == F::neg_infinity();
    let reaches_up = lhs.hi() == F::infinity() || rhs.hi() == F::infinity();
    if reaches_down && reaches_up {
        return Err(ArithmeticError::IndeterminateForm(
            "interval sum spanning (-infinity, infinity)",
        ));
    }

    match (lo, hi) {
        (Some(lo), Some(hi)) => {
            // every bound settled, including zero-splices like [a, 0] + [0, b]
            *lhs = Interval::new(lo, hi)?;
            *rhs = zero_interval();
            Ok(Rearranged::RhsAnnihilated)
        },
        // an infinite bound on one side makes the other side's matching
        // bound irrelevant; peel it so only one finite bound remains
        (None, Some(_)) if lhs.hi().is_infinite() && !rhs.is_degenerate() => {
            *rhs = Interval::from_bounds(rhs.lo(), rhs.lo());
            Ok(Rearranged::Progress)
        },
        (None, Some(_)) if rhs.hi().is_infinite() && !lhs.is_degenerate() => {
            *lhs = Interval::from_bounds(lhs.lo(), lhs.lo());
            Ok(Rearranged::Progress)
        },
        (Some(_), None) if lhs.lo().is_infinite() && !rhs.is_degenerate() => {
            *rhs = Interval::from_bounds(rhs.hi(), rhs.hi());
            Ok(Rearranged::Progress)
        },
        (Some(_), None) if rhs.lo().is_infinite() && !lhs.is_degenerate() => {
            *lhs = Interval::from_bounds(lhs.hi(), lhs.hi());
            Ok(Rearranged::Progress)
        },
        _ => Ok(Rearranged::Unchanged),
    }
}

// ============================================================================
// Products
// ============================================================================

pub fn trivial_product_scalar<F: BinaryFloat>(
    lhs: &mut F,
    rhs: &mut F,
) -> ArithmeticResult<Rearranged> {
    let negative = signs_differ(*lhs, *rhs);
    if (lhs.is_zero() && rhs.is_infinite()) || (lhs.is_infinite() && rhs.is_zero()) {
        return Err(ArithmeticError::IndeterminateForm("zero times infinity"));
    }
    if *rhs == F::one() {
        return Ok(Rearranged::RhsAnnihilated);
    }
    if *lhs == F::one() {
        return Ok(Rearranged::LhsAnnihilated);
    }
    if *rhs == -F::one() {
        *lhs = -*lhs;
        *rhs = F::one();
        return Ok(Rearranged::RhsAnnihilated);
    }
    if *lhs == -F::one() {
        *rhs = -*rhs;
        *lhs = F::one();
        return Ok(Rearranged::LhsAnnihilated);
    }
    if lhs.is_zero() || rhs.is_zero() {
        *lhs = signed_zero(negative);
        *rhs = F::one();
        return Ok(Rearranged::RhsAnnihilated);
    }
    if lhs.is_infinite() || rhs.is_infinite() {
        *lhs = signed_infinity(negative);
        *rhs = F::one();
        return Ok(Rearranged::RhsAnnihilated);
    }
    Ok(Rearranged::Unchanged)
}

/// `[0, inf)` or `(-inf, 0]`
fn is_half_ray<F: BinaryFloat>(x: &Interval<F>) -> bool {
    (x.lo().is_zero() && x.hi() == F::infinity()) || (x.lo() == F::neg_infinity() && x.hi().is_zero())
}

/// Product of a half-ray with an interval that is not zero.
fn half_ray_product<F: BinaryFloat>(
    ray: &Interval<F>,
    other: &Interval<F>,
) -> ArithmeticResult<Interval<F>> {
    if other.straddles_zero() {
        return Err(ArithmeticError::IndeterminateForm(
            "interval product spanning (-infinity, infinity)",
        ));
    }
    let flips = other.is_negative();
    let upward = ray.hi() == F::infinity();
    if upward != flips {
        Interval::new(F::zero(), F::infinity())
    } else {
        Interval::new(F::neg_infinity(), F::zero())
    }
}

pub fn trivial_product_interval<F: BinaryFloat>(
    lhs: &mut Interval<F>,
    rhs: &mut Interval<F>,
) -> ArithmeticResult<Rearranged> {
    if let (Some(mut a), Some(mut b)) = (lhs.as_scalar(), rhs.as_scalar()) {
        let outcome = trivial_product_scalar(&mut a, &mut b)?;
        if outcome != Rearranged::Unchanged {
            *lhs = Interval::from_bounds(a, a);
            *rhs = Interval::from_bounds(b, b);
        }
        return Ok(outcome);
    }
    if (lhs.is_zero() && rhs.has_infinite_bound()) || (rhs.is_zero() && lhs.has_infinite_bound()) {
        return Err(ArithmeticError::IndeterminateForm("zero times infinity"));
    }

    let one = Interval::from_bounds(F::one(), F::one());
    match (rhs.as_scalar(), lhs.as_scalar()) {
        (Some(b), _) if b == F::one() => return Ok(Rearranged::RhsAnnihilated),
        (_, Some(a)) if a == F::one() => return Ok(Rearranged::LhsAnnihilated),
        (Some(b), _) if b == -F::one() => {
            lhs.negate();
            *rhs = one;
            return Ok(Rearranged::RhsAnnihilated);
        },
        (_, Some(a)) if a == -F::one() => {
            rhs.negate();
            *lhs = one;
            return Ok(Rearranged::LhsAnnihilated);
        },
        _ => {},
    }
    if lhs.is_zero() || rhs.is_zero() {
        *lhs = zero_interval();
        *rhs = one;
        return Ok(Rearranged::RhsAnnihilated);
    }
    if is_half_ray(lhs) {
        *lhs = half_ray_product(lhs, rhs)?;
        *rhs = one;
        return Ok(Rearranged::RhsAnnihilated);
    }
    if is_half_ray(rhs) {
        *rhs = half_ray_product(rhs, lhs)?;
        *lhs = one;
        return Ok(Rearranged::LhsAnnihilated);
    }
    Ok(Rearranged::Unchanged)
}

// ============================================================================
// Quotients
// ============================================================================

/// Shortcuts for `lhs / rhs`. A resolved quotient is left in `lhs` with
/// `rhs` reset to 1.
pub fn trivial_quotient_scalar<F: BinaryFloat>(
    lhs: &mut F,
    rhs: &mut F,
) -> ArithmeticResult<Rearranged> {
    let negative = signs_differ(*lhs, *rhs);
    if lhs.is_zero() && rhs.is_zero() {
        return Err(ArithmeticError::IndeterminateForm("zero / zero"));
    }
    if lhs.is_infinite() && rhs.is_infinite() {
        return Err(ArithmeticError::IndeterminateForm("infinity / infinity"));
    }
    if rhs.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }
    if lhs.is_infinite() {
        *lhs = signed_infinity(negative);
    } else if rhs.is_infinite() || lhs.is_zero() {
        *lhs = signed_zero(negative);
    } else if *rhs == -F::one() {
        *lhs = -*lhs;
    } else if *rhs != F::one() {
        return Ok(Rearranged::Unchanged);
    }
    *rhs = F::one();
    Ok(Rearranged::RhsAnnihilated)
}

pub fn trivial_quotient_interval<F: BinaryFloat>(
    lhs: &mut Interval<F>,
    rhs: &mut Interval<F>,
) -> ArithmeticResult<Rearranged> {
    if rhs.contains_zero() {
        if lhs.is_zero() && rhs.is_zero() {
            return Err(ArithmeticError::IndeterminateForm("zero / zero"));
        }
        return Err(ArithmeticError::DivisionByZero);
    }
    if let (Some(mut a), Some(mut b)) = (lhs.as_scalar(), rhs.as_scalar()) {
        let outcome = trivial_quotient_scalar(&mut a, &mut b)?;
        if outcome != Rearranged::Unchanged {
            *lhs = Interval::from_bounds(a, a);
            *rhs = Interval::from_bounds(b, b);
        }
        return Ok(outcome);
    }

    let one = Interval::from_bounds(F::one(), F::one());
    match rhs.as_scalar() {
        Some(b) if b.is_infinite() => {
            if lhs.has_infinite_bound() {
                return Err(ArithmeticError::IndeterminateForm("infinity / infinity"));
            }
            *lhs = zero_interval();
        },
        Some(b) if b == -F::one() => lhs.negate(),
        Some(b) if b == F::one() => {},
        _ if lhs.is_zero() => {},
        _ => return Ok(Rearranged::Unchanged),
    }
    *rhs = one;
    Ok(Rearranged::RhsAnnihilated)
}

#[inline]
fn zero_interval<F: BinaryFloat>() -> Interval<F> {
    Interval::from_bounds(F::zero(), F::zero())
}

// ============================================================================
// Exact Types
// ============================================================================

macro_rules! impl_exact_trivial {
    ($name:ident, $t:ty, $zero:expr, $one:expr) => {
        pub(crate) mod $name {
            use super::*;

            pub fn sum(lhs: &mut $t, rhs: &mut $t) -> ArithmeticResult<Rearranged> {
                if *rhs == $zero {
                    Ok(Rearranged::RhsAnnihilated)
                } else if *lhs == $zero {
                    Ok(Rearranged::LhsAnnihilated)
                } else {
                    Ok(Rearranged::Unchanged)
                }
            }

            pub fn product(lhs: &mut $t, rhs: &mut $t) -> ArithmeticResult<Rearranged> {
                if *rhs == $one {
                    return Ok(Rearranged::RhsAnnihilated);
                }
                if *lhs == $one {
                    return Ok(Rearranged::LhsAnnihilated);
                }
                if *lhs == $zero || *rhs == $zero {
                    *lhs = $zero;
                    *rhs = $one;
                    return Ok(Rearranged::RhsAnnihilated);
                }
                Ok(Rearranged::Unchanged)
            }

            pub fn quotient(lhs: &mut $t, rhs: &mut $t) -> ArithmeticResult<Rearranged> {
                if *rhs == $zero {
                    if *lhs == $zero {
                        return Err(ArithmeticError::IndeterminateForm("zero / zero"));
                    }
                    return Err(ArithmeticError::DivisionByZero);
                }
                if *rhs == $one || *lhs == $zero {
                    *rhs = $one;
                    return Ok(Rearranged::RhsAnnihilated);
                }
                Ok(Rearranged::Unchanged)
            }
        }
    };
}

impl_exact_trivial!(decimal, Decimal, Decimal::ZERO, Decimal::ONE);
impl_exact_trivial!(integer, i64, 0, 1);
