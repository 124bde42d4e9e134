// ============================================================================
// Rearrangement
// Exact exponent alignment applied before falling back to lossy arithmetic
// ============================================================================
//
// A pending binary operation resolves in three stages:
// 1. trivial shortcut (identity, zero, infinity)
// 2. exact rearrangement of the operands
// 3. the plain lossy operation
//
// Stages 1 and 2 never change the exact value of the pending operation; they
// only move magnitude between the operands until one of them is absorbed.

use super::trivial::{
    self, trivial_product_interval, trivial_product_scalar, trivial_quotient_interval,
    trivial_quotient_scalar, trivial_sum_interval, trivial_sum_scalar, Rearranged,
};
use crate::domain::float_scale_range;
use crate::numeric::{
    exact_product, exact_sum, exponent_of, ldexp, ArithmeticResult, BinaryFloat, FloatStats,
    Interval,
};
use rust_decimal::Decimal;

#[inline]
fn is_finite_nonzero<F: BinaryFloat>(x: F) -> bool {
    x.is_finite() && !x.is_zero()
}

// ============================================================================
// Scalar Sum
// ============================================================================

/// `big + small` when it needs no rounding.
fn fold<F: BinaryFloat>(big: F, small: F) -> Option<F> {
    if big == -small {
        return Some(F::zero());
    }
    if big == small {
        let stats = FloatStats::of(big)?;
        return (stats.headroom_up() > 0).then(|| big + big);
    }
    exact_sum(big, small)
}

/// Move the largest power of two both operands absorb exactly from `big`
/// into `small`, if that strictly shrinks their exponent gap.
fn transfer<F: BinaryFloat>(big: F, small: F) -> Option<(F, F)> {
    let big_stats = FloatStats::of(big)?;
    let small_stats = FloatStats::of(small)?;
    let gap = big_stats.exponent() - small_stats.exponent();
    if gap <= 0 {
        return None;
    }

    // below the leading bit of `small` the gap cannot shrink, below the ulp
    // of `big` the subtraction is inexact
    let floor = (small_stats.exponent() - 1)
        .max(big_stats.ulp_exponent())
        .max(F::MIN_EXP - F::DIGITS);
    // above the mantissa window of `small` the addition is inexact, above
    // a quarter of `big` the subtraction could change its sign
    let ceiling = (small_stats.lsb_exponent() + F::DIGITS - 1).min(big_stats.exponent() - 2);

    for k in (floor..=ceiling).rev() {
        let delta = big_stats.signed_power(k);
        let (Some(new_big), Some(new_small)) = (exact_sum(big, -delta), exact_sum(small, delta))
        else {
            continue;
        };
        if new_big.is_zero() || new_small.is_zero() {
            return Some((new_big, new_small));
        }
        let (Some(eb), Some(es)) = (exponent_of(new_big), exponent_of(new_small)) else {
            continue;
        };
        if (eb - es).abs() < gap {
            return Some((new_big, new_small));
        }
    }
    None
}

/// Exact rearrangement of `lhs + rhs`.
///
/// Returns an annihilation when one operand folds into the other, `Progress`
/// when magnitude moved between them, `Unchanged` otherwise. The exact sum
/// `lhs + rhs` is the same before and after.
pub fn rearrange_sum_scalar<F: BinaryFloat>(lhs: &mut F, rhs: &mut F) -> Rearranged {
    if !is_finite_nonzero(*lhs) || !is_finite_nonzero(*rhs) {
        return Rearranged::Unchanged;
    }

    let mut progressed = false;
    // each transfer shrinks the gap, which only admits transfers while it
    // is within two mantissa widths
    let limit = 2 * F::DIGITS;
    for round in 0..limit {
        let lhs_leads = exponent_of(*lhs) >= exponent_of(*rhs);
        let (big, small) = if lhs_leads {
            (*lhs, *rhs)
        } else {
            (*rhs, *lhs)
        };

        if let Some(sum) = fold(big, small) {
            tracing::trace!(round, "sum folded exactly");
            if lhs_leads {
                *lhs = sum;
                *rhs = F::zero();
                return Rearranged::RhsAnnihilated;
            }
            *rhs = sum;
            *lhs = F::zero();
            return Rearranged::LhsAnnihilated;
        }

        let Some((new_big, new_small)) = transfer(big, small) else {
            break;
        };
        tracing::trace!(round, ?new_big, ?new_small, "power-of-two transfer");
        progressed = true;
        if lhs_leads {
            *lhs = new_big;
            *rhs = new_small;
        } else {
            *rhs = new_big;
            *lhs = new_small;
        }
        if new_small.is_zero() {
            return if lhs_leads {
                Rearranged::RhsAnnihilated
            } else {
                Rearranged::LhsAnnihilated
            };
        }
    }

    if progressed {
        Rearranged::Progress
    } else {
        Rearranged::Unchanged
    }
}

// ============================================================================
// Interval Sum
// ============================================================================

type Pairing<F> = Option<(Interval<F>, Interval<F>)>;

fn pairing<F: BinaryFloat>(lhs_lo: F, lhs_hi: F, rhs_lo: F, rhs_hi: F) -> Pairing<F> {
    let lhs = Interval::new(lhs_lo, lhs_hi).ok()?;
    let rhs = Interval::new(rhs_lo, rhs_hi).ok()?;
    Some((lhs, rhs))
}

fn absorbs<F: BinaryFloat>(pairing: &Pairing<F>) -> bool {
    pairing.is_some_and(|(lhs, rhs)| lhs.is_zero() || rhs.is_zero())
}

/// Rearrange the lower and upper bound pairs independently, then pick a
/// valid interval pairing of the results. Both pairings keep the exact
/// endpoint sums. An absorbing pairing wins; otherwise the chiasm (swapped
/// upper bounds) is preferred over the direct one.
pub fn rearrange_sum_interval<F: BinaryFloat>(
    lhs: &mut Interval<F>,
    rhs: &mut Interval<F>,
) -> Rearranged {
    let (mut lhs_lo, mut rhs_lo) = (lhs.lo(), rhs.lo());
    let (mut lhs_hi, mut rhs_hi) = (lhs.hi(), rhs.hi());
    let lower = rearrange_sum_scalar(&mut lhs_lo, &mut rhs_lo);
    let upper = rearrange_sum_scalar(&mut lhs_hi, &mut rhs_hi);
    if lower == Rearranged::Unchanged && upper == Rearranged::Unchanged {
        return Rearranged::Unchanged;
    }

    let direct = pairing(lhs_lo, lhs_hi, rhs_lo, rhs_hi);
    let chiasm = pairing(lhs_lo, rhs_hi, rhs_lo, lhs_hi);
    let chosen = if absorbs(&chiasm) {
        chiasm
    } else if absorbs(&direct) {
        direct
    } else {
        chiasm.or(direct)
    };

    let Some((new_lhs, new_rhs)) = chosen else {
        tracing::trace!("no valid interval pairing");
        return Rearranged::Unchanged;
    };
    *lhs = new_lhs;
    *rhs = new_rhs;
    if new_rhs.is_zero() {
        Rearranged::RhsAnnihilated
    } else if new_lhs.is_zero() {
        Rearranged::LhsAnnihilated
    } else {
        Rearranged::Progress
    }
}

// ============================================================================
// Products
// ============================================================================

/// Exact rearrangement of `lhs * rhs`.
///
/// Folds the product when it is exact and normal (always the case for a
/// power-of-two operand in range). Otherwise moves the power-of-two scale
/// of the operand with more significant bits onto the one with fewer, which
/// can take shifts without losing bits. The exact product never changes.
pub fn rearrange_product_scalar<F: BinaryFloat>(lhs: &mut F, rhs: &mut F) -> Rearranged {
    let (Some(lhs_stats), Some(rhs_stats)) = (FloatStats::of(*lhs), FloatStats::of(*rhs)) else {
        return Rearranged::Unchanged;
    };
    if let Some(product) = exact_product(*lhs, *rhs) {
        *lhs = product;
        *rhs = F::one();
        return Rearranged::RhsAnnihilated;
    }

    // `sink` has the smaller odd significand and absorbs the scale
    let lhs_is_sink = lhs_stats.odd_significand() <= rhs_stats.odd_significand();
    let (sink, source, source_stats) = if lhs_is_sink {
        (lhs, rhs, rhs_stats)
    } else {
        (rhs, lhs, lhs_stats)
    };

    let wanted = 1 - source_stats.exponent() as i64;
    let source_range = float_scale_range(*source);
    let sink_range = float_scale_range(*sink);
    // source moves by +shift, sink by -shift
    let lo = source_range.min.max(-sink_range.max);
    let hi = source_range.max.min(-sink_range.min);
    if lo > hi {
        return Rearranged::Unchanged;
    }
    let shift = wanted.clamp(lo, hi);
    if shift == 0 {
        return Rearranged::Unchanged;
    }
    tracing::trace!(shift, "product rebalanced");
    *source = ldexp(*source, shift);
    *sink = ldexp(*sink, -shift);
    Rearranged::Progress
}

/// Interval product by an exact power-of-two point.
fn scale_by_point<F: BinaryFloat>(value: &mut Interval<F>, point: F) -> bool {
    let Some(stats) = FloatStats::of(point) else {
        return false;
    };
    if !stats.is_power_of_two() {
        return false;
    }
    let shift = stats.exponent() as i64 - 1;
    let range = float_scale_range(value.lo()).intersect(float_scale_range(value.hi()));
    if !range.contains(shift) {
        return false;
    }
    let mut scaled = Interval::from_bounds(ldexp(value.lo(), shift), ldexp(value.hi(), shift));
    if stats.is_negative() {
        scaled.negate();
    }
    *value = scaled;
    true
}

pub fn rearrange_product_interval<F: BinaryFloat>(
    lhs: &mut Interval<F>,
    rhs: &mut Interval<F>,
) -> Rearranged {
    if let (Some(mut a), Some(mut b)) = (lhs.as_scalar(), rhs.as_scalar()) {
        let outcome = rearrange_product_scalar(&mut a, &mut b);
        if outcome != Rearranged::Unchanged {
            *lhs = Interval::from_bounds(a, a);
            *rhs = Interval::from_bounds(b, b);
        }
        return outcome;
    }

    let one = Interval::from_bounds(F::one(), F::one());
    if let Some(b) = rhs.as_scalar() {
        if scale_by_point(lhs, b) {
            *rhs = one;
            return Rearranged::RhsAnnihilated;
        }
    }
    if let Some(a) = lhs.as_scalar() {
        if scale_by_point(rhs, a) {
            *lhs = one;
            return Rearranged::LhsAnnihilated;
        }
    }
    Rearranged::Unchanged
}

// ============================================================================
// Representation Hooks
// ============================================================================

/// Shortcut and rearrangement hooks for one representation.
pub trait Rearrange: Sized {
    fn trivial_sum(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged>;

    fn rearrange_sum(_lhs: &mut Self, _rhs: &mut Self) -> Rearranged {
        Rearranged::Unchanged
    }

    fn trivial_product(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged>;

    fn rearrange_product(_lhs: &mut Self, _rhs: &mut Self) -> Rearranged {
        Rearranged::Unchanged
    }

    fn trivial_quotient(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged>;
}

macro_rules! impl_rearrange_float {
    ($t:ty) => {
        impl Rearrange for $t {
            fn trivial_sum(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_sum_scalar(lhs, rhs)
            }

            fn rearrange_sum(lhs: &mut Self, rhs: &mut Self) -> Rearranged {
                rearrange_sum_scalar(lhs, rhs)
            }

            fn trivial_product(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_product_scalar(lhs, rhs)
            }

            fn rearrange_product(lhs: &mut Self, rhs: &mut Self) -> Rearranged {
                rearrange_product_scalar(lhs, rhs)
            }

            fn trivial_quotient(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_quotient_scalar(lhs, rhs)
            }
        }

        impl Rearrange for Interval<$t> {
            fn trivial_sum(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_sum_interval(lhs, rhs)
            }

            fn rearrange_sum(lhs: &mut Self, rhs: &mut Self) -> Rearranged {
                rearrange_sum_interval(lhs, rhs)
            }

            fn trivial_product(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_product_interval(lhs, rhs)
            }

            fn rearrange_product(lhs: &mut Self, rhs: &mut Self) -> Rearranged {
                rearrange_product_interval(lhs, rhs)
            }

            fn trivial_quotient(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
                trivial_quotient_interval(lhs, rhs)
            }
        }
    };
}

impl_rearrange_float!(f32);
impl_rearrange_float!(f64);

impl Rearrange for Decimal {
    fn trivial_sum(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::decimal::sum(lhs, rhs)
    }

    fn trivial_product(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::decimal::product(lhs, rhs)
    }

    fn trivial_quotient(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::decimal::quotient(lhs, rhs)
    }
}

impl Rearrange for i64 {
    fn trivial_sum(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::integer::sum(lhs, rhs)
    }

    fn trivial_product(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::integer::product(lhs, rhs)
    }

    fn trivial_quotient(lhs: &mut Self, rhs: &mut Self) -> ArithmeticResult<Rearranged> {
        trivial::integer::quotient(lhs, rhs)
    }
}

// ============================================================================
// Resolution Loop
// ============================================================================

/// Binary operation pending resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    Sum,
    Product,
    Quotient,
}

/// Apply shortcuts and rearrangements until one operand is absorbed, no
/// stage makes progress, or `max_rounds` is spent.
///
/// Returns the final outcome and the number of rounds used. Anything other
/// than an annihilation means the caller must finish with the lossy
/// operation on the (possibly rearranged) operands.
pub fn resolve<T: Rearrange>(
    op: PendingOp,
    lhs: &mut T,
    rhs: &mut T,
    max_rounds: u32,
) -> ArithmeticResult<(Rearranged, u32)> {
    let mut last = Rearranged::Unchanged;
    for round in 1..=max_rounds.max(1) {
        let shortcut = match op {
            PendingOp::Sum => T::trivial_sum(lhs, rhs)?,
            PendingOp::Product => T::trivial_product(lhs, rhs)?,
            PendingOp::Quotient => T::trivial_quotient(lhs, rhs)?,
        };
        match shortcut {
            Rearranged::Unchanged => {},
            Rearranged::Progress => {
                last = Rearranged::Progress;
                continue;
            },
            annihilated => return Ok((annihilated, round)),
        }

        let rearranged = match op {
            PendingOp::Sum => T::rearrange_sum(lhs, rhs),
            PendingOp::Product => T::rearrange_product(lhs, rhs),
            PendingOp::Quotient => Rearranged::Unchanged,
        };
        match rearranged {
            Rearranged::Unchanged => return Ok((last, round)),
            Rearranged::Progress => last = Rearranged::Progress,
            annihilated => return Ok((annihilated, round)),
        }
    }
    Ok((last, max_rounds.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::ArithmeticError;
    use proptest::prelude::*;

    fn iv(lo: f64, hi: f64) -> Interval<f64> {
        Interval::new(lo, hi).unwrap()
    }

    /// `x * 2^80` as an integer; exact for the dyadic values used below.
    fn fixed(x: f64) -> i128 {
        ldexp(x, 80) as i128
    }

    #[test]
    fn test_fold_exact() {
        let (mut a, mut b) = (1.5f64, 0.25);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert_eq!((a, b), (1.75, 0.0));

        let (mut a, mut b) = (0.25f64, 1.5);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::LhsAnnihilated);
        assert_eq!((a, b), (0.0, 1.75));
    }

    #[test]
    fn test_fold_cancel_and_double() {
        let (mut a, mut b) = (0.1f64, -0.1);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert!(a == 0.0 && a.is_sign_positive());

        let (mut a, mut b) = (0.1f64, 0.1);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert_eq!(a, 0.2);

        let (mut a, mut b) = (f64::MAX, f64::MAX);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::Unchanged);
    }

    #[test]
    fn test_transfer_shrinks_gap() {
        let (mut a, mut b) = (1.0f64, 3.0 * 2f64.powi(-60));
        let before = fixed(a) + fixed(b);
        let gap = exponent_of(a).unwrap() - exponent_of(b).unwrap();
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::Progress);
        assert_eq!(fixed(a) + fixed(b), before);
        let after = exponent_of(a).unwrap() - exponent_of(b).unwrap();
        assert!(after.abs() < gap);
    }

    #[test]
    fn test_unrelated_magnitudes_unchanged() {
        let (mut a, mut b) = (1e300f64, 1e-300);
        assert_eq!(rearrange_sum_scalar(&mut a, &mut b), Rearranged::Unchanged);
        assert_eq!((a, b), (1e300, 1e-300));
    }

    #[test]
    fn test_interval_pairing_absorbs() {
        // upper pair folds into rhs; only the direct pairing is valid
        let (mut a, mut b) = (iv(0.0, 1.0), iv(1e-30, 2.0));
        assert_eq!(rearrange_sum_interval(&mut a, &mut b), Rearranged::LhsAnnihilated);
        assert!(a.is_zero());
        assert_eq!(b, iv(1e-30, 3.0));
    }

    #[test]
    fn test_interval_prefers_chiasm() {
        // lower pair stays put, upper pair folds into rhs: [-1, 0] + [-1e-300, 6]
        // and [-1, 6] + [-1e-300, 0] are both valid and neither is zero
        let (mut a, mut b) = (iv(-1.0, 2.0), iv(-1e-300, 4.0));
        assert_eq!(rearrange_sum_interval(&mut a, &mut b), Rearranged::Progress);
        assert_eq!(a, iv(-1.0, 6.0));
        assert_eq!(b, iv(-1e-300, 0.0));
    }

    #[test]
    fn test_interval_both_pairs_fold() {
        let (mut a, mut b) = (iv(1.0, 2.0), iv(0.5, 0.75));
        assert_eq!(rearrange_sum_interval(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert_eq!(a, iv(1.5, 2.75));
    }

    #[test]
    fn test_product_exact_fold() {
        let (mut a, mut b) = (3.0f64, 0.125);
        assert_eq!(rearrange_product_scalar(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert_eq!((a, b), (0.375, 1.0));
    }

    #[test]
    fn test_product_rebalance_keeps_value() {
        let (mut a, mut b) = (3.0f64 * 2f64.powi(100), 0.1 * 2f64.powi(500));
        let before = (a, b);
        assert_eq!(rearrange_product_scalar(&mut a, &mut b), Rearranged::Progress);
        // 0.1 has the wider significand and moves to mantissa form
        assert_eq!(exponent_of(b), Some(1));
        assert_eq!(a / before.0, before.1 / b);
        assert_eq!(rearrange_product_scalar(&mut a, &mut b), Rearranged::Unchanged);
    }

    #[test]
    fn test_interval_product_power_of_two_point() {
        let (mut a, mut b) = (iv(1.0, 3.0), iv(-0.5, -0.5));
        assert_eq!(rearrange_product_interval(&mut a, &mut b), Rearranged::RhsAnnihilated);
        assert_eq!(a, iv(-1.5, -0.5));
    }

    #[test]
    fn test_resolve_sum() {
        let (mut a, mut b) = (2.0f64, 0.5);
        let (outcome, rounds) = resolve(PendingOp::Sum, &mut a, &mut b, 8).unwrap();
        assert_eq!(outcome, Rearranged::RhsAnnihilated);
        assert_eq!(rounds, 1);
        assert_eq!(a, 2.5);
    }

    #[test]
    fn test_resolve_reports_failure() {
        let (mut a, mut b) = (f64::INFINITY, f64::NEG_INFINITY);
        assert!(matches!(
            resolve(PendingOp::Sum, &mut a, &mut b, 8),
            Err(ArithmeticError::IndeterminateForm(_))
        ));
        let (mut a, mut b) = (1.0f64, 0.0);
        assert_eq!(
            resolve(PendingOp::Quotient, &mut a, &mut b, 8),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    #[test]
    fn test_resolve_falls_through() {
        let (mut a, mut b) = (0.1f64, 0.2);
        let (outcome, _) = resolve(PendingOp::Sum, &mut a, &mut b, 8).unwrap();
        assert!(!outcome.is_annihilated());
        let (mut a, mut b) = (Decimal::new(3, 1), Decimal::new(7, 2));
        assert_eq!(
            resolve(PendingOp::Product, &mut a, &mut b, 8).unwrap(),
            (Rearranged::Unchanged, 1)
        );
    }

    proptest! {
        #[test]
        fn prop_rearranged_sum_is_exact(
            m1 in -(1i64 << 30)..(1i64 << 30),
            s1 in 0i32..40,
            m2 in -(1i64 << 30)..(1i64 << 30),
            s2 in 0i32..40,
        ) {
            let mut a = m1 as f64 * 2f64.powi(-s1);
            let mut b = m2 as f64 * 2f64.powi(-s2);
            let before = fixed(a) + fixed(b);
            let outcome = rearrange_sum_scalar(&mut a, &mut b);
            prop_assert_eq!(fixed(a) + fixed(b), before);
            match outcome {
                Rearranged::RhsAnnihilated => prop_assert_eq!(b, 0.0),
                Rearranged::LhsAnnihilated => prop_assert_eq!(a, 0.0),
                _ => {},
            }
        }

        #[test]
        fn prop_progress_shrinks_gap(
            a in proptest::num::f64::NORMAL,
            b in proptest::num::f64::NORMAL,
        ) {
            let gap = (exponent_of(a).unwrap() - exponent_of(b).unwrap()).abs();
            let (mut x, mut y) = (a, b);
            if rearrange_sum_scalar(&mut x, &mut y) == Rearranged::Progress {
                let after = (exponent_of(x).unwrap() - exponent_of(y).unwrap()).abs();
                prop_assert!(after < gap);
            }
        }
    }
}
