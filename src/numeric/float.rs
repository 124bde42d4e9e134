// ============================================================================
// Binary Floating Point Support
// frexp/ldexp, error-free transforms and exponent statistics for f32/f64
// ============================================================================

use num_traits::Float;
use std::fmt;

/// IEEE-754 binary floating point type usable by the exact kernels.
///
/// Exponents follow the `frexp` convention throughout the crate: a finite
/// nonzero `x` is `m * 2^e` with `0.5 <= |m| < 1`, so `1.0` has exponent 1.
pub trait BinaryFloat: Float + fmt::Debug + fmt::Display + Default + Send + Sync + 'static {
    /// Significand digits, including the implicit leading bit.
    const DIGITS: i32;
    /// frexp exponent of the smallest positive normal value.
    const MIN_EXP: i32;
    /// frexp exponent of the largest finite value.
    const MAX_EXP: i32;

    /// Smallest positive subnormal value.
    fn denorm_min() -> Self;

    /// Next representable value toward +∞.
    fn step_up(self) -> Self;

    /// Next representable value toward −∞.
    fn step_down(self) -> Self;

    /// `2^n` for `MIN_EXP - 1 <= n <= MAX_EXP - 1` (normal range only).
    fn exp2i(n: i32) -> Self;

    /// Exact conversion from an unsigned integer, if representable.
    fn from_u64_exact(value: u64) -> Option<Self>;

    /// Conversion from an unsigned integer rounded to nearest.
    fn from_u64_rounded(value: u64) -> Self;

    /// Largest integer `n` such that every integer in `0..=n` is exact.
    fn max_exact_integer() -> u64 {
        (1u64 << Self::DIGITS) - 1
    }
}

macro_rules! impl_binary_float {
    ($t:ty, $bits:ty) => {
        impl BinaryFloat for $t {
            const DIGITS: i32 = <$t>::MANTISSA_DIGITS as i32;
            const MIN_EXP: i32 = <$t>::MIN_EXP;
            const MAX_EXP: i32 = <$t>::MAX_EXP;

            #[inline]
            fn denorm_min() -> Self {
                <$t>::from_bits(1)
            }

            #[inline]
            fn step_up(self) -> Self {
                self.next_up()
            }

            #[inline]
            fn step_down(self) -> Self {
                self.next_down()
            }

            #[inline]
            fn exp2i(n: i32) -> Self {
                // inherent f32/f64 constants shadow the trait's here
                let min_exp = <Self as BinaryFloat>::MIN_EXP;
                let max_exp = <Self as BinaryFloat>::MAX_EXP;
                debug_assert!(n >= min_exp - 1 && n <= max_exp - 1);
                let biased = (n + max_exp - 1) as $bits;
                <$t>::from_bits(biased << (<Self as BinaryFloat>::DIGITS - 1))
            }

            #[inline]
            fn from_u64_exact(value: u64) -> Option<Self> {
                let converted = value as $t;
                // integers above 2^DIGITS round; compare back through u128 to avoid saturation
                if converted.is_finite() && converted as u128 == value as u128 {
                    Some(converted)
                } else {
                    None
                }
            }

            #[inline]
            fn from_u64_rounded(value: u64) -> Self {
                value as $t
            }
        }
    };
}

impl_binary_float!(f32, u32);
impl_binary_float!(f64, u64);

// ============================================================================
// frexp / ldexp
// ============================================================================

/// Split a finite nonzero value into `(mantissa, exponent)` with
/// `0.5 <= |mantissa| < 1`. Zero and non-finite values return `(x, 0)`.
pub fn frexp<F: BinaryFloat>(x: F) -> (F, i32) {
    if x.is_zero() || !x.is_finite() {
        return (x, 0);
    }
    let (significand, exponent, _) = x.integer_decode();
    let bit_length = 64 - significand.leading_zeros() as i32;
    let e = exponent as i32 + bit_length;
    (ldexp(x, -(e as i64)), e)
}

/// `x * 2^n`, rounding once if the result is subnormal.
pub fn ldexp<F: BinaryFloat>(x: F, n: i64) -> F {
    let emax = F::MAX_EXP - 1;
    let emin = F::MIN_EXP - 1;
    let mut n = n.clamp(i32::MIN as i64 / 2, i32::MAX as i64 / 2) as i32;
    let mut y = x;

    if n > emax {
        y = y * F::exp2i(emax);
        n -= emax;
        if n > emax {
            y = y * F::exp2i(emax);
            n -= emax;
            if n > emax {
                n = emax;
            }
        }
    } else if n < emin {
        // keep the last step below -DIGITS so subnormal rounding happens once
        let step = F::exp2i(emin) * F::exp2i(F::DIGITS);
        y = y * step;
        n += -emin - F::DIGITS;
        if n < emin {
            y = y * step;
            n += -emin - F::DIGITS;
            if n < emin {
                n = emin;
            }
        }
    }
    y * F::exp2i(n)
}

// ============================================================================
// Error-Free Transforms
// ============================================================================

/// Knuth's two-sum: `s + e == a + b` exactly for finite `a`, `b` without overflow.
#[inline]
pub fn two_sum<F: Float>(a: F, b: F) -> (F, F) {
    let s = a + b;
    let b_virtual = s - a;
    let a_virtual = s - b_virtual;
    let e = (a - a_virtual) + (b - b_virtual);
    (s, e)
}

/// `a + b` when it is exactly representable.
#[inline]
pub fn exact_sum<F: Float>(a: F, b: F) -> Option<F> {
    let (s, e) = two_sum(a, b);
    if s.is_finite() && e.is_zero() {
        Some(s)
    } else {
        None
    }
}

/// `a * b` when it is exactly representable as a normal (or zero) value.
#[inline]
pub fn exact_product<F: Float>(a: F, b: F) -> Option<F> {
    let p = a * b;
    if a.is_zero() || b.is_zero() {
        return Some(p);
    }
    if !p.is_normal() {
        return None;
    }
    if a.mul_add(b, -p).is_zero() {
        Some(p)
    } else {
        None
    }
}

/// Greatest common divisor.
pub const fn gcd(mut lhs: u64, mut rhs: u64) -> u64 {
    while rhs != 0 {
        let r = lhs % rhs;
        lhs = rhs;
        rhs = r;
    }
    lhs
}

/// Split a nonzero integer into `(odd part, power of two)`.
#[inline]
pub const fn split_power_of_two(value: u64) -> (u64, u32) {
    if value == 0 {
        return (0, 0);
    }
    let shift = value.trailing_zeros();
    (value >> shift, shift)
}

// ============================================================================
// Exponent Statistics
// ============================================================================

/// Mantissa/exponent view of a finite nonzero float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatStats<F: BinaryFloat> {
    mantissa: F,
    exponent: i32,
    significand: u64,
    lsb_exponent: i32,
}

impl<F: BinaryFloat> FloatStats<F> {
    /// `None` for zero and non-finite values.
    pub fn of(x: F) -> Option<Self> {
        if x.is_zero() || !x.is_finite() {
            return None;
        }
        let (mantissa, exponent) = frexp(x);
        let (significand, raw_exponent, _) = x.integer_decode();
        let (odd, shift) = split_power_of_two(significand);
        Some(Self {
            mantissa,
            exponent,
            significand: odd,
            lsb_exponent: raw_exponent as i32 + shift as i32,
        })
    }

    #[inline]
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    #[inline]
    pub fn mantissa(&self) -> F {
        self.mantissa
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.mantissa.is_sign_negative()
    }

    /// Mantissa is ±0.5, i.e. the value is a signed power of two.
    #[inline]
    pub fn is_power_of_two(&self) -> bool {
        self.significand == 1
    }

    /// Odd integer `k` with `|x| = k * 2^j`.
    #[inline]
    pub fn odd_significand(&self) -> u64 {
        self.significand
    }

    /// Power of two of the lowest set bit: `|x|` is a multiple of `2^lsb_exponent`.
    #[inline]
    pub fn lsb_exponent(&self) -> i32 {
        self.lsb_exponent
    }

    /// Power of two of the unit in the last place at this exponent.
    #[inline]
    pub fn ulp_exponent(&self) -> i32 {
        (self.exponent - F::DIGITS).max(F::MIN_EXP - F::DIGITS)
    }

    /// Doublings available before the value overflows.
    #[inline]
    pub fn headroom_up(&self) -> i64 {
        (F::MAX_EXP - self.exponent) as i64
    }

    /// Halvings available before a set bit would be shifted out.
    #[inline]
    pub fn exact_headroom_down(&self) -> i64 {
        (self.lsb_exponent - (F::MIN_EXP - F::DIGITS)) as i64
    }

    /// `2^k` carrying this value's sign.
    #[inline]
    pub fn signed_power(&self, k: i32) -> F {
        ldexp(F::one(), k as i64).copysign(self.mantissa)
    }
}

/// frexp exponent of a finite nonzero value.
#[inline]
pub fn exponent_of<F: BinaryFloat>(x: F) -> Option<i32> {
    FloatStats::of(x).map(|s| s.exponent())
}

/// True for ±0 with the sign bit set.
#[inline]
pub fn is_negative_zero<F: Float>(x: F) -> bool {
    x.is_zero() && x.is_sign_negative()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_constants() {
        assert_eq!(<f64 as BinaryFloat>::DIGITS, 53);
        assert_eq!(<f64 as BinaryFloat>::MIN_EXP, -1021);
        assert_eq!(<f64 as BinaryFloat>::MAX_EXP, 1024);
        assert_eq!(<f32 as BinaryFloat>::DIGITS, 24);
        assert_eq!(f64::max_exact_integer(), (1u64 << 53) - 1);
    }

    #[test]
    fn test_exp2i() {
        assert_eq!(f64::exp2i(0), 1.0);
        assert_eq!(f32::exp2i(0), 1.0);
        assert_eq!(f64::exp2i(10), 1024.0);
        assert_eq!(f64::exp2i(1023), 2f64.powi(1023));
        assert_eq!(f64::exp2i(-1022), f64::MIN_POSITIVE);
        assert_eq!(f32::exp2i(127), 2f32.powi(127));
    }

    #[test]
    fn test_frexp() {
        assert_eq!(frexp(1.0f64), (0.5, 1));
        assert_eq!(frexp(-3.0f64), (-0.75, 2));
        assert_eq!(frexp(0.1f64).1, -3);
        let tiny = f64::denorm_min();
        assert_eq!(frexp(tiny), (0.5, -1073));
        assert_eq!(frexp(0.0f64), (0.0, 0));
    }

    #[test]
    fn test_ldexp() {
        assert_eq!(ldexp(1.0f64, 10), 1024.0);
        assert_eq!(ldexp(1.0f64, -1074), f64::denorm_min());
        assert_eq!(ldexp(1.0f64, 1024), f64::INFINITY);
        assert_eq!(ldexp(f64::MAX, -2000), f64::MAX * 2f64.powi(-1000) * 2f64.powi(-1000));
        assert_eq!(ldexp(f64::MIN_POSITIVE, -2000), 0.0);
        assert_eq!(ldexp(1e-200f64, -1), 1e-200 / 2.0);
        assert_eq!(ldexp(1e-200f64, 100), 1e-200 * 2f64.powi(100));
        assert_eq!(ldexp(1.0f32, -149), f32::from_bits(1));
        assert_eq!(ldexp(f64::denorm_min(), 1074), 1.0);
    }

    #[test]
    fn test_two_sum_exactness() {
        assert_eq!(exact_sum(1.0f64, 2.0), Some(3.0));
        assert_eq!(exact_sum(1.0f64, 1e-30), None);
        let (s, e) = two_sum(1.0f64, 1e-30);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-30);
    }

    #[test]
    fn test_exact_product() {
        assert_eq!(exact_product(3.0f64, 0.5), Some(1.5));
        assert_eq!(exact_product(0.1f64, 0.1), None);
        assert_eq!(exact_product(f64::MIN_POSITIVE, 0.5), None);
    }

    #[test]
    fn test_stats() {
        let stats = FloatStats::of(12.0f64).unwrap();
        assert_eq!(stats.exponent(), 4);
        assert_eq!(stats.mantissa(), 0.75);
        assert_eq!(stats.odd_significand(), 3);
        assert_eq!(stats.lsb_exponent(), 2);
        assert!(!stats.is_power_of_two());
        assert!(FloatStats::of(0.25f64).unwrap().is_power_of_two());
        assert!(FloatStats::of(0.0f64).is_none());
        assert!(FloatStats::of(f64::INFINITY).is_none());
    }

    #[test]
    fn test_gcd_and_split() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(split_power_of_two(40), (5, 3));
        assert_eq!(split_power_of_two(1), (1, 0));
    }

    #[test]
    fn test_from_u64() {
        assert_eq!(f64::from_u64_exact(3), Some(3.0));
        assert_eq!(f64::from_u64_exact((1 << 53) + 1), None);
        assert_eq!(f64::from_u64_exact(u64::MAX), None);
        assert_eq!(f32::from_u64_exact(1 << 40), Some(2f32.powi(40)));
    }

    proptest! {
        #[test]
        fn prop_frexp_ldexp_inverse(x in proptest::num::f64::NORMAL | proptest::num::f64::SUBNORMAL) {
            let (m, e) = frexp(x);
            prop_assert!(m.abs() >= 0.5 && m.abs() < 1.0);
            prop_assert_eq!(ldexp(m, e as i64), x);
        }

        #[test]
        fn prop_gcd_divides(a in 1u64..1_000_000, b in 1u64..1_000_000) {
            let g = gcd(a, b);
            prop_assert_eq!(a % g, 0);
            prop_assert_eq!(b % g, 0);
        }
    }

    quickcheck::quickcheck! {
        fn qc_gcd_commutes(a: u64, b: u64) -> bool {
            gcd(a, b) == gcd(b, a)
        }
    }
}
