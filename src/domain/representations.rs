// ============================================================================
// Representations
// Magnitude and evaluator implementations for the built-in number types
// ============================================================================

use crate::interfaces::{
    Classified, Domain, Evaluate, Magnitude, RepresentationKind, ScaleRange,
};
use crate::numeric::{exponent_of, is_negative_zero, ldexp, BinaryFloat, FloatStats, Interval};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::any::Any;

// ============================================================================
// Binary Floats
// ============================================================================

/// Shifts that keep a float finite and lose no set bit.
pub fn float_scale_range<F: BinaryFloat>(x: F) -> ScaleRange {
    match FloatStats::of(x) {
        Some(stats) => ScaleRange::new(-stats.exact_headroom_down(), stats.headroom_up()),
        None => ScaleRange::UNBOUNDED,
    }
}

fn float_ideal_scale<F: BinaryFloat>(x: F) -> Option<i64> {
    exponent_of(x).map(|e| 1 - e as i64)
}

macro_rules! impl_float_magnitude {
    ($t:ty, $kind:ident) => {
        impl Classified for $t {
            const DOMAIN: Domain = Domain::ExtendedReals;
        }

        impl Magnitude for $t {
            fn domain(&self) -> Domain {
                <Self as Classified>::DOMAIN
            }

            fn kind(&self) -> RepresentationKind {
                RepresentationKind::$kind
            }

            fn represents_infinity(&self) -> bool {
                <$t>::is_infinite(*self)
            }

            fn all_parts_finite(&self) -> bool {
                <$t>::is_finite(*self)
            }

            fn is_zero(&self) -> bool {
                *self == 0.0
            }

            fn is_one(&self) -> bool {
                *self == 1.0
            }

            fn is_negative(&self) -> bool {
                *self < 0.0
            }

            fn safe_scale_range(&self) -> ScaleRange {
                float_scale_range(*self)
            }

            fn scale_within_range(&mut self, n: i64) {
                *self = ldexp(*self, n);
            }

            fn ideal_scale(&self) -> Option<i64> {
                float_ideal_scale(*self)
            }

            fn clone_magnitude(&self) -> Box<dyn Magnitude> {
                Box::new(*self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

impl_float_magnitude!(f32, Float32);
impl_float_magnitude!(f64, Float64);

// ============================================================================
// Intervals
// ============================================================================

fn interval_scale_range<F: BinaryFloat>(x: &Interval<F>) -> ScaleRange {
    float_scale_range(x.lo()).intersect(float_scale_range(x.hi()))
}

fn interval_ideal_scale<F: BinaryFloat>(x: &Interval<F>) -> Option<i64> {
    let leading = match (exponent_of(x.lo()), exponent_of(x.hi())) {
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => return None,
    };
    Some(1 - leading as i64)
}

fn bound_is_scale_fixed<F: BinaryFloat>(x: F) -> bool {
    x.is_zero() || x.is_infinite()
}

macro_rules! impl_interval_magnitude {
    ($t:ty, $kind:ident) => {
        impl Classified for Interval<$t> {
            const DOMAIN: Domain = Domain::ExtendedReals;
        }

        impl Magnitude for Interval<$t> {
            fn domain(&self) -> Domain {
                <Self as Classified>::DOMAIN
            }

            fn kind(&self) -> RepresentationKind {
                RepresentationKind::$kind
            }

            fn represents_infinity(&self) -> bool {
                self.as_scalar().is_some_and(<$t>::is_infinite)
            }

            fn all_parts_finite(&self) -> bool {
                Interval::is_finite(self)
            }

            fn is_zero(&self) -> bool {
                Interval::is_zero(self)
            }

            fn is_one(&self) -> bool {
                self.as_scalar() == Some(1.0)
            }

            fn is_negative(&self) -> bool {
                Interval::is_negative(self)
            }

            fn is_scale_identity(&self) -> bool {
                bound_is_scale_fixed(self.lo()) && bound_is_scale_fixed(self.hi())
            }

            fn safe_scale_range(&self) -> ScaleRange {
                interval_scale_range(self)
            }

            fn scale_within_range(&mut self, n: i64) {
                *self = Interval::from_bounds(ldexp(self.lo(), n), ldexp(self.hi(), n));
            }

            fn ideal_scale(&self) -> Option<i64> {
                interval_ideal_scale(self)
            }

            fn clone_magnitude(&self) -> Box<dyn Magnitude> {
                Box::new(*self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        impl Evaluate for Interval<$t> {
            fn needs_simplify(&self) -> bool {
                is_negative_zero(self.lo()) || is_negative_zero(self.hi())
            }

            fn simplify_in_place(&mut self) -> bool {
                if !self.needs_simplify() {
                    return false;
                }
                let unsign = |x: $t| if x == 0.0 { 0.0 } else { x };
                *self = Interval::from_bounds(unsign(self.lo()), unsign(self.hi()));
                true
            }

            fn evaluate_into(&self) -> Option<Box<dyn Magnitude>> {
                self.as_scalar().map(|x| Box::new(x) as Box<dyn Magnitude>)
            }
        }
    };
}

impl_interval_magnitude!(f32, Interval32);
impl_interval_magnitude!(f64, Interval64);

// ============================================================================
// Decimals
// ============================================================================

const DECIMAL_MAX_SCALE: u32 = 28;
const DECIMAL_MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// One exact halving of `mantissa * 10^-scale`.
fn halve_decimal(mantissa: u128, scale: u32) -> Option<(u128, u32)> {
    if mantissa % 2 == 0 {
        Some((mantissa / 2, scale))
    } else if scale < DECIMAL_MAX_SCALE && mantissa * 5 <= DECIMAL_MAX_MANTISSA {
        // x / 2 == 5x / 10
        Some((mantissa * 5, scale + 1))
    } else {
        None
    }
}

fn decimal_parts(value: &Decimal) -> (u128, u32) {
    (value.mantissa().unsigned_abs(), value.scale())
}

fn decimal_halvings(value: &Decimal) -> i64 {
    let (mut mantissa, mut scale) = decimal_parts(value);
    let mut count = 0;
    while let Some((m, s)) = halve_decimal(mantissa, scale) {
        mantissa = m;
        scale = s;
        count += 1;
    }
    count
}

impl Classified for Decimal {
    const DOMAIN: Domain = Domain::Rationals;
}

impl Magnitude for Decimal {
    fn domain(&self) -> Domain {
        <Self as Classified>::DOMAIN
    }

    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Decimal
    }

    fn is_zero(&self) -> bool {
        Decimal::is_zero(self)
    }

    fn is_one(&self) -> bool {
        *self == Decimal::ONE
    }

    fn is_negative(&self) -> bool {
        self.is_sign_negative() && !Decimal::is_zero(self)
    }

    fn safe_scale_range(&self) -> ScaleRange {
        if Decimal::is_zero(self) {
            return ScaleRange::UNBOUNDED;
        }
        let (mantissa, _) = decimal_parts(self);
        let bits = 128 - mantissa.leading_zeros() as i64;
        ScaleRange::new(-decimal_halvings(self), 96 - bits)
    }

    fn scale_within_range(&mut self, n: i64) {
        let (mut mantissa, mut scale) = decimal_parts(self);
        if n > 0 {
            mantissa <<= n;
        } else {
            for _ in 0..(-n) {
                match halve_decimal(mantissa, scale) {
                    Some((m, s)) => {
                        mantissa = m;
                        scale = s;
                    },
                    None => break,
                }
            }
        }
        let signed = if self.is_sign_negative() {
            -(mantissa as i128)
        } else {
            mantissa as i128
        };
        match Decimal::try_from_i128_with_scale(signed, scale) {
            Ok(scaled) => *self = scaled,
            Err(err) => debug_assert!(false, "decimal scaling left range: {}", err),
        }
    }

    fn ideal_scale(&self) -> Option<i64> {
        self.to_f64().and_then(float_ideal_scale)
    }

    fn clone_magnitude(&self) -> Box<dyn Magnitude> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Evaluate for Decimal {
    fn needs_simplify(&self) -> bool {
        let normal = self.normalize();
        normal.scale() != self.scale() || normal.is_sign_negative() != self.is_sign_negative()
    }

    fn simplify_in_place(&mut self) -> bool {
        if !self.needs_simplify() {
            return false;
        }
        *self = self.normalize();
        true
    }

    fn evaluate_into(&self) -> Option<Box<dyn Magnitude>> {
        if !self.fract().is_zero() {
            return None;
        }
        self.to_i64().map(|n| Box::new(n) as Box<dyn Magnitude>)
    }
}

// ============================================================================
// Integers
// ============================================================================

fn integer_bits(value: i64) -> i64 {
    64 - value.unsigned_abs().leading_zeros() as i64
}

impl Classified for i64 {
    const DOMAIN: Domain = Domain::Integers;
}

impl Magnitude for i64 {
    fn domain(&self) -> Domain {
        <Self as Classified>::DOMAIN
    }

    fn kind(&self) -> RepresentationKind {
        RepresentationKind::Integer
    }

    fn is_zero(&self) -> bool {
        *self == 0
    }

    fn is_one(&self) -> bool {
        *self == 1
    }

    fn is_negative(&self) -> bool {
        *self < 0
    }

    fn safe_scale_range(&self) -> ScaleRange {
        if *self == 0 {
            return ScaleRange::UNBOUNDED;
        }
        ScaleRange::new(-(self.trailing_zeros() as i64), 63 - integer_bits(*self))
    }

    fn scale_within_range(&mut self, n: i64) {
        if n > 0 {
            *self <<= n;
        } else {
            *self >>= -n;
        }
    }

    fn ideal_scale(&self) -> Option<i64> {
        if *self == 0 {
            None
        } else {
            Some(1 - integer_bits(*self))
        }
    }

    fn clone_magnitude(&self) -> Box<dyn Magnitude> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_float_flags() {
        let inf: &dyn Magnitude = &f64::INFINITY;
        assert!(inf.is_infinite());
        assert!(!inf.is_finite());
        assert!(inf.is_scale_identity());
        let one: &dyn Magnitude = &1.0f32;
        assert!(one.is_one());
        assert!(!one.is_zero());
        assert_eq!(one.kind(), RepresentationKind::Float32);
        assert_eq!(one.domain(), Domain::ExtendedReals);
    }

    #[test]
    fn test_float_scale_range() {
        let range = 1.0f64.safe_scale_range();
        assert_eq!(range, ScaleRange { min: -1074, max: 1023 });
        let mut x = 1.0f64;
        assert!(Magnitude::scale_by_power_of_two(&mut x, -1074));
        assert_eq!(x, f64::from_bits(1));
        let mut y = 3.0f64;
        assert!(!Magnitude::scale_by_power_of_two(&mut y, 1023));
        assert_eq!(y, 3.0);
    }

    #[test]
    fn test_float_zero_is_identity() {
        let mut zero = -0.0f64;
        assert!(Magnitude::scale_by_power_of_two(&mut zero, 5000));
        assert!(zero.is_sign_negative());
    }

    #[test]
    fn test_ideal_scale() {
        assert_eq!(Magnitude::ideal_scale(&8.0f64), Some(-3));
        assert_eq!(Magnitude::ideal_scale(&0.25f64), Some(2));
        assert_eq!(Magnitude::ideal_scale(&0.0f64), None);
        assert_eq!(Magnitude::ideal_scale(&12i64), Some(-3));
    }

    #[test]
    fn test_interval_magnitude() {
        let iv = Interval::new(-2.0f64, 8.0).unwrap();
        let m: &dyn Magnitude = &iv;
        assert_eq!(m.kind(), RepresentationKind::Interval64);
        assert!(m.is_finite());
        assert!(!m.is_infinite());
        assert_eq!(m.ideal_scale(), Some(-3));

        let ray = Interval::new(0.0f64, f64::INFINITY).unwrap();
        assert!(!Magnitude::is_finite(&ray));
        assert!(!Magnitude::is_infinite(&ray));
        assert!(Magnitude::is_scale_identity(&ray));

        let mut scaled = iv;
        assert!(Magnitude::scale_by_power_of_two(&mut scaled, -1));
        assert_eq!(scaled, Interval::new(-1.0, 4.0).unwrap());
    }

    #[test]
    fn test_interval_evaluator() {
        let mut iv = Interval::new(-0.0f32, 0.0).unwrap();
        assert!(iv.needs_simplify());
        assert!(iv.simplify_in_place());
        assert!(iv.lo().is_sign_positive());
        assert!(!iv.simplify_in_place());
        let cheaper = iv.evaluate_into().unwrap();
        assert_eq!(cheaper.downcast_ref::<f32>(), Some(&0.0));
        assert!(Interval::new(1.0f32, 2.0).unwrap().evaluate_into().is_none());
    }

    #[test]
    fn test_decimal_scaling() {
        let mut x = Decimal::new(3, 0);
        assert!(Magnitude::scale_by_power_of_two(&mut x, -2));
        assert_eq!(x, Decimal::new(75, 2));
        assert!(Magnitude::scale_by_power_of_two(&mut x, 3));
        assert_eq!(x, Decimal::new(6, 0));

        let range = Decimal::new(1, 0).safe_scale_range();
        assert_eq!(range.max, 95);
        assert!(range.min <= -28);
        let mut tiny = Decimal::new(1, 28);
        assert!(!Magnitude::scale_by_power_of_two(&mut tiny, -1));
        assert_eq!(tiny, Decimal::new(1, 28));
    }

    #[test]
    fn test_decimal_flags() {
        let d: &dyn Magnitude = &Decimal::ONE;
        assert!(d.is_one());
        assert!(d.is_finite());
        assert!(!d.is_infinite());
        assert_eq!(d.domain(), Domain::Rationals);
        assert!(Magnitude::is_negative(&Decimal::new(-5, 1)));
    }

    #[test]
    fn test_integer_scaling() {
        let mut x = 12i64;
        assert_eq!(x.safe_scale_range(), ScaleRange { min: -2, max: 59 });
        assert!(Magnitude::scale_by_power_of_two(&mut x, -2));
        assert_eq!(x, 3);
        assert!(!Magnitude::scale_by_power_of_two(&mut x, -1));
        let mut neg = -8i64;
        assert!(Magnitude::scale_by_power_of_two(&mut neg, -3));
        assert_eq!(neg, -1);
    }

    proptest! {
        #[test]
        fn prop_safe_scale_is_exact(x in proptest::num::f64::NORMAL, n in -2000i64..2000) {
            let mut y = x;
            let range = x.safe_scale_range();
            let accepted = Magnitude::scale_by_power_of_two(&mut y, n);
            prop_assert_eq!(accepted, range.contains(n));
            if accepted {
                prop_assert!(y.is_finite());
                let mut back = y;
                prop_assert!(Magnitude::scale_by_power_of_two(&mut back, -n));
                prop_assert_eq!(back, x);
            } else {
                prop_assert_eq!(y, x);
            }
        }
    }
}
