// ============================================================================
// Magnitude Interface
// Capability set every numeric representation exposes to the engine
// ============================================================================

use super::domain_lattice::{Domain, InfinityPolicy};
use crate::numeric::{ArithmeticError, ArithmeticResult};
use std::any::Any;
use std::fmt;

/// Concrete representation tag used for dispatch and operand promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepresentationKind {
    Integer,
    Decimal,
    Float32,
    Float64,
    Interval32,
    Interval64,
    /// Caller-defined representation with no registered evaluator
    Other,
}

impl RepresentationKind {
    pub const fn is_interval(self) -> bool {
        matches!(self, RepresentationKind::Interval32 | RepresentationKind::Interval64)
    }

    pub const fn is_binary_float(self) -> bool {
        matches!(self, RepresentationKind::Float32 | RepresentationKind::Float64)
    }
}

impl fmt::Display for RepresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepresentationKind::Integer => "i64",
            RepresentationKind::Decimal => "decimal",
            RepresentationKind::Float32 => "f32",
            RepresentationKind::Float64 => "f64",
            RepresentationKind::Interval32 => "interval<f32>",
            RepresentationKind::Interval64 => "interval<f64>",
            RepresentationKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Inclusive power-of-two shift bounds, `min <= 0 <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleRange {
    pub min: i64,
    pub max: i64,
}

impl ScaleRange {
    /// Every shift is safe (scale identities).
    pub const UNBOUNDED: ScaleRange = ScaleRange {
        min: i64::MIN,
        max: i64::MAX,
    };

    /// Only the trivial shift is safe.
    pub const PINNED: ScaleRange = ScaleRange { min: 0, max: 0 };

    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: min.min(0),
            max: max.max(0),
        }
    }

    #[inline]
    pub fn contains(&self, n: i64) -> bool {
        self.min <= n && n <= self.max
    }

    #[inline]
    pub fn clamp(&self, n: i64) -> i64 {
        n.clamp(self.min, self.max)
    }

    /// Shifts safe for both ranges.
    pub fn intersect(self, other: ScaleRange) -> ScaleRange {
        ScaleRange {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }
}

/// Capability interface for numeric representations.
///
/// Infinity queries are gated by the representation's [`Domain`]: for
/// domains that do not admit infinity the provided `is_infinite` and
/// `is_finite` answer without looking at the value.
pub trait Magnitude: Any + fmt::Debug + Send + Sync {
    fn domain(&self) -> Domain;

    fn kind(&self) -> RepresentationKind;

    fn infinity_policy(&self) -> InfinityPolicy {
        self.domain().infinity_policy()
    }

    /// The value is exactly an infinity. Only consulted when the domain
    /// admits infinity.
    fn represents_infinity(&self) -> bool {
        false
    }

    /// No component of the value is infinite. Only consulted when the domain
    /// admits infinity.
    fn all_parts_finite(&self) -> bool {
        true
    }

    fn is_infinite(&self) -> bool {
        self.domain().admits_infinity() && self.represents_infinity()
    }

    fn is_finite(&self) -> bool {
        !self.domain().admits_infinity() || self.all_parts_finite()
    }

    fn is_zero(&self) -> bool;

    fn is_one(&self) -> bool;

    /// Strictly below zero (for intervals: nonpositive and not zero).
    fn is_negative(&self) -> bool {
        false
    }

    /// True exactly when scaling by any power of two is a no-op.
    fn is_scale_identity(&self) -> bool {
        self.is_zero() || self.is_infinite()
    }

    /// Shifts guaranteed neither to overflow nor to lose bits.
    fn safe_scale_range(&self) -> ScaleRange;

    /// Multiply by `2^n`. Returns false, leaving the value untouched, when
    /// `n` is outside [`Magnitude::safe_scale_range`].
    fn scale_by_power_of_two(&mut self, n: i64) -> bool {
        if n == 0 || self.is_scale_identity() {
            return true;
        }
        if !self.safe_scale_range().contains(n) {
            return false;
        }
        self.scale_within_range(n);
        true
    }

    /// Representation-specific scaling; `n` is already known to be safe.
    fn scale_within_range(&mut self, n: i64);

    /// Shift that moves the value's leading exponent to 1. May lie outside
    /// the safe range; `None` for scale identities.
    fn ideal_scale(&self) -> Option<i64> {
        None
    }

    fn clone_magnitude(&self) -> Box<dyn Magnitude>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Magnitude {
    pub fn downcast_ref<T: Magnitude>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Magnitude>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: Magnitude>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl Clone for Box<dyn Magnitude> {
    fn clone(&self) -> Self {
        self.clone_magnitude()
    }
}

/// Deep copy into a fresh box, for sized and unsized values alike.
pub trait DeepClone {
    fn deep_clone(&self) -> Box<Self>;
}

impl<T: Clone> DeepClone for T {
    fn deep_clone(&self) -> Box<Self> {
        Box::new(self.clone())
    }
}

impl DeepClone for dyn Magnitude {
    fn deep_clone(&self) -> Box<Self> {
        self.clone_magnitude()
    }
}

/// Scaled copy of `value`, or `InvalidScale` when `n` is unsafe.
pub fn scaled(value: &dyn Magnitude, n: i64) -> ArithmeticResult<Box<dyn Magnitude>> {
    let mut copy = value.clone_magnitude();
    if copy.scale_by_power_of_two(n) {
        Ok(copy)
    } else {
        Err(ArithmeticError::InvalidScale(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Integers-domain test double that claims to be infinite; the domain
    /// gate must hide that.
    #[derive(Debug, Clone, PartialEq)]
    struct Counter(u32);

    impl Magnitude for Counter {
        fn domain(&self) -> Domain {
            Domain::Integers
        }
        fn kind(&self) -> RepresentationKind {
            RepresentationKind::Other
        }
        fn represents_infinity(&self) -> bool {
            true
        }
        fn all_parts_finite(&self) -> bool {
            false
        }
        fn is_zero(&self) -> bool {
            self.0 == 0
        }
        fn is_one(&self) -> bool {
            self.0 == 1
        }
        fn safe_scale_range(&self) -> ScaleRange {
            ScaleRange::new(-(self.0.trailing_zeros() as i64), self.0.leading_zeros() as i64)
        }
        fn scale_within_range(&mut self, n: i64) {
            if n >= 0 {
                self.0 <<= n;
            } else {
                self.0 >>= -n;
            }
        }
        fn clone_magnitude(&self) -> Box<dyn Magnitude> {
            Box::new(self.clone())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_domain_gates_infinity() {
        let c = Counter(3);
        assert!(!c.is_infinite());
        assert!(c.is_finite());
        assert_eq!(c.infinity_policy(), InfinityPolicy::None);
    }

    #[test]
    fn test_scale_rejects_unsafe_shift() {
        let mut c = Counter(12);
        assert_eq!(c.safe_scale_range(), ScaleRange { min: -2, max: 28 });
        assert!(!c.scale_by_power_of_two(-3));
        assert_eq!(c, Counter(12));
        assert!(c.scale_by_power_of_two(-2));
        assert_eq!(c, Counter(3));
        assert!(!c.scale_by_power_of_two(40));
        assert_eq!(c, Counter(3));
    }

    #[test]
    fn test_scale_identity_and_zero_shift() {
        let mut zero = Counter(0);
        assert!(zero.is_scale_identity());
        assert!(zero.scale_by_power_of_two(1_000));
        let mut c = Counter(5);
        assert!(c.scale_by_power_of_two(0));
        assert_eq!(c, Counter(5));
    }

    #[test]
    fn test_scaled_helper() {
        let c = Counter(5);
        let doubled = scaled(&c, 1).unwrap();
        assert_eq!(doubled.downcast_ref::<Counter>(), Some(&Counter(10)));
        assert_eq!(scaled(&c, -1).unwrap_err(), ArithmeticError::InvalidScale(-1));
    }

    #[test]
    fn test_box_clone_and_downcast() {
        let boxed: Box<dyn Magnitude> = Box::new(Counter(7));
        let copy = boxed.clone();
        assert!(copy.is::<Counter>());
        assert_eq!(copy.downcast_ref::<Counter>(), Some(&Counter(7)));
        let deep = boxed.deep_clone();
        assert!(deep.is::<Counter>());
    }

    #[test]
    fn test_scale_range_ops() {
        let a = ScaleRange::new(-10, 5);
        let b = ScaleRange::new(-3, 20);
        assert_eq!(a.intersect(b), ScaleRange { min: -3, max: 5 });
        assert_eq!(a.clamp(9), 5);
        assert!(ScaleRange::UNBOUNDED.contains(i64::MIN));
        assert!(!ScaleRange::PINNED.contains(1));
        assert_eq!(ScaleRange::new(3, -4), ScaleRange::PINNED);
    }
}
