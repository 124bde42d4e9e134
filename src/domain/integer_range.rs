// ============================================================================
// Integer Range
// Closed range of integers standing for the product of its members
// ============================================================================

use num_traits::PrimInt;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Closed range `[lo, hi]`, empty when `lo > hi`.
///
/// As a divisor it denotes `lo * (lo + 1) * ... * hi`. Iteration pops from
/// the front; popping the last member leaves a canonical empty range without
/// stepping past the integer type's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntegerRange<T> {
    lo: T,
    hi: T,
}

impl<T: PrimInt> IntegerRange<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Self { lo, hi }
    }

    pub fn single(value: T) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn empty() -> Self {
        Self {
            lo: T::one(),
            hi: T::zero(),
        }
    }

    #[inline]
    pub fn lo(&self) -> T {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> T {
        self.hi
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        self.lo == self.hi
    }

    /// Number of members.
    pub fn size(&self) -> u128 {
        if self.is_empty() {
            return 0;
        }
        let lo = self.lo.to_i128().unwrap_or(0);
        let hi = self.hi.to_i128().unwrap_or(0);
        // u64 ranges above i128::MAX cannot occur; both bounds convert
        (hi - lo) as u128 + 1
    }

    pub fn contains(&self, value: T) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub fn contains_zero(&self) -> bool {
        self.contains(T::zero())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let front = self.lo;
        if self.lo == self.hi {
            *self = Self::empty();
        } else {
            self.lo = self.lo + T::one();
        }
        Some(front)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let back = self.hi;
        if self.lo == self.hi {
            *self = Self::empty();
        } else {
            self.hi = self.hi - T::one();
        }
        Some(back)
    }
}

impl<T: PrimInt> Iterator for IntegerRange<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = usize::try_from(self.size()).ok();
        (count.unwrap_or(usize::MAX), count)
    }
}

impl<T: PrimInt> DoubleEndedIterator for IntegerRange<T> {
    fn next_back(&mut self) -> Option<T> {
        self.pop_back()
    }
}

impl<T: PrimInt + fmt::Display> fmt::Display for IntegerRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("[]")
        } else {
            write!(f, "[{}, {}]", self.lo, self.hi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single() {
        assert!(IntegerRange::<u64>::empty().is_empty());
        assert!(IntegerRange::new(5u64, 4).is_empty());
        let single = IntegerRange::single(7u64);
        assert!(single.is_single());
        assert_eq!(single.size(), 1);
    }

    #[test]
    fn test_pop_to_empty_at_type_bounds() {
        let mut top = IntegerRange::single(u64::MAX);
        assert_eq!(top.pop_front(), Some(u64::MAX));
        assert!(top.is_empty());
        assert_eq!(top.pop_front(), None);

        let mut bottom = IntegerRange::single(i64::MIN);
        assert_eq!(bottom.pop_back(), Some(i64::MIN));
        assert!(bottom.is_empty());
    }

    #[test]
    fn test_iteration_both_ends() {
        let range = IntegerRange::new(1u64, 5);
        assert_eq!(range.collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(range.rev().collect::<Vec<_>>(), vec![5, 4, 3, 2, 1]);
        assert_eq!(range.product::<u64>(), 120);
    }

    #[test]
    fn test_signed_range() {
        let range = IntegerRange::new(-3i64, 2);
        assert!(range.contains_zero());
        assert_eq!(range.size(), 6);
        let full = IntegerRange::new(i64::MIN, i64::MAX);
        assert_eq!(full.size(), 1u128 << 64);
        // constant time, no walk over the members
        assert_eq!(IntegerRange::new(-(1i64 << 40), -1).size(), 1u128 << 40);
    }

    #[test]
    fn test_display() {
        assert_eq!(IntegerRange::new(2u64, 9).to_string(), "[2, 9]");
        assert_eq!(IntegerRange::<u64>::empty().to_string(), "[]");
    }
}
