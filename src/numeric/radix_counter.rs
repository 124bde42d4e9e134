// ============================================================================
// Radix Counter
// Saturating signed power-of-two scale kept apart from a value's own exponent
// ============================================================================

use super::errors::{ArithmeticError, ArithmeticResult};
use std::fmt;

/// Saturating signed counter of a deferred `2^n` scale.
///
/// The counter spans `[-u64::MAX, u64::MAX]`. Growth and shrink headroom are
/// reported independently so a caller can decide how much of a value's own
/// exponent to move into the counter before committing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RadixCounter {
    value: i128,
}

impl RadixCounter {
    const LIMIT: i128 = u64::MAX as i128;

    pub const fn new() -> Self {
        Self { value: 0 }
    }

    #[inline]
    pub const fn value(&self) -> i128 {
        self.value
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Pending growth, zero when the counter is not positive.
    #[inline]
    pub const fn positive(&self) -> u64 {
        if self.value > 0 {
            self.value as u64
        } else {
            0
        }
    }

    /// Pending shrink, zero when the counter is not negative.
    #[inline]
    pub const fn negative(&self) -> u64 {
        if self.value < 0 {
            (-self.value) as u64
        } else {
            0
        }
    }

    /// Increments remaining before saturation.
    #[inline]
    pub const fn add_capacity(&self) -> u128 {
        (Self::LIMIT - self.value) as u128
    }

    /// Decrements remaining before saturation.
    #[inline]
    pub const fn sub_capacity(&self) -> u128 {
        (Self::LIMIT + self.value) as u128
    }

    /// Add, failing without change when the counter would saturate.
    pub fn try_add(&mut self, n: u64) -> ArithmeticResult<()> {
        if n as u128 > self.add_capacity() {
            return Err(ArithmeticError::Overflow("power-of-two scale counter"));
        }
        self.value += n as i128;
        Ok(())
    }

    /// Subtract, failing without change when the counter would saturate.
    pub fn try_sub(&mut self, n: u64) -> ArithmeticResult<()> {
        if n as u128 > self.sub_capacity() {
            return Err(ArithmeticError::Underflow);
        }
        self.value -= n as i128;
        Ok(())
    }

    /// Signed shift through `try_add` / `try_sub`.
    pub fn try_shift(&mut self, n: i128) -> ArithmeticResult<()> {
        let magnitude = u64::try_from(n.unsigned_abs()).map_err(|_| {
            if n > 0 {
                ArithmeticError::Overflow("power-of-two scale counter")
            } else {
                ArithmeticError::Underflow
            }
        })?;
        if n >= 0 {
            self.try_add(magnitude)
        } else {
            self.try_sub(magnitude)
        }
    }

    /// Remove up to `limit` of the pending scale, in the counter's own
    /// direction, and return it as a signed shift.
    pub fn drain(&mut self, limit: u64) -> i128 {
        if self.value > 0 {
            let step = self.positive().min(limit);
            self.value -= step as i128;
            step as i128
        } else {
            let step = self.negative().min(limit);
            self.value += step as i128;
            -(step as i128)
        }
    }
}

impl fmt::Display for RadixCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "2^{}", self.value)
    }
}
