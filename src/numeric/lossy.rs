// ============================================================================
// Lossy Arithmetic
// Plain operations guarded against overflow and NaN
// ============================================================================

use super::errors::{ArithmeticError, ArithmeticResult};
use super::float::BinaryFloat;
use super::interval::Interval;
use rust_decimal::Decimal;

/// The fall-through arithmetic once no shortcut or exact rearrangement
/// applies. Finite inputs producing a non-finite result fail with
/// `Overflow`; no operation returns NaN.
pub trait LossyArithmetic: Sized + Copy {
    fn is_finite_value(&self) -> bool;

    fn lossy_sum(self, rhs: Self) -> ArithmeticResult<Self>;

    fn lossy_product(self, rhs: Self) -> ArithmeticResult<Self>;

    fn lossy_square(self) -> ArithmeticResult<Self> {
        self.lossy_product(self)
    }

    fn lossy_quotient(self, rhs: Self) -> ArithmeticResult<Self>;
}

// ============================================================================
// Binary Floats
// ============================================================================

fn checked_float<F: BinaryFloat>(
    result: F,
    inputs_finite: bool,
    operation: &'static str,
    nan_form: &'static str,
) -> ArithmeticResult<F> {
    if result.is_nan() {
        return Err(ArithmeticError::IndeterminateForm(nan_form));
    }
    if inputs_finite && !result.is_finite() {
        return Err(ArithmeticError::Overflow(operation));
    }
    Ok(result)
}

macro_rules! impl_lossy_float {
    ($t:ty) => {
        impl LossyArithmetic for $t {
            #[inline]
            fn is_finite_value(&self) -> bool {
                self.is_finite()
            }

            fn lossy_sum(self, rhs: Self) -> ArithmeticResult<Self> {
                let finite = self.is_finite() && rhs.is_finite();
                checked_float(self + rhs, finite, "sum", "infinity - infinity")
            }

            fn lossy_product(self, rhs: Self) -> ArithmeticResult<Self> {
                let finite = self.is_finite() && rhs.is_finite();
                checked_float(self * rhs, finite, "product", "zero times infinity")
            }

            fn lossy_square(self) -> ArithmeticResult<Self> {
                checked_float(self * self, self.is_finite(), "square", "NaN square")
            }

            fn lossy_quotient(self, rhs: Self) -> ArithmeticResult<Self> {
                if rhs == 0.0 {
                    if self == 0.0 {
                        return Err(ArithmeticError::IndeterminateForm("zero / zero"));
                    }
                    return Err(ArithmeticError::DivisionByZero);
                }
                let finite = self.is_finite() && rhs.is_finite();
                checked_float(self / rhs, finite, "quotient", "infinity / infinity")
            }
        }
    };
}

impl_lossy_float!(f32);
impl_lossy_float!(f64);

// ============================================================================
// Intervals
// ============================================================================

fn checked_interval<F: BinaryFloat>(
    (lo, hi): (F, F),
    inputs_finite: bool,
    operation: &'static str,
) -> ArithmeticResult<Interval<F>> {
    let result = Interval::new(lo, hi)?;
    if inputs_finite && !result.is_finite() {
        return Err(ArithmeticError::Overflow(operation));
    }
    Ok(result)
}

fn zero_times_infinity<F: BinaryFloat>(lhs: &Interval<F>, rhs: &Interval<F>) -> bool {
    (lhs.is_zero() && rhs.has_infinite_bound()) || (rhs.is_zero() && lhs.has_infinite_bound())
}

impl<F: BinaryFloat> LossyArithmetic for Interval<F> {
    #[inline]
    fn is_finite_value(&self) -> bool {
        self.is_finite()
    }

    fn lossy_sum(self, rhs: Self) -> ArithmeticResult<Self> {
        let finite = self.is_finite() && rhs.is_finite();
        checked_interval(self.add_raw(rhs), finite, "interval sum")
    }

    fn lossy_product(self, rhs: Self) -> ArithmeticResult<Self> {
        if zero_times_infinity(&self, &rhs) {
            return Err(ArithmeticError::IndeterminateForm("zero times infinity"));
        }
        let finite = self.is_finite() && rhs.is_finite();
        checked_interval(self.mul_raw(rhs), finite, "interval product")
    }

    fn lossy_square(self) -> ArithmeticResult<Self> {
        checked_interval(self.square_raw(), self.is_finite(), "interval square")
    }

    fn lossy_quotient(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.contains_zero() {
            if self.is_zero() && rhs.is_zero() {
                return Err(ArithmeticError::IndeterminateForm("zero / zero"));
            }
            return Err(ArithmeticError::DivisionByZero);
        }
        let both_infinite_points = self.is_degenerate()
            && rhs.is_degenerate()
            && self.has_infinite_bound()
            && rhs.has_infinite_bound();
        if both_infinite_points {
            return Err(ArithmeticError::IndeterminateForm("infinity / infinity"));
        }
        let finite = self.is_finite() && rhs.is_finite();
        checked_interval(self.div_raw(rhs)?, finite, "interval quotient")
    }
}

// ============================================================================
// Exact Types
// ============================================================================

impl LossyArithmetic for Decimal {
    #[inline]
    fn is_finite_value(&self) -> bool {
        true
    }

    fn lossy_sum(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs)
            .ok_or(ArithmeticError::Overflow("decimal sum"))
    }

    fn lossy_product(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs)
            .ok_or(ArithmeticError::Overflow("decimal product"))
    }

    fn lossy_quotient(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            if self.is_zero() {
                return Err(ArithmeticError::IndeterminateForm("zero / zero"));
            }
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs)
            .ok_or(ArithmeticError::Overflow("decimal quotient"))
    }
}

impl LossyArithmetic for i64 {
    #[inline]
    fn is_finite_value(&self) -> bool {
        true
    }

    fn lossy_sum(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs)
            .ok_or(ArithmeticError::Overflow("integer sum"))
    }

    fn lossy_product(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs)
            .ok_or(ArithmeticError::Overflow("integer product"))
    }

    /// Only exact quotients stay integers; a remainder means the caller must
    /// move to a rational representation first.
    fn lossy_quotient(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs == 0 {
            if self == 0 {
                return Err(ArithmeticError::IndeterminateForm("zero / zero"));
            }
            return Err(ArithmeticError::DivisionByZero);
        }
        match self.checked_rem(rhs) {
            Some(0) => self
                .checked_div(rhs)
                .ok_or(ArithmeticError::Overflow("integer quotient")),
            Some(_) => Err(ArithmeticError::IncompatibleRepresentations),
            None => Err(ArithmeticError::Overflow("integer quotient")),
        }
    }
}
