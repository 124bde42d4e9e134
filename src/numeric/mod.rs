// ============================================================================
// Numeric Module
// Binary float kernels, intervals and the arithmetic error taxonomy
// ============================================================================
//
// This module provides:
// - BinaryFloat: frexp/ldexp and digit constants over f32/f64
// - Interval<F>: closed interval with outward rounding
// - LossyArithmetic: overflow-checked fall-through operations
// - RadixCounter: saturating deferred power-of-two scale
// - ArithmeticError: error type for every fallible operation
//
// Design principles:
// - No operation returns NaN
// - All fallible arithmetic returns Result (no panics)
// - Exactness is proven with error-free transforms, never assumed

mod errors;
mod float;
mod interval;
mod lossy;
mod radix_counter;

pub use errors::{ArithmeticError, ArithmeticResult};
pub use float::{
    exact_product, exact_sum, exponent_of, frexp, gcd, is_negative_zero, ldexp,
    split_power_of_two, two_sum, BinaryFloat, FloatStats,
};
pub use interval::{
    enclose_integer, product_down, product_up, quotient_down, quotient_up, sum_down, sum_up,
    Interval,
};
pub use lossy::LossyArithmetic;
pub use radix_counter::RadixCounter;
