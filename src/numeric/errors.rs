// ============================================================================
// Arithmetic Errors
// Failure taxonomy for exact and overflow-checked magnitude arithmetic
// ============================================================================

use std::fmt;

/// Errors that can occur while evaluating magnitudes.
///
/// Shortcut and rearrangement outcomes are *not* errors; they are reported
/// through [`crate::engine::Rearranged`]. Everything here is a genuine
/// arithmetic impossibility that aborts the current evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticError {
    /// ∞−∞, 0×∞, 0/0, ∞/∞, or an interval spanning (−∞, ∞)
    IndeterminateForm(&'static str),
    /// Division by exact zero or by an interval containing zero
    DivisionByZero,
    /// Finite inputs produced a non-finite or unrepresentable result
    Overflow(&'static str),
    /// Result exponent fell below the representable minimum
    Underflow,
    /// Requested power-of-two shift is outside the safe range
    InvalidScale(i64),
    /// Operands have no common representation
    IncompatibleRepresentations,
}

impl fmt::Display for ArithmeticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticError::IndeterminateForm(form) => {
                write!(f, "indeterminate form: {}", form)
            },
            ArithmeticError::DivisionByZero => write!(f, "division by zero"),
            ArithmeticError::Overflow(operation) => {
                write!(f, "arithmetic overflow: {}", operation)
            },
            ArithmeticError::Underflow => {
                write!(f, "arithmetic underflow: result below minimum exponent")
            },
            ArithmeticError::InvalidScale(scale) => {
                write!(f, "invalid scale: 2^{} is outside the safe range", scale)
            },
            ArithmeticError::IncompatibleRepresentations => {
                write!(f, "operands have no common representation")
            },
        }
    }
}

impl std::error::Error for ArithmeticError {}

/// Result type alias for magnitude operations
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;
