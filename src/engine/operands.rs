// ============================================================================
// Operand Promotion
// Reads concrete values out of cells and lifts mixed pairs to one representation
// ============================================================================
//
// Promotion only ever widens: Integer -> Decimal, Float32 -> Float64 and
// scalar -> interval are exact. An exact value meeting a binary float is
// enclosed in an f64 interval so nothing is rounded silently.

use crate::domain::MagnitudeCell;
use crate::interfaces::{Magnitude, RepresentationKind};
use crate::numeric::{enclose_integer, ArithmeticError, ArithmeticResult, Interval};
use rust_decimal::Decimal;

/// A value of one of the built-in representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Integer(i64),
    Decimal(Decimal),
    Float32(f32),
    Float64(f64),
    Interval32(Interval<f32>),
    Interval64(Interval<f64>),
}

impl Operand {
    /// Copy the value out of a magnitude. Caller-defined representations
    /// have no arithmetic here.
    pub fn read(value: &dyn Magnitude) -> ArithmeticResult<Self> {
        let operand = match value.kind() {
            RepresentationKind::Integer => value.downcast_ref::<i64>().copied().map(Operand::Integer),
            RepresentationKind::Decimal => {
                value.downcast_ref::<Decimal>().copied().map(Operand::Decimal)
            },
            RepresentationKind::Float32 => value.downcast_ref::<f32>().copied().map(Operand::Float32),
            RepresentationKind::Float64 => value.downcast_ref::<f64>().copied().map(Operand::Float64),
            RepresentationKind::Interval32 => value
                .downcast_ref::<Interval<f32>>()
                .copied()
                .map(Operand::Interval32),
            RepresentationKind::Interval64 => value
                .downcast_ref::<Interval<f64>>()
                .copied()
                .map(Operand::Interval64),
            RepresentationKind::Other => None,
        };
        operand.ok_or(ArithmeticError::IncompatibleRepresentations)
    }

    pub fn from_cell(cell: &MagnitudeCell) -> ArithmeticResult<Self> {
        cell.get()
            .ok_or(ArithmeticError::IncompatibleRepresentations)
            .and_then(Self::read)
    }

    pub fn kind(&self) -> RepresentationKind {
        match self {
            Operand::Integer(_) => RepresentationKind::Integer,
            Operand::Decimal(_) => RepresentationKind::Decimal,
            Operand::Float32(_) => RepresentationKind::Float32,
            Operand::Float64(_) => RepresentationKind::Float64,
            Operand::Interval32(_) => RepresentationKind::Interval32,
            Operand::Interval64(_) => RepresentationKind::Interval64,
        }
    }

    pub fn into_cell(self) -> MagnitudeCell {
        match self {
            Operand::Integer(x) => MagnitudeCell::from_value(x),
            Operand::Decimal(x) => MagnitudeCell::from_value(x),
            Operand::Float32(x) => MagnitudeCell::from_value(x),
            Operand::Float64(x) => MagnitudeCell::from_value(x),
            Operand::Interval32(x) => MagnitudeCell::from_value(x),
            Operand::Interval64(x) => MagnitudeCell::from_value(x),
        }
    }

    /// Convert to `target`, which must be at least as wide as `self`.
    pub fn promote(self, target: RepresentationKind) -> ArithmeticResult<Self> {
        use RepresentationKind as K;
        if self.kind() == target {
            return Ok(self);
        }
        let promoted = match (self, target) {
            (Operand::Integer(x), K::Decimal) => Operand::Decimal(Decimal::from(x)),
            (Operand::Integer(x), K::Interval64) => {
                let (lo, hi) = enclose_integer::<f64>(x as i128);
                Operand::Interval64(Interval::new(lo, hi)?)
            },
            (Operand::Decimal(x), K::Interval64) => Operand::Interval64(enclose_decimal(x)?),
            (Operand::Float32(x), K::Float64) => Operand::Float64(x as f64),
            (Operand::Float32(x), K::Interval32) => Operand::Interval32(Interval::point(x)?),
            (Operand::Float32(x), K::Interval64) => Operand::Interval64(Interval::point(x as f64)?),
            (Operand::Float64(x), K::Interval64) => Operand::Interval64(Interval::point(x)?),
            (Operand::Interval32(x), K::Interval64) => {
                Operand::Interval64(Interval::new(x.lo() as f64, x.hi() as f64)?)
            },
            _ => return Err(ArithmeticError::IncompatibleRepresentations),
        };
        Ok(promoted)
    }
}

/// Tightest f64 interval around a decimal: mantissa over a power of ten,
/// both enclosed and divided with outward rounding.
pub fn enclose_decimal(x: Decimal) -> ArithmeticResult<Interval<f64>> {
    let scale = x.scale();
    if scale == 0 {
        let (lo, hi) = enclose_integer::<f64>(x.mantissa());
        return Interval::new(lo, hi);
    }
    let denominator = 10i128.pow(scale);
    Interval::enclose_ratio(x.mantissa(), denominator)
}

/// Narrowest representation both kinds promote into.
pub fn common_kind(
    lhs: RepresentationKind,
    rhs: RepresentationKind,
) -> ArithmeticResult<RepresentationKind> {
    use RepresentationKind as K;
    if lhs == rhs && lhs != K::Other {
        return Ok(lhs);
    }
    let exact = |k: K| matches!(k, K::Integer | K::Decimal);
    let common = match (lhs, rhs) {
        (K::Other, _) | (_, K::Other) => return Err(ArithmeticError::IncompatibleRepresentations),
        (a, b) if exact(a) && exact(b) => K::Decimal,
        (a, b) if exact(a) || exact(b) => K::Interval64,
        (K::Float32, K::Float64) | (K::Float64, K::Float32) => K::Float64,
        (K::Float32, K::Interval32) | (K::Interval32, K::Float32) => K::Interval32,
        _ => K::Interval64,
    };
    Ok(common)
}

/// Both operands in one representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandPair {
    Integer(i64, i64),
    Decimal(Decimal, Decimal),
    Float32(f32, f32),
    Float64(f64, f64),
    Interval32(Interval<f32>, Interval<f32>),
    Interval64(Interval<f64>, Interval<f64>),
}

impl OperandPair {
    /// Promote both operands to their common kind.
    pub fn unify(lhs: Operand, rhs: Operand) -> ArithmeticResult<Self> {
        let common = common_kind(lhs.kind(), rhs.kind())?;
        let pair = match (lhs.promote(common)?, rhs.promote(common)?) {
            (Operand::Integer(a), Operand::Integer(b)) => OperandPair::Integer(a, b),
            (Operand::Decimal(a), Operand::Decimal(b)) => OperandPair::Decimal(a, b),
            (Operand::Float32(a), Operand::Float32(b)) => OperandPair::Float32(a, b),
            (Operand::Float64(a), Operand::Float64(b)) => OperandPair::Float64(a, b),
            (Operand::Interval32(a), Operand::Interval32(b)) => OperandPair::Interval32(a, b),
            (Operand::Interval64(a), Operand::Interval64(b)) => OperandPair::Interval64(a, b),
            _ => return Err(ArithmeticError::IncompatibleRepresentations),
        };
        Ok(pair)
    }

    pub fn kind(&self) -> RepresentationKind {
        match self {
            OperandPair::Integer(..) => RepresentationKind::Integer,
            OperandPair::Decimal(..) => RepresentationKind::Decimal,
            OperandPair::Float32(..) => RepresentationKind::Float32,
            OperandPair::Float64(..) => RepresentationKind::Float64,
            OperandPair::Interval32(..) => RepresentationKind::Interval32,
            OperandPair::Interval64(..) => RepresentationKind::Interval64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_from_cell() {
        let cell = MagnitudeCell::from_value(2.5f64);
        assert_eq!(Operand::from_cell(&cell), Ok(Operand::Float64(2.5)));

        let empty = MagnitudeCell::new();
        assert_eq!(
            Operand::from_cell(&empty),
            Err(ArithmeticError::IncompatibleRepresentations)
        );
    }

    #[test]
    fn test_common_kind() {
        use RepresentationKind as K;
        assert_eq!(common_kind(K::Integer, K::Decimal), Ok(K::Decimal));
        assert_eq!(common_kind(K::Float32, K::Float64), Ok(K::Float64));
        assert_eq!(common_kind(K::Float32, K::Interval32), Ok(K::Interval32));
        assert_eq!(common_kind(K::Float64, K::Interval32), Ok(K::Interval64));
        assert_eq!(common_kind(K::Decimal, K::Float32), Ok(K::Interval64));
        assert_eq!(
            common_kind(K::Other, K::Other),
            Err(ArithmeticError::IncompatibleRepresentations)
        );
        assert_eq!(
            common_kind(K::Float64, K::Other),
            Err(ArithmeticError::IncompatibleRepresentations)
        );
    }

    #[test]
    fn test_promotion_is_exact() {
        let pair = OperandPair::unify(Operand::Integer(3), Operand::Decimal(Decimal::new(5, 1))).unwrap();
        assert_eq!(pair, OperandPair::Decimal(Decimal::from(3), Decimal::new(5, 1)));

        let pair = OperandPair::unify(Operand::Float32(0.1), Operand::Float64(1.0)).unwrap();
        assert_eq!(pair, OperandPair::Float64(0.1f32 as f64, 1.0));
    }

    #[test]
    fn test_decimal_enclosure() {
        let enclosed = enclose_decimal(Decimal::new(1, 1)).unwrap();
        assert!(enclosed.contains(0.1));
        assert!(enclosed.lo() < enclosed.hi());

        let exact = enclose_decimal(Decimal::new(5, 1)).unwrap();
        assert_eq!(exact.as_scalar(), Some(0.5));

        let integer = enclose_decimal(Decimal::from(42)).unwrap();
        assert_eq!(integer.as_scalar(), Some(42.0));
    }

    #[test]
    fn test_exact_meets_float() {
        let pair = OperandPair::unify(Operand::Integer(7), Operand::Float64(0.25)).unwrap();
        assert_eq!(pair.kind(), RepresentationKind::Interval64);
        match pair {
            OperandPair::Interval64(a, b) => {
                assert_eq!(a.as_scalar(), Some(7.0));
                assert_eq!(b.as_scalar(), Some(0.25));
            },
            other => panic!("unexpected pair {other:?}"),
        }
    }

    #[test]
    fn test_demotion_rejected() {
        assert_eq!(
            Operand::Float64(1.0).promote(RepresentationKind::Float32),
            Err(ArithmeticError::IncompatibleRepresentations)
        );
    }

    #[test]
    fn test_round_trip_through_cell() {
        let operand = Operand::Decimal(Decimal::new(125, 2));
        let cell = operand.into_cell();
        assert_eq!(Operand::from_cell(&cell), Ok(operand));
    }
}
