// ============================================================================
// Evaluator
// Facade running operands through simplification, promotion, shortcuts,
// rearrangement and finally the lossy operation
// ============================================================================

use crate::domain::power_term::power_by_squaring;
use crate::domain::{EvaluatorConfig, IntegerRange, MagnitudeCell, PowerTerm, UnderflowPolicy};
use crate::engine::operands::{Operand, OperandPair};
use crate::engine::rearrange::{resolve, PendingOp, Rearrange};
use crate::engine::series_product::{SeriesOperand, SeriesProductEvaluator};
use crate::engine::trivial::Rearranged;
use crate::interfaces::{
    scaled, EvaluationEvent, EventHandler, Magnitude, Operation, RepresentationKind,
};
use crate::numeric::{ArithmeticError, ArithmeticResult, BinaryFloat, Interval, LossyArithmetic};
use rust_decimal::Decimal;
use std::sync::Arc;

// ============================================================================
// Representation Bounds
// ============================================================================

/// Everything the resolution pipeline needs from a concrete representation.
pub trait Resolvable: Rearrange + LossyArithmetic + Magnitude + Copy {
    /// Smallest nonzero magnitude with the given sign, for representations
    /// whose rounded results can vanish.
    fn underflow_floor(_negative: bool) -> Option<Self> {
        None
    }
}

macro_rules! impl_resolvable_float {
    ($t:ty) => {
        impl Resolvable for $t {
            fn underflow_floor(negative: bool) -> Option<Self> {
                let tiny = <$t as BinaryFloat>::denorm_min();
                Some(if negative { -tiny } else { tiny })
            }
        }
    };
}

impl_resolvable_float!(f32);
impl_resolvable_float!(f64);

// outward rounding keeps a nonzero enclosure away from [0, 0]
impl Resolvable for Interval<f32> {}
impl Resolvable for Interval<f64> {}
impl Resolvable for Decimal {
    fn underflow_floor(negative: bool) -> Option<Self> {
        let tiny = Decimal::new(1, 28);
        Some(if negative { -tiny } else { tiny })
    }
}
impl Resolvable for i64 {}

fn operation_of(op: PendingOp) -> Operation {
    match op {
        PendingOp::Sum => Operation::Sum,
        PendingOp::Product => Operation::Product,
        PendingOp::Quotient => Operation::Quotient,
    }
}

/// `base^exponent` for the exact representations. A negative exponent
/// divides once at the end so only the final quotient can round.
fn exact_power<T>(base: T, zero: T, one: T, exponent: i64) -> ArithmeticResult<T>
where
    T: LossyArithmetic + PartialEq,
{
    if exponent == 0 && base == zero {
        return Err(ArithmeticError::IndeterminateForm("zero to the power zero"));
    }
    let magnitude = power_by_squaring(base, one, exponent.unsigned_abs())?;
    if exponent < 0 {
        one.lossy_quotient(magnitude)
    } else {
        Ok(magnitude)
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Precision-preserving evaluator over polymorphic magnitudes
pub struct Evaluator {
    /// Underflow, round limit and simplification settings
    config: EvaluatorConfig,

    /// Divisions by integer products and powers
    series: SeriesProductEvaluator,

    /// Event handler for evaluation decisions
    event_handler: Arc<dyn EventHandler>,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(config: EvaluatorConfig, event_handler: Arc<dyn EventHandler>) -> Self {
        Self {
            series: SeriesProductEvaluator::new(config.underflow_policy),
            config,
            event_handler,
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn series(&self) -> &SeriesProductEvaluator {
        &self.series
    }

    /// `lhs + rhs`
    pub fn sum(&self, lhs: MagnitudeCell, rhs: MagnitudeCell) -> ArithmeticResult<MagnitudeCell> {
        self.binary(PendingOp::Sum, lhs, rhs)
    }

    /// `lhs * rhs`
    pub fn product(
        &self,
        lhs: MagnitudeCell,
        rhs: MagnitudeCell,
    ) -> ArithmeticResult<MagnitudeCell> {
        self.binary(PendingOp::Product, lhs, rhs)
    }

    /// `lhs / rhs`. An inexact integer quotient continues in decimals.
    pub fn quotient(
        &self,
        lhs: MagnitudeCell,
        rhs: MagnitudeCell,
    ) -> ArithmeticResult<MagnitudeCell> {
        self.binary(PendingOp::Quotient, lhs, rhs)
    }

    /// `value * 2^n`, failing with `InvalidScale` outside the value's safe
    /// range. Works on any representation.
    pub fn scale(&self, value: MagnitudeCell, n: i64) -> ArithmeticResult<MagnitudeCell> {
        let result = value
            .get()
            .ok_or(ArithmeticError::IncompatibleRepresentations)
            .and_then(|magnitude| scaled(magnitude, n))
            .map(MagnitudeCell::from_owned);
        self.report(Operation::Scale, result, Vec::new())
    }

    /// `base^exponent`
    pub fn power(&self, base: MagnitudeCell, exponent: i64) -> ArithmeticResult<MagnitudeCell> {
        let mut events = Vec::new();
        let result = self.evaluate_power(base, exponent, &mut events);
        self.report(Operation::Power, result, events)
    }

    /// `value / (lo * (lo + 1) * ... * hi)`
    pub fn quotient_by_series_product(
        &self,
        value: MagnitudeCell,
        divisor: IntegerRange<i64>,
    ) -> ArithmeticResult<MagnitudeCell> {
        self.quotient_of_series_products(value, 1, divisor)
    }

    /// `base^exponent / (lo * (lo + 1) * ... * hi)` without forming either
    /// side. Exact representations are enclosed in an f64 interval first.
    pub fn quotient_of_series_products(
        &self,
        base: MagnitudeCell,
        exponent: i64,
        divisor: IntegerRange<i64>,
    ) -> ArithmeticResult<MagnitudeCell> {
        let mut events = Vec::new();
        let result = self.evaluate_series(base, exponent, divisor, &mut events);
        self.report(Operation::SeriesQuotient, result, events)
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    fn report<T>(
        &self,
        operation: Operation,
        result: ArithmeticResult<T>,
        mut events: Vec<EvaluationEvent>,
    ) -> ArithmeticResult<T> {
        if let Err(error) = &result {
            events.push(EvaluationEvent::EvaluationFailed {
                operation,
                error: *error,
            });
        }
        if !events.is_empty() {
            self.event_handler.on_events(events);
        }
        result
    }

    fn binary(
        &self,
        op: PendingOp,
        lhs: MagnitudeCell,
        rhs: MagnitudeCell,
    ) -> ArithmeticResult<MagnitudeCell> {
        let mut events = Vec::new();
        let result = self.evaluate_binary(op, lhs, rhs, &mut events);
        self.report(operation_of(op), result, events)
    }

    /// Simplify (when configured) and read the concrete value.
    fn prepare(
        &self,
        operation: Operation,
        mut cell: MagnitudeCell,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<Operand> {
        if self.config.simplify_operands {
            let mut changed = cell.simplify();
            // each conversion strictly cheapens the kind
            while cell.destructive_evaluate() {
                changed = true;
                cell.simplify();
            }
            if let Some(value) = cell.get().filter(|_| changed) {
                events.push(EvaluationEvent::OperandSimplified {
                    operation,
                    kind: value.kind(),
                });
            }
        }
        Operand::from_cell(&cell)
    }

    fn evaluate_binary(
        &self,
        op: PendingOp,
        lhs: MagnitudeCell,
        rhs: MagnitudeCell,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<MagnitudeCell> {
        let operation = operation_of(op);
        let lhs = self.prepare(operation, lhs, events)?;
        let rhs = self.prepare(operation, rhs, events)?;
        let pair = OperandPair::unify(lhs, rhs)?;
        if lhs.kind() != pair.kind() || rhs.kind() != pair.kind() {
            events.push(EvaluationEvent::OperandsPromoted {
                operation,
                lhs: lhs.kind(),
                rhs: rhs.kind(),
                common: pair.kind(),
            });
        }

        let result = match pair {
            OperandPair::Integer(a, b) => match self.resolve_pair(op, a, b, events) {
                Err(ArithmeticError::IncompatibleRepresentations) => {
                    events.push(EvaluationEvent::OperandsPromoted {
                        operation,
                        lhs: RepresentationKind::Integer,
                        rhs: RepresentationKind::Integer,
                        common: RepresentationKind::Decimal,
                    });
                    self.resolve_pair(op, Decimal::from(a), Decimal::from(b), events)
                        .map(Operand::Decimal)
                },
                other => other.map(Operand::Integer),
            },
            OperandPair::Decimal(a, b) => self.resolve_pair(op, a, b, events).map(Operand::Decimal),
            OperandPair::Float32(a, b) => self.resolve_pair(op, a, b, events).map(Operand::Float32),
            OperandPair::Float64(a, b) => self.resolve_pair(op, a, b, events).map(Operand::Float64),
            OperandPair::Interval32(a, b) => {
                self.resolve_pair(op, a, b, events).map(Operand::Interval32)
            },
            OperandPair::Interval64(a, b) => {
                self.resolve_pair(op, a, b, events).map(Operand::Interval64)
            },
        };
        result.map(Operand::into_cell)
    }

    /// Shortcuts and rearrangement first; the lossy operation only when no
    /// exact path remains.
    fn resolve_pair<T: Resolvable>(
        &self,
        op: PendingOp,
        mut lhs: T,
        mut rhs: T,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<T> {
        let operation = operation_of(op);
        let max_rounds = self.config.max_rearrange_rounds;
        let (outcome, rounds) = resolve(op, &mut lhs, &mut rhs, max_rounds)?;
        let survivor = match outcome {
            Rearranged::RhsAnnihilated => Some(lhs),
            Rearranged::LhsAnnihilated => Some(rhs),
            Rearranged::Unchanged | Rearranged::Progress => None,
        };
        if let Some(result) = survivor {
            tracing::trace!(%operation, ?outcome, rounds, "resolved exactly");
            events.push(EvaluationEvent::ShortcutApplied {
                operation,
                outcome,
                rounds,
            });
            return Ok(result);
        }

        let kind = lhs.kind();
        tracing::debug!(%operation, %kind, rounds, "no exact path, falling back to lossy operation");
        events.push(EvaluationEvent::LossyFallback {
            operation,
            kind,
            rounds,
        });
        let result = match op {
            PendingOp::Sum => lhs.lossy_sum(rhs)?,
            PendingOp::Product => lhs.lossy_product(rhs)?,
            PendingOp::Quotient => lhs.lossy_quotient(rhs)?,
        };
        // an exact sum of nonzero floats never rounds to zero
        let vanished = op != PendingOp::Sum
            && result.is_zero()
            && !lhs.is_zero()
            && !rhs.is_zero()
            && rhs.is_finite();
        if vanished {
            let negative = lhs.is_negative() != rhs.is_negative();
            return self.guard_underflow(operation, result, negative, events);
        }
        Ok(result)
    }

    /// Apply the underflow policy to a result that rounded to zero.
    fn guard_underflow<T: Resolvable>(
        &self,
        operation: Operation,
        result: T,
        negative: bool,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<T> {
        let Some(floor) = T::underflow_floor(negative) else {
            return Ok(result);
        };
        match self.config.underflow_policy {
            UnderflowPolicy::Fatal => Err(ArithmeticError::Underflow),
            UnderflowPolicy::Graceful => {
                tracing::debug!(%operation, "underflow replaced by smallest magnitude");
                events.push(EvaluationEvent::UnderflowRecovered { operation });
                Ok(floor)
            },
        }
    }

    fn evaluate_power(
        &self,
        base: MagnitudeCell,
        exponent: i64,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<MagnitudeCell> {
        let operand = self.prepare(Operation::Power, base, events)?;
        let result = match operand {
            Operand::Integer(x) => match exact_power(x, 0, 1, exponent) {
                Err(ArithmeticError::IncompatibleRepresentations) => {
                    events.push(EvaluationEvent::OperandsPromoted {
                        operation: Operation::Power,
                        lhs: RepresentationKind::Integer,
                        rhs: RepresentationKind::Integer,
                        common: RepresentationKind::Decimal,
                    });
                    exact_power(Decimal::from(x), Decimal::ZERO, Decimal::ONE, exponent)
                        .map(Operand::Decimal)
                },
                other => other.map(Operand::Integer),
            },
            Operand::Decimal(x) => {
                exact_power(x, Decimal::ZERO, Decimal::ONE, exponent).map(Operand::Decimal)
            },
            Operand::Float32(x) => self.float_power(x, exponent, events).map(Operand::Float32),
            Operand::Float64(x) => self.float_power(x, exponent, events).map(Operand::Float64),
            Operand::Interval32(x) => {
                self.float_power(x, exponent, events).map(Operand::Interval32)
            },
            Operand::Interval64(x) => {
                self.float_power(x, exponent, events).map(Operand::Interval64)
            },
        };
        result.map(Operand::into_cell)
    }

    fn float_power<V>(
        &self,
        base: V,
        exponent: i64,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<V>
    where
        V: SeriesOperand + Resolvable,
    {
        let result = self.series.eval(&PowerTerm::new(base, exponent))?;
        let vanished = Magnitude::is_zero(&result)
            && !Magnitude::is_zero(&base)
            && Magnitude::is_finite(&base);
        if vanished {
            let negative = Magnitude::is_negative(&base) && exponent % 2 != 0;
            return self.guard_underflow(Operation::Power, result, negative, events);
        }
        Ok(result)
    }

    fn evaluate_series(
        &self,
        base: MagnitudeCell,
        exponent: i64,
        divisor: IntegerRange<i64>,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<MagnitudeCell> {
        let operation = Operation::SeriesQuotient;
        let mut operand = self.prepare(operation, base, events)?;
        if matches!(operand, Operand::Integer(_) | Operand::Decimal(_)) {
            let kind = operand.kind();
            operand = operand.promote(RepresentationKind::Interval64)?;
            events.push(EvaluationEvent::OperandsPromoted {
                operation,
                lhs: kind,
                rhs: RepresentationKind::Integer,
                common: RepresentationKind::Interval64,
            });
        }
        let result = match operand {
            Operand::Float32(x) => {
                self.series_quotient(x, exponent, divisor, events).map(Operand::Float32)
            },
            Operand::Float64(x) => {
                self.series_quotient(x, exponent, divisor, events).map(Operand::Float64)
            },
            Operand::Interval32(x) => {
                self.series_quotient(x, exponent, divisor, events).map(Operand::Interval32)
            },
            Operand::Interval64(x) => {
                self.series_quotient(x, exponent, divisor, events).map(Operand::Interval64)
            },
            Operand::Integer(_) | Operand::Decimal(_) => {
                Err(ArithmeticError::IncompatibleRepresentations)
            },
        };
        result.map(Operand::into_cell)
    }

    fn series_quotient<V: SeriesOperand>(
        &self,
        base: V,
        exponent: i64,
        divisor: IntegerRange<i64>,
        events: &mut Vec<EvaluationEvent>,
    ) -> ArithmeticResult<V> {
        let outcome = self
            .series
            .signed_series_quotient(&PowerTerm::new(base, exponent), divisor)?;
        if outcome.underflow_recovered {
            events.push(EvaluationEvent::UnderflowRecovered {
                operation: Operation::SeriesQuotient,
            });
        }
        Ok(outcome.value)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(
            EvaluatorConfig::default(),
            Arc::new(crate::interfaces::NoOpEventHandler),
        )
    }
}
