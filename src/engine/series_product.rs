// ============================================================================
// Series Product Evaluator
// Quotients by long integer products and powers without materialising them
// ============================================================================
//
// The running value is brought back to mantissa form (frexp exponent 1)
// before every real division, its true power-of-two scale parked in a
// RadixCounter. Divisors are split into an odd part and a power of two: the
// power of two shifts the value directly while the shift stays exact and
// spills into the counter otherwise. Odd parts are multiplied into an
// accumulator that never exceeds the largest exactly representable integer.
// Before any real division the accumulator is reduced by its gcd with the
// value's odd significand, which divides out exactly. Whatever the counter
// still holds at the end is applied once.

use crate::domain::{IntegerRange, PowerBase, PowerTerm, UnderflowPolicy};
use crate::domain::power_term::power_by_squaring;
use crate::interfaces::Magnitude;
use crate::numeric::{
    enclose_integer, exponent_of, gcd, ldexp, split_power_of_two, ArithmeticError,
    ArithmeticResult, BinaryFloat, FloatStats, Interval, LossyArithmetic, RadixCounter,
};

// ============================================================================
// Operand Hooks
// ============================================================================

/// Values the series evaluator can divide.
pub trait SeriesOperand: PowerBase + Magnitude {
    /// frexp exponent of the largest finite nonzero part.
    fn leading_exponent(&self) -> Option<i32>;

    /// Odd integer dividing every finite nonzero part's significand.
    fn odd_factor(&self) -> u64;

    /// Multiply by `2^n`. Exact for scalars landing in the normal range;
    /// intervals round outward.
    fn shift(&mut self, n: i64);

    /// Divide by an integer that may exceed the exact integer range.
    fn divide_by(self, divisor: u64) -> ArithmeticResult<Self>;

    /// Apply a pending scale. Growth past the largest finite value fails
    /// with `Overflow`; the flag reports a result that vanished below the
    /// smallest magnitude and was replaced by it.
    fn drain(self, scale: i128) -> ArithmeticResult<(Self, bool)>;

    /// Smallest-magnitude value on this value's side of zero.
    fn underflow_floor(&self) -> Self;

    fn negated(self) -> Self;
}

#[inline]
fn clamp_shift(n: i128) -> i64 {
    n.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// `x * 2^n` rounded away from the exact value in the requested direction,
/// never crossing zero.
fn scale_directed<F: BinaryFloat>(x: F, n: i64, upward: bool) -> F {
    if n == 0 || x.is_zero() || x.is_infinite() {
        return x;
    }
    let scaled = ldexp(x, n);
    if !scaled.is_finite() || ldexp(scaled, -n) == x {
        return scaled;
    }
    let stepped = if upward {
        scaled.step_up()
    } else {
        scaled.step_down()
    };
    if (x > F::zero()) != (stepped > F::zero()) && !stepped.is_zero() {
        F::zero()
    } else {
        stepped
    }
}

fn scalar_drain<F: BinaryFloat>(x: F, scale: i128) -> ArithmeticResult<(F, bool)> {
    if scale == 0 || x.is_zero() || x.is_infinite() {
        return Ok((x, false));
    }
    let drained = ldexp(x, clamp_shift(scale));
    if drained.is_infinite() {
        return Err(ArithmeticError::Overflow("series quotient"));
    }
    if drained.is_zero() {
        return Ok((F::denorm_min().copysign(x), true));
    }
    Ok((drained, false))
}

fn interval_shift<F: BinaryFloat>(x: &Interval<F>, n: i64) -> Interval<F> {
    Interval::from_bounds(scale_directed(x.lo(), n, false), scale_directed(x.hi(), n, true))
}

fn interval_drain<F: BinaryFloat>(
    x: Interval<F>,
    scale: i128,
) -> ArithmeticResult<(Interval<F>, bool)> {
    let drained = interval_shift(&x, clamp_shift(scale));
    let overflowed = (x.lo().is_finite() && drained.lo().is_infinite())
        || (x.hi().is_finite() && drained.hi().is_infinite());
    if overflowed {
        return Err(ArithmeticError::Overflow("series quotient"));
    }
    let tiny = F::denorm_min();
    let vanished = !x.contains_zero() && drained.lo().abs() <= tiny && drained.hi().abs() <= tiny;
    Ok((drained, vanished))
}

fn interval_odd_factor<F: BinaryFloat>(x: &Interval<F>) -> u64 {
    let common = [x.lo(), x.hi()]
        .into_iter()
        .filter_map(FloatStats::of)
        .fold(0, |acc, stats| gcd(acc, stats.odd_significand()));
    common.max(1)
}

fn interval_leading_exponent<F: BinaryFloat>(x: &Interval<F>) -> Option<i32> {
    match (exponent_of(x.lo()), exponent_of(x.hi())) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

macro_rules! impl_series_operand {
    ($t:ty) => {
        impl SeriesOperand for $t {
            fn leading_exponent(&self) -> Option<i32> {
                exponent_of(*self)
            }

            fn odd_factor(&self) -> u64 {
                FloatStats::of(*self).map_or(1, |stats| stats.odd_significand())
            }

            fn shift(&mut self, n: i64) {
                *self = ldexp(*self, n);
            }

            fn divide_by(self, divisor: u64) -> ArithmeticResult<Self> {
                let divisor = <$t>::from_u64_exact(divisor)
                    .unwrap_or_else(|| <$t>::from_u64_rounded(divisor));
                self.lossy_quotient(divisor)
            }

            fn drain(self, scale: i128) -> ArithmeticResult<(Self, bool)> {
                scalar_drain(self, scale)
            }

            fn underflow_floor(&self) -> Self {
                <$t>::denorm_min().copysign(*self)
            }

            fn negated(self) -> Self {
                -self
            }
        }

        impl SeriesOperand for Interval<$t> {
            fn leading_exponent(&self) -> Option<i32> {
                interval_leading_exponent(self)
            }

            fn odd_factor(&self) -> u64 {
                interval_odd_factor(self)
            }

            fn shift(&mut self, n: i64) {
                *self = interval_shift(self, n);
            }

            fn divide_by(self, divisor: u64) -> ArithmeticResult<Self> {
                let (lo, hi) = enclose_integer::<$t>(divisor as i128);
                self.lossy_quotient(Interval::new(lo, hi)?)
            }

            fn drain(self, scale: i128) -> ArithmeticResult<(Self, bool)> {
                interval_drain(self, scale)
            }

            fn underflow_floor(&self) -> Self {
                let tiny = <$t>::denorm_min();
                if self.is_negative() {
                    Interval::from_bounds(-tiny, 0.0)
                } else {
                    Interval::from_bounds(0.0, tiny)
                }
            }

            fn negated(self) -> Self {
                Interval::negated(self)
            }
        }
    };
}

impl_series_operand!(f32);
impl_series_operand!(f64);

// ============================================================================
// Running State
// ============================================================================

/// `value * 2^counter` with `accumulator` still pending as a divisor.
#[derive(Debug, Clone, Copy)]
struct SeriesState<V> {
    value: V,
    counter: RadixCounter,
    accumulator: u64,
}

impl<V: SeriesOperand> SeriesState<V> {
    fn new(value: V) -> ArithmeticResult<Self> {
        let mut state = Self {
            value,
            counter: RadixCounter::new(),
            accumulator: 1,
        };
        state.rebase()?;
        Ok(state)
    }

    /// `base^exponent`, rebasing after every step so nothing overflows.
    fn powered(base: V, exponent: u64) -> ArithmeticResult<Self> {
        let mut square = Self::new(base)?;
        let mut result = Self::new(V::one())?;
        let mut remaining = exponent;
        while remaining > 0 {
            if remaining % 2 == 1 {
                result.value = result.value.lossy_product(square.value)?;
                result.counter.try_shift(square.counter.value())?;
                result.rebase()?;
                remaining -= 1;
            } else {
                square.value = square.value.lossy_square()?;
                square.counter.try_shift(square.counter.value())?;
                square.rebase()?;
                remaining /= 2;
            }
        }
        Ok(result)
    }

    /// Move the value's exponent into the counter.
    fn rebase(&mut self) -> ArithmeticResult<()> {
        let Some(exponent) = self.value.leading_exponent() else {
            return Ok(());
        };
        let shift = 1 - exponent as i64;
        if shift != 0 {
            self.value.shift(shift);
            self.counter.try_shift(-(shift as i128))?;
        }
        Ok(())
    }

    /// Apply `2^n` to the value as far as its exact range allows and park
    /// the rest.
    fn shift_exact(&mut self, n: i64) -> ArithmeticResult<()> {
        let direct = self.value.safe_scale_range().clamp(n);
        if direct != 0 {
            self.value.shift(direct);
        }
        let parked = n - direct;
        if parked > 0 {
            self.counter.try_add(parked as u64)
        } else {
            self.counter.try_sub(parked.unsigned_abs())
        }
    }

    /// Move as much of the parked scale back into the value as stays exact.
    fn settle(&mut self) {
        let range = self.value.safe_scale_range();
        let room = if self.counter.value() > 0 {
            range.max
        } else {
            -range.min.max(-i64::MAX)
        };
        let step = self.counter.drain(room as u64);
        if step != 0 {
            self.value.shift(clamp_shift(step));
        }
    }

    fn divide_series(&mut self, divisor: IntegerRange<u64>) -> ArithmeticResult<()> {
        let cap = V::Float::max_exact_integer();
        for factor in divisor {
            let (odd, twos) = split_power_of_two(factor);
            self.shift_exact(-(twos as i64))?;
            if odd == 1 {
                continue;
            }
            match self.accumulator.checked_mul(odd).filter(|product| *product <= cap) {
                Some(product) => self.accumulator = product,
                None => {
                    self.flush()?;
                    if odd > cap {
                        self.divide_rest(odd)?;
                    } else {
                        self.accumulator = odd;
                    }
                },
            }
        }
        self.flush()
    }

    /// Divide by the accumulator, cancelling common odd factors exactly.
    fn flush(&mut self) -> ArithmeticResult<()> {
        let divisor = std::mem::replace(&mut self.accumulator, 1);
        if divisor <= 1 {
            return Ok(());
        }
        let common = gcd(divisor, self.value.odd_factor());
        if common > 1 {
            self.value = self.value.divide_by(common)?;
            tracing::trace!(common, "odd factor cancelled exactly");
        }
        self.divide_rest(divisor / common)
    }

    fn divide_rest(&mut self, divisor: u64) -> ArithmeticResult<()> {
        if divisor > 1 {
            // divide at full precision, never in the subnormal range
            self.rebase()?;
            self.value = self.value.divide_by(divisor)?;
            tracing::trace!(divisor, "rounded division");
        }
        self.rebase()
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// Result of a series quotient and whether underflow was replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesOutcome<V> {
    pub value: V,
    pub underflow_recovered: bool,
}

impl<V> SeriesOutcome<V> {
    fn exact(value: V) -> Self {
        Self {
            value,
            underflow_recovered: false,
        }
    }
}

fn zero_divisor<V: PowerBase>(numerator: &V) -> ArithmeticError {
    if numerator.is_zero_base() {
        ArithmeticError::IndeterminateForm("zero / zero")
    } else {
        ArithmeticError::DivisionByZero
    }
}

/// Divides values by products of integer ranges and by powers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesProductEvaluator {
    policy: UnderflowPolicy,
}

impl SeriesProductEvaluator {
    pub fn new(policy: UnderflowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnderflowPolicy {
        self.policy
    }

    /// `base^exponent` by repeated squaring.
    pub fn eval<V: SeriesOperand>(&self, term: &PowerTerm<V>) -> ArithmeticResult<V> {
        term.eval()
    }

    /// `value / divisor`, divided directly.
    pub fn quotient_by_integer<V: SeriesOperand>(
        &self,
        value: V,
        divisor: u64,
    ) -> ArithmeticResult<V> {
        self.integer_quotient(value, divisor).map(|outcome| outcome.value)
    }

    /// `value / (lo * (lo + 1) * ... * hi)`
    pub fn quotient_by_series_product<V: SeriesOperand>(
        &self,
        value: V,
        divisor: IntegerRange<u64>,
    ) -> ArithmeticResult<V> {
        self.series_quotient(value, divisor).map(|outcome| outcome.value)
    }

    /// `term / (lo * (lo + 1) * ... * hi)`
    pub fn quotient_of_series_products<V: SeriesOperand>(
        &self,
        term: &PowerTerm<V>,
        divisor: IntegerRange<u64>,
    ) -> ArithmeticResult<V> {
        self.power_series_quotient(term, divisor).map(|outcome| outcome.value)
    }

    /// `term / divisor`
    pub fn power_quotient<V: SeriesOperand>(
        &self,
        term: &PowerTerm<V>,
        divisor: u64,
    ) -> ArithmeticResult<V> {
        self.quotient_of_series_products(term, IntegerRange::single(divisor))
    }

    /// Signed range: negative ranges divide by their magnitudes and flip the
    /// sign for an odd factor count. A range containing zero fails.
    pub fn quotient_of_series_products_signed<V: SeriesOperand>(
        &self,
        term: &PowerTerm<V>,
        divisor: IntegerRange<i64>,
    ) -> ArithmeticResult<V> {
        self.signed_series_quotient(term, divisor).map(|outcome| outcome.value)
    }

    pub fn quotient_by_series_product_signed<V: SeriesOperand>(
        &self,
        value: V,
        divisor: IntegerRange<i64>,
    ) -> ArithmeticResult<V> {
        self.quotient_of_series_products_signed(&PowerTerm::of(value), divisor)
    }

    // ------------------------------------------------------------------------
    // Outcome-reporting forms
    // ------------------------------------------------------------------------

    pub fn signed_series_quotient<V: SeriesOperand>(
        &self,
        term: &PowerTerm<V>,
        divisor: IntegerRange<i64>,
    ) -> ArithmeticResult<SeriesOutcome<V>> {
        if divisor.is_empty() {
            return term.eval().map(SeriesOutcome::exact);
        }
        if divisor.contains_zero() {
            return Err(zero_divisor(term.base()));
        }
        if divisor.lo() > 0 {
            let unsigned = IntegerRange::new(divisor.lo() as u64, divisor.hi() as u64);
            return self.power_series_quotient(term, unsigned);
        }
        let magnitudes =
            IntegerRange::new(divisor.hi().unsigned_abs(), divisor.lo().unsigned_abs());
        let mut outcome = self.power_series_quotient(term, magnitudes)?;
        if divisor.size() % 2 == 1 {
            outcome.value = outcome.value.negated();
        }
        Ok(outcome)
    }

    pub fn integer_quotient<V: SeriesOperand>(
        &self,
        value: V,
        divisor: u64,
    ) -> ArithmeticResult<SeriesOutcome<V>> {
        match divisor {
            0 => Err(zero_divisor(&value)),
            1 => Ok(SeriesOutcome::exact(value)),
            _ => {
                let quotient = value.divide_by(divisor)?;
                let vanished = quotient.is_zero_base() && !value.is_zero_base();
                if vanished {
                    return self.recover(&value);
                }
                Ok(SeriesOutcome::exact(quotient))
            },
        }
    }

    pub fn series_quotient<V: SeriesOperand>(
        &self,
        value: V,
        mut divisor: IntegerRange<u64>,
    ) -> ArithmeticResult<SeriesOutcome<V>> {
        if divisor.lo() == 1 {
            divisor.pop_front();
        }
        if divisor.is_empty() {
            return Ok(SeriesOutcome::exact(value));
        }
        if divisor.lo() == 0 {
            return Err(zero_divisor(&value));
        }
        if divisor.is_single() {
            return self.integer_quotient(value, divisor.lo());
        }
        if value.leading_exponent().is_none() {
            // zero and infinities are fixed points of positive divisors
            return Ok(SeriesOutcome::exact(value));
        }

        tracing::trace!(%divisor, "series quotient");
        let sign_source = value;
        let state = SeriesState::new(value).and_then(|mut state| {
            state.divide_series(divisor)?;
            Ok(state)
        });
        self.finish(state, &sign_source)
    }

    pub fn power_series_quotient<V: SeriesOperand>(
        &self,
        term: &PowerTerm<V>,
        mut divisor: IntegerRange<u64>,
    ) -> ArithmeticResult<SeriesOutcome<V>> {
        if term.is_degenerate() {
            return Err(ArithmeticError::IndeterminateForm("zero to the power zero"));
        }
        let (base, exponent) = term.positive_parts()?;
        if exponent == 1 {
            return self.series_quotient(base, divisor);
        }
        if divisor.lo() == 1 {
            divisor.pop_front();
        }
        if divisor.is_empty() {
            return power_by_squaring(base, V::one(), exponent).map(SeriesOutcome::exact);
        }
        if divisor.lo() == 0 {
            return Err(zero_divisor(&base));
        }
        if base.leading_exponent().is_none() {
            return power_by_squaring(base, V::one(), exponent).map(SeriesOutcome::exact);
        }

        tracing::trace!(exponent, %divisor, "power series quotient");
        let sign_source = if exponent % 2 == 0 { V::one() } else { base };
        let state = SeriesState::powered(base, exponent).and_then(|mut state| {
            state.divide_series(divisor)?;
            Ok(state)
        });
        self.finish(state, &sign_source)
    }

    fn finish<V: SeriesOperand>(
        &self,
        state: ArithmeticResult<SeriesState<V>>,
        sign_source: &V,
    ) -> ArithmeticResult<SeriesOutcome<V>> {
        let state = match state {
            Ok(state) => state,
            Err(ArithmeticError::Underflow) => return self.recover(sign_source),
            Err(err) => return Err(err),
        };
        let mut state = state;
        state.settle();
        let (value, vanished) = state.value.drain(state.counter.value())?;
        if vanished {
            return self.recover(&value);
        }
        Ok(SeriesOutcome::exact(value))
    }

    fn recover<V: SeriesOperand>(&self, sign_source: &V) -> ArithmeticResult<SeriesOutcome<V>> {
        match self.policy {
            UnderflowPolicy::Fatal => Err(ArithmeticError::Underflow),
            UnderflowPolicy::Graceful => {
                tracing::debug!("series quotient underflow replaced by smallest magnitude");
                Ok(SeriesOutcome {
                    value: sign_source.underflow_floor(),
                    underflow_recovered: true,
                })
            },
        }
    }
}
