// ============================================================================
// Evaluation Dispatch
// Per-representation simplification and destructive conversion registry
// ============================================================================

use super::magnitude::{Magnitude, RepresentationKind};
use crate::numeric::Interval;
use rust_decimal::Decimal;

/// Evaluator hooks a representation may register.
pub trait Evaluate {
    /// Would [`Evaluate::simplify_in_place`] change anything.
    fn needs_simplify(&self) -> bool {
        false
    }

    /// Normalise without changing representation. Returns whether the value
    /// changed.
    fn simplify_in_place(&mut self) -> bool {
        false
    }

    /// A cheaper representation of the same value, if one exists.
    fn evaluate_into(&self) -> Option<Box<dyn Magnitude>> {
        None
    }
}

/// Whether `kind` has a registered evaluator. Everything else is treated as
/// already fully simplified.
pub const fn is_registered(kind: RepresentationKind) -> bool {
    matches!(
        kind,
        RepresentationKind::Interval32 | RepresentationKind::Interval64 | RepresentationKind::Decimal
    )
}

macro_rules! dispatch_ref {
    ($value:expr, $method:ident) => {
        match $value.kind() {
            RepresentationKind::Interval32 => {
                $value.downcast_ref::<Interval<f32>>().map(Evaluate::$method)
            },
            RepresentationKind::Interval64 => {
                $value.downcast_ref::<Interval<f64>>().map(Evaluate::$method)
            },
            RepresentationKind::Decimal => $value.downcast_ref::<Decimal>().map(Evaluate::$method),
            _ => None,
        }
    };
}

/// Side-effect-free check behind [`simplify`].
pub fn would_simplify(value: &dyn Magnitude) -> bool {
    dispatch_ref!(value, needs_simplify).unwrap_or(false)
}

/// Simplify in place through the registry.
pub fn simplify(value: &mut dyn Magnitude) -> bool {
    let changed = match value.kind() {
        RepresentationKind::Interval32 => value
            .downcast_mut::<Interval<f32>>()
            .map(Evaluate::simplify_in_place),
        RepresentationKind::Interval64 => value
            .downcast_mut::<Interval<f64>>()
            .map(Evaluate::simplify_in_place),
        RepresentationKind::Decimal => value
            .downcast_mut::<Decimal>()
            .map(Evaluate::simplify_in_place),
        _ => None,
    };
    let changed = changed.unwrap_or(false);
    if changed {
        tracing::trace!(kind = %value.kind(), "simplified in place");
    }
    changed
}

/// Cheaper representation of `value`, if its evaluator provides one.
pub fn destructive_evaluate(value: &dyn Magnitude) -> Option<Box<dyn Magnitude>> {
    let cheaper = dispatch_ref!(value, evaluate_into).flatten();
    if let Some(result) = &cheaper {
        tracing::trace!(from = %value.kind(), to = %result.kind(), "destructive evaluation");
    }
    cheaper
}

/// Replace `slot` by its cheaper representation. Returns whether it changed.
pub fn destructive_evaluate_boxed(slot: &mut Box<dyn Magnitude>) -> bool {
    match destructive_evaluate(slot.as_ref()) {
        Some(cheaper) => {
            *slot = cheaper;
            true
        },
        None => false,
    }
}

/// Simplify, then collapse to the cheapest registered representation.
/// Returns whether anything changed.
pub fn normalize(slot: &mut Box<dyn Magnitude>) -> bool {
    let simplified = simplify(slot.as_mut());
    let mut converted = false;
    // each conversion strictly cheapens the kind, so this terminates
    while destructive_evaluate_boxed(slot) {
        converted = true;
        simplify(slot.as_mut());
    }
    simplified || converted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        assert!(is_registered(RepresentationKind::Interval64));
        assert!(is_registered(RepresentationKind::Decimal));
        assert!(!is_registered(RepresentationKind::Float64));
        assert!(!is_registered(RepresentationKind::Other));
    }

    #[test]
    fn test_unregistered_is_already_simple() {
        let mut value: Box<dyn Magnitude> = Box::new(3.5f64);
        assert!(!would_simplify(value.as_ref()));
        assert!(!simplify(value.as_mut()));
        assert!(destructive_evaluate(value.as_ref()).is_none());
    }

    #[test]
    fn test_degenerate_interval_collapses() {
        let mut slot: Box<dyn Magnitude> = Box::new(Interval::point(2.0f64).unwrap());
        assert!(destructive_evaluate_boxed(&mut slot));
        assert_eq!(slot.downcast_ref::<f64>(), Some(&2.0));
    }

    #[test]
    fn test_decimal_normalizes_to_integer() {
        let mut slot: Box<dyn Magnitude> = Box::new(Decimal::new(4200, 2));
        assert!(normalize(&mut slot));
        assert_eq!(slot.downcast_ref::<i64>(), Some(&42));
    }

    #[test]
    fn test_fractional_decimal_stays() {
        let mut slot: Box<dyn Magnitude> = Box::new(Decimal::new(1250, 3));
        assert!(normalize(&mut slot));
        let value = slot.downcast_ref::<Decimal>().unwrap();
        assert_eq!(value.scale(), 2);
        assert_eq!(*value, Decimal::new(125, 2));
        assert!(!normalize(&mut slot));
    }
}
