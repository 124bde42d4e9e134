// ============================================================================
// Event Handler Interface
// Defines the contract for observing evaluation decisions
// ============================================================================

use super::magnitude::RepresentationKind;
use crate::engine::Rearranged;
use crate::numeric::ArithmeticError;
use std::fmt;

/// Operation requested from the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sum,
    Product,
    Quotient,
    Scale,
    Power,
    SeriesQuotient,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Sum => "sum",
            Operation::Product => "product",
            Operation::Quotient => "quotient",
            Operation::Scale => "scale",
            Operation::Power => "power",
            Operation::SeriesQuotient => "series quotient",
        };
        f.write_str(name)
    }
}

/// Events emitted by the evaluator
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationEvent {
    /// Operands converted to a common representation
    OperandsPromoted {
        operation: Operation,
        lhs: RepresentationKind,
        rhs: RepresentationKind,
        common: RepresentationKind,
    },

    /// An operand was simplified or collapsed before evaluation
    OperandSimplified {
        operation: Operation,
        kind: RepresentationKind,
    },

    /// A trivial shortcut or exact rearrangement resolved the operation
    ShortcutApplied {
        operation: Operation,
        outcome: Rearranged,
        rounds: u32,
    },

    /// No exact path remained; the plain operation was performed
    LossyFallback {
        operation: Operation,
        kind: RepresentationKind,
        rounds: u32,
    },

    /// Underflow replaced by the smallest-magnitude representable value
    UnderflowRecovered { operation: Operation },

    /// The operation failed
    EvaluationFailed {
        operation: Operation,
        error: ArithmeticError,
    },
}

/// Event handler trait for processing evaluator events
/// Implementations can handle logging, auditing, statistics, etc.
pub trait EventHandler: Send + Sync {
    /// Handle an evaluation event
    fn on_event(&self, event: EvaluationEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<EvaluationEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: EvaluationEvent) {}
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: EvaluationEvent) {
        tracing::debug!("Evaluator event: {:?}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_noop_handler() {
        let handler = NoOpEventHandler;
        handler.on_event(EvaluationEvent::UnderflowRecovered {
            operation: Operation::SeriesQuotient,
        });
    }

    #[test]
    fn test_batch_dispatch() {
        struct Recording(Mutex<Vec<EvaluationEvent>>);
        impl EventHandler for Recording {
            fn on_event(&self, event: EvaluationEvent) {
                self.0.lock().unwrap().push(event);
            }
        }

        let handler = Recording(Mutex::new(Vec::new()));
        handler.on_events(vec![
            EvaluationEvent::ShortcutApplied {
                operation: Operation::Sum,
                outcome: Rearranged::RhsAnnihilated,
                rounds: 1,
            },
            EvaluationEvent::EvaluationFailed {
                operation: Operation::Quotient,
                error: ArithmeticError::DivisionByZero,
            },
        ]);
        let seen = handler.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[1],
            EvaluationEvent::EvaluationFailed {
                error: ArithmeticError::DivisionByZero,
                ..
            }
        ));
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::SeriesQuotient.to_string(), "series quotient");
    }
}
