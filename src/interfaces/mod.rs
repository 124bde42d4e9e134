// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod domain_lattice;
mod event_handler;
mod magnitude;

pub mod evaluation;

pub use domain_lattice::{Classified, Domain, InfinityPolicy};
pub use evaluation::Evaluate;
pub use event_handler::{
    EvaluationEvent, EventHandler, LoggingEventHandler, NoOpEventHandler, Operation,
};
pub use magnitude::{scaled, DeepClone, Magnitude, RepresentationKind, ScaleRange};
