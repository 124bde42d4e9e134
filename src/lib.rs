// ============================================================================
// Precise Evaluation Library
// Precision-preserving sums, products and quotients over polymorphic magnitudes
// ============================================================================

//! # Precise Eval
//!
//! Combines numeric values of different representations while deferring or
//! avoiding the rounding of naive floating-point arithmetic.
//!
//! ## Features
//!
//! - **Copy-on-write cells** sharing immutable snapshots until first mutation
//! - **Exact shortcuts** for identities, zeros and infinities
//! - **Exponent rearrangement** that folds operands together without rounding
//! - **Series quotients** dividing by `n!`-sized products without overflow
//! - **Interval enclosures** with outward rounding for rigorous bounds
//! - **No NaN**: indeterminate forms are reported as errors
//!
//! ## Example
//!
//! ```rust
//! use precise_eval::prelude::*;
//! use std::sync::Arc;
//!
//! let evaluator = EvaluatorBuilder::new()
//!     .build(Arc::new(NoOpEventHandler))
//!     .unwrap();
//!
//! // Folded exactly, no rounding step
//! let sum = evaluator
//!     .sum(MagnitudeCell::from_value(1.5f64), MagnitudeCell::from_value(0.25f64))
//!     .unwrap();
//! assert_eq!(sum.downcast_ref::<f64>(), Some(&1.75));
//!
//! // 10^400 / 250! although neither side fits in an f64
//! let quotient = evaluator
//!     .quotient_of_series_products(
//!         MagnitudeCell::from_value(10.0f64),
//!         400,
//!         IntegerRange::new(1, 250),
//!     )
//!     .unwrap();
//! assert!(quotient.downcast_ref::<f64>().is_some_and(|q| q.is_finite()));
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod numeric;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        EvaluatorConfig, IntegerRange, MagnitudeCell, OwnershipCell, PowerTerm, UnderflowPolicy,
    };
    pub use crate::engine::{
        create_from_config, Evaluator, EvaluatorBuilder, Rearranged, SeriesProductEvaluator,
    };
    pub use crate::interfaces::{
        Classified, Domain, EvaluationEvent, EventHandler, InfinityPolicy, LoggingEventHandler,
        Magnitude, NoOpEventHandler, Operation, RepresentationKind,
    };
    pub use crate::numeric::{ArithmeticError, ArithmeticResult, Interval};
}
