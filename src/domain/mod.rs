// ============================================================================
// Domain Models Module
// Value containers, concrete representations and configuration
// ============================================================================

pub mod config;
pub mod integer_range;
pub mod ownership_cell;
pub mod power_term;
pub mod representations;

pub use config::{EvaluatorConfig, UnderflowPolicy};
pub use integer_range::IntegerRange;
pub use ownership_cell::{MagnitudeCell, OwnershipCell, TypedAccess};
pub use power_term::{PowerBase, PowerTerm};
pub use representations::float_scale_range;
