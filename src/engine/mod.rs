// ============================================================================
// Engine Module
// Shortcut, rearrangement and series algorithms plus the evaluator facade
// ============================================================================

mod evaluator;
mod operands;
mod rearrange;
mod series_product;
mod trivial;

pub mod factory;

pub use evaluator::{Evaluator, Resolvable};
pub use factory::{create_from_config, EvaluatorBuilder};
pub use operands::{common_kind, enclose_decimal, Operand, OperandPair};
pub use rearrange::{
    rearrange_product_interval, rearrange_product_scalar, rearrange_sum_interval,
    rearrange_sum_scalar, resolve, PendingOp, Rearrange,
};
pub use series_product::{SeriesOperand, SeriesOutcome, SeriesProductEvaluator};
pub use trivial::{
    trivial_product_interval, trivial_product_scalar, trivial_quotient_interval,
    trivial_quotient_scalar, trivial_sum_interval, trivial_sum_scalar, Rearranged,
};
