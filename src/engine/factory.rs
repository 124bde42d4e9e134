// ============================================================================
// Evaluator Factory
// Creates evaluators with validated configuration
// ============================================================================

use crate::domain::config::{EvaluatorConfig, UnderflowPolicy};
use crate::engine::Evaluator;
use crate::interfaces::EventHandler;
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates an evaluator from configuration
///
/// # Arguments
/// * `config` - Evaluator configuration
/// * `event_handler` - Handler for shortcut, fallback and failure events
///
/// # Returns
/// * `Result<Evaluator, String>` - Configured evaluator or error
///
/// # Example
/// ```
/// use precise_eval::prelude::*;
/// use precise_eval::engine::factory::create_from_config;
/// use std::sync::Arc;
///
/// let evaluator = create_from_config(EvaluatorConfig::strict(), Arc::new(NoOpEventHandler)).unwrap();
/// ```
pub fn create_from_config(
    config: EvaluatorConfig,
    event_handler: Arc<dyn EventHandler>,
) -> Result<Evaluator, String> {
    config.validate()?;
    Ok(Evaluator::new(config, event_handler))
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating evaluators with fluent API
///
/// # Example
/// ```
/// use precise_eval::prelude::*;
/// use std::sync::Arc;
///
/// let evaluator = EvaluatorBuilder::new()
///     .fatal_underflow()
///     .with_max_rearrange_rounds(64)
///     .build(Arc::new(NoOpEventHandler))
///     .unwrap();
/// assert_eq!(evaluator.config().max_rearrange_rounds, 64);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvaluatorBuilder {
    config: EvaluatorConfig,
}

impl EvaluatorBuilder {
    /// Create a builder starting from the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    // ========================================================================
    // Underflow Handling
    // ========================================================================

    /// Replace vanished results by the smallest magnitude (default)
    pub fn graceful_underflow(mut self) -> Self {
        self.config.underflow_policy = UnderflowPolicy::Graceful;
        self
    }

    /// Fail with `ArithmeticError::Underflow`
    pub fn fatal_underflow(mut self) -> Self {
        self.config.underflow_policy = UnderflowPolicy::Fatal;
        self
    }

    // ========================================================================
    // Additional Configuration
    // ========================================================================

    pub fn with_max_rearrange_rounds(mut self, rounds: u32) -> Self {
        self.config.max_rearrange_rounds = rounds;
        self
    }

    pub fn with_simplify_operands(mut self, enabled: bool) -> Self {
        self.config.simplify_operands = enabled;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the evaluator
    pub fn build(self, event_handler: Arc<dyn EventHandler>) -> Result<Evaluator, String> {
        create_from_config(self.config, event_handler)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &EvaluatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::NoOpEventHandler;

    #[test]
    fn test_create_default_evaluator() {
        let evaluator =
            create_from_config(EvaluatorConfig::default(), Arc::new(NoOpEventHandler)).unwrap();
        assert_eq!(evaluator.config().underflow_policy, UnderflowPolicy::Graceful);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EvaluatorConfig::default().with_max_rearrange_rounds(0);
        assert!(create_from_config(config, Arc::new(NoOpEventHandler)).is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let evaluator = EvaluatorBuilder::new()
            .fatal_underflow()
            .with_simplify_operands(false)
            .build(Arc::new(NoOpEventHandler))
            .unwrap();

        assert_eq!(evaluator.config().underflow_policy, UnderflowPolicy::Fatal);
        assert_eq!(evaluator.series().policy(), UnderflowPolicy::Fatal);
        assert!(!evaluator.config().simplify_operands);
    }

    #[test]
    fn test_builder_from_preset() {
        let builder = EvaluatorBuilder::from_config(EvaluatorConfig::strict()).graceful_underflow();
        assert_eq!(builder.get_config().underflow_policy, UnderflowPolicy::Graceful);
        assert!(builder
            .with_max_rearrange_rounds(0)
            .build(Arc::new(NoOpEventHandler))
            .is_err());
    }
}
