// ============================================================================
// Evaluator Configuration
// Underflow handling, rearrangement bounds and operand simplification
// ============================================================================

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Underflow Policy
// ============================================================================

/// What happens when a result falls below the smallest representable magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnderflowPolicy {
    /// Replace the result by the smallest-magnitude value of the same sign
    /// (an interval keeps `0` on the near side)
    #[default]
    Graceful,

    /// Fail with `ArithmeticError::Underflow`
    Fatal,
}

// ============================================================================
// Complete Evaluator Configuration
// ============================================================================

/// Configuration for an [`crate::engine::Evaluator`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluatorConfig {
    /// Underflow handling for drained power-of-two scales and lossy results
    pub underflow_policy: UnderflowPolicy,

    /// Upper bound on shortcut / rearrangement rounds before falling back
    /// to the plain operation
    pub max_rearrange_rounds: u32,

    /// Run the evaluation registry on operands before shortcuts
    pub simplify_operands: bool,
}

impl EvaluatorConfig {
    /// Rounds needed for the widest mantissa in use (f64) with some slack.
    pub const DEFAULT_MAX_ROUNDS: u32 = 128;

    pub fn new(underflow_policy: UnderflowPolicy) -> Self {
        Self {
            underflow_policy,
            max_rearrange_rounds: Self::DEFAULT_MAX_ROUNDS,
            simplify_operands: true,
        }
    }

    /// Builder method: Set the underflow policy
    pub fn with_underflow_policy(mut self, policy: UnderflowPolicy) -> Self {
        self.underflow_policy = policy;
        self
    }

    /// Builder method: Set the rearrangement round limit
    pub fn with_max_rearrange_rounds(mut self, rounds: u32) -> Self {
        self.max_rearrange_rounds = rounds;
        self
    }

    /// Builder method: Enable or disable operand simplification
    pub fn with_simplify_operands(mut self, enabled: bool) -> Self {
        self.simplify_operands = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_rearrange_rounds == 0 {
            return Err("Rearrangement round limit must be at least 1".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self::new(UnderflowPolicy::Graceful)
    }
}

impl EvaluatorConfig {
    /// Strict configuration
    /// - Underflow is an error
    /// - Operands simplified before evaluation
    pub fn strict() -> Self {
        Self::new(UnderflowPolicy::Fatal)
    }

    /// Pass-through configuration
    /// - Graceful underflow
    /// - Operands used exactly as given
    pub fn raw() -> Self {
        Self::new(UnderflowPolicy::Graceful).with_simplify_operands(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EvaluatorConfig::default();
        assert_eq!(config.underflow_policy, UnderflowPolicy::Graceful);
        assert!(config.simplify_operands);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EvaluatorConfig::strict()
            .with_max_rearrange_rounds(8)
            .with_simplify_operands(false);

        assert_eq!(config.underflow_policy, UnderflowPolicy::Fatal);
        assert_eq!(config.max_rearrange_rounds, 8);
        assert!(!config.simplify_operands);
    }

    #[test]
    fn test_validation() {
        let config = EvaluatorConfig::default().with_max_rearrange_rounds(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_configs() {
        assert!(matches!(
            EvaluatorConfig::strict().underflow_policy,
            UnderflowPolicy::Fatal
        ));
        assert!(!EvaluatorConfig::raw().simplify_operands);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let config = EvaluatorConfig::strict().with_max_rearrange_rounds(16);
        let json = serde_json::to_string(&config).unwrap();
        let back: EvaluatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
