//! Local-search configuration

use oxils_core::{OxilsError, Result};
use oxils_sat::DdfwConfig;
use serde::{Deserialize, Serialize};

/// Smallest step allowance granted to the Boolean engine in one round.
pub const MIN_BOOL_STEPS: u64 = 10_000;

/// Maximum number of rounds per local-search call.
pub const MAX_ROUNDS: u32 = 30;

/// Configuration for theory-aware local search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSearchConfig {
    /// Steps granted per propositional literal of a falsified clause
    pub l_multiplier: u64,
    /// Seed of the generator that seeds each engine
    pub random_seed: u64,
    /// Boolean engine parameters
    pub ddfw: DdfwConfig,
    /// Pin theory-carrying variables to their current values while the
    /// Boolean engine runs
    pub assume_theory_literals: bool,
    /// Replay flips so the engine continues from its best model after each
    /// bounded search
    pub restore_best_model: bool,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            l_multiplier: 20,
            random_seed: 0,
            ddfw: DdfwConfig::default(),
            assume_theory_literals: false,
            restore_best_model: false,
        }
    }
}

impl LocalSearchConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| OxilsError::Config(e.to_string()))
    }

    /// Set the step multiplier `L`
    #[must_use]
    pub fn with_l_multiplier(mut self, l_multiplier: u64) -> Self {
        self.l_multiplier = l_multiplier;
        self
    }

    /// Set the random seed
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Set the Boolean engine parameters
    #[must_use]
    pub fn with_ddfw(mut self, ddfw: DdfwConfig) -> Self {
        self.ddfw = ddfw;
        self
    }

    /// Enable or disable assumption injection
    #[must_use]
    pub fn with_assume_theory_literals(mut self, enable: bool) -> Self {
        self.assume_theory_literals = enable;
        self
    }

    /// Enable or disable restoring the best model between rounds
    #[must_use]
    pub fn with_restore_best_model(mut self, enable: bool) -> Self {
        self.restore_best_model = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LocalSearchConfig::default();
        assert_eq!(config.l_multiplier, 20);
        assert!(!config.assume_theory_literals);
        assert!(!config.restore_best_model);
        assert_eq!(config.ddfw, DdfwConfig::default());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            LocalSearchConfig::from_json(r#"{"l_multiplier": 50, "ddfw": {"restart_base": 7}}"#)
                .unwrap();
        assert_eq!(config.l_multiplier, 50);
        assert_eq!(config.random_seed, 0);
        assert_eq!(config.ddfw.restart_base, 7);
        assert_eq!(
            config.ddfw.init_clause_weight,
            DdfwConfig::default().init_clause_weight
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = LocalSearchConfig::from_json(r#"{"l_multiplier": "many"}"#).unwrap_err();
        assert!(matches!(err, OxilsError::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = LocalSearchConfig::default()
            .with_l_multiplier(3)
            .with_random_seed(42)
            .with_assume_theory_literals(true)
            .with_restore_best_model(true);
        assert_eq!(config.l_multiplier, 3);
        assert_eq!(config.random_seed, 42);
        assert!(config.assume_theory_literals);
        assert!(config.restore_best_model);
    }
}
