//! Per-round step allowance and theory broadcast.

use crate::classifier::LiteralClassifier;
use crate::config::MIN_BOOL_STEPS;
use oxils_sat::BoolLocalSearch;
use oxils_theories::LocalSearchTheory;

/// What one bounds phase measured and granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundBounds {
    /// Steps granted to the Boolean engine
    pub max_bool_steps: u64,
    /// Literals over all falsified clauses
    pub num_literals: usize,
    /// Propositional literals among them
    pub num_bool: usize,
    /// Theory-carrying literals, each broadcast to every theory
    pub num_theory_nodes: usize,
}

/// Sizes the Boolean engine's effort from the falsified clauses.
#[derive(Debug, Clone, Copy)]
pub struct BoundsSetter {
    multiplier: u64,
}

impl BoundsSetter {
    /// Create with the step multiplier `L`.
    #[must_use]
    pub fn new(multiplier: u64) -> Self {
        Self { multiplier }
    }

    /// The step multiplier.
    #[must_use]
    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// Allowance for a round with `num_bool` propositional literals.
    #[must_use]
    pub fn budget(&self, num_bool: usize) -> u64 {
        MIN_BOOL_STEPS.max(self.multiplier.saturating_mul(num_bool as u64))
    }

    /// Walk the engine's falsified clauses, broadcast every theory-carrying
    /// literal to every theory, and compute the next allowance.
    ///
    /// `num_literals` only reaches the theories through `set_bounds_end`;
    /// it does not scale the allowance.
    pub fn compute<E>(
        &self,
        engine: &E,
        classifier: &LiteralClassifier<'_>,
        theories: &mut [Box<dyn LocalSearchTheory>],
    ) -> RoundBounds
    where
        E: BoolLocalSearch + ?Sized,
    {
        for theory in theories.iter_mut() {
            theory.set_bounds_begin();
        }

        let mut bounds = RoundBounds::default();
        for id in engine.unsat_set() {
            for lit in engine.get_clause_info(id).clause() {
                bounds.num_literals += 1;
                match classifier.theory_node(lit) {
                    None => bounds.num_bool += 1,
                    Some(node) => {
                        bounds.num_theory_nodes += 1;
                        for theory in theories.iter_mut() {
                            theory.set_bounds(node);
                        }
                    }
                }
            }
        }
        bounds.max_bool_steps = self.budget(bounds.num_bool);

        for theory in theories.iter_mut() {
            theory.set_bounds_end(bounds.num_literals);
        }
        bounds
    }
}
