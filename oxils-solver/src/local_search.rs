//! Round-based local search over Boolean and theory reasoning.
//!
//! Each round sizes the Boolean engine's allowance from the falsified
//! clauses, runs the engine within that allowance, then lets every theory
//! refine the phase in place. The loop stops at the first round that leaves
//! no falsified clause, after [`MAX_ROUNDS`] rounds, or once the caller's
//! resource limit is cancelled. The engine's best model is finally copied
//! back into the phase.
//!
//! The call never reports unsatisfiability.

use crate::bounds::{BoundsSetter, RoundBounds};
use crate::classifier::LiteralClassifier;
use crate::config::{LocalSearchConfig, MAX_ROUNDS};
use oxils_core::{Lit, ResourceLimit, Result, Var};
use oxils_sat::{BoolLocalSearch, Cnf, SearchResult};
use oxils_theories::{LocalSearchTheory, TheoryContext};
use std::ops::{Deref, DerefMut};
use tracing::debug;

/// Outcome of a local-search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSearchResult {
    /// The engine's candidate satisfies every clause
    Satisfied,
    /// Rounds, steps or the resource limit ran out first
    Undetermined,
}

impl LocalSearchResult {
    /// Did the search find a satisfying candidate?
    #[must_use]
    pub fn is_satisfied(self) -> bool {
        self == Self::Satisfied
    }
}

/// Local-search statistics
#[derive(Debug, Clone, Default)]
pub struct LocalSearchStats {
    /// Local-search calls
    pub calls: u64,
    /// Rounds over all calls
    pub rounds: u64,
    /// Steps granted to the Boolean engine over all rounds
    pub bool_steps: u64,
    /// Theory-carrying literals broadcast over all rounds
    pub theory_nodes: u64,
    /// Literals of falsified clauses in the latest round
    pub last_num_literals: usize,
    /// Propositional literals among them
    pub last_num_bool: usize,
    /// Calls ending satisfied
    pub satisfied: u64,
    /// Calls ending undetermined
    pub undetermined: u64,
}

/// Ties the engine's resource limit to the caller's for one call.
struct EngineScope<'e, E: BoolLocalSearch> {
    engine: &'e mut E,
}

impl<'e, E: BoolLocalSearch> EngineScope<'e, E> {
    fn new(engine: &'e mut E, parent: &ResourceLimit) -> Self {
        engine.rlimit_mut().attach_to(parent);
        Self { engine }
    }
}

impl<E: BoolLocalSearch> Deref for EngineScope<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: BoolLocalSearch> DerefMut for EngineScope<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: BoolLocalSearch> Drop for EngineScope<'_, E> {
    fn drop(&mut self) {
        self.engine.rlimit_mut().detach();
    }
}

/// A step allowance open on the engine's resource limit.
struct StepAllowance<'e, E: BoolLocalSearch> {
    engine: &'e mut E,
}

impl<'e, E: BoolLocalSearch> StepAllowance<'e, E> {
    fn new(engine: &'e mut E, steps: u64) -> Self {
        engine.rlimit_mut().push(steps);
        Self { engine }
    }
}

impl<E: BoolLocalSearch> Deref for StepAllowance<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.engine
    }
}

impl<E: BoolLocalSearch> DerefMut for StepAllowance<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        self.engine
    }
}

impl<E: BoolLocalSearch> Drop for StepAllowance<'_, E> {
    fn drop(&mut self) {
        self.engine.rlimit_mut().pop();
    }
}

/// Theories registered with an engine for one call.
struct TheoryRegistration<'t> {
    theories: &'t mut [Box<dyn LocalSearchTheory>],
}

impl<'t> TheoryRegistration<'t> {
    fn new<E: BoolLocalSearch>(
        theories: &'t mut [Box<dyn LocalSearchTheory>],
        engine: &E,
    ) -> Self {
        for theory in theories.iter_mut() {
            theory.set_bool_search(Some(engine));
        }
        Self { theories }
    }
}

impl Deref for TheoryRegistration<'_> {
    type Target = [Box<dyn LocalSearchTheory>];

    fn deref(&self) -> &Self::Target {
        self.theories
    }
}

impl DerefMut for TheoryRegistration<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.theories
    }
}

impl Drop for TheoryRegistration<'_> {
    fn drop(&mut self) {
        for theory in self.theories.iter_mut() {
            theory.set_bool_search(None);
        }
    }
}

/// Drives the Boolean engine and the theories through the rounds of one
/// local-search call.
pub struct LocalSearchOrchestrator<'a> {
    config: &'a LocalSearchConfig,
    classifier: LiteralClassifier<'a>,
    bounds: BoundsSetter,
    cnf: &'a Cnf,
    limit: &'a ResourceLimit,
    theories: &'a mut [Box<dyn LocalSearchTheory>],
}

impl<'a> LocalSearchOrchestrator<'a> {
    /// Create an orchestrator over the session's collaborators.
    #[must_use]
    pub fn new(
        config: &'a LocalSearchConfig,
        classifier: LiteralClassifier<'a>,
        cnf: &'a Cnf,
        limit: &'a ResourceLimit,
        theories: &'a mut [Box<dyn LocalSearchTheory>],
    ) -> Self {
        Self {
            config,
            classifier,
            bounds: BoundsSetter::new(config.l_multiplier),
            cnf,
            limit,
            theories,
        }
    }

    /// Run local search, refining `phase` in place.
    ///
    /// `engine` is reinitialized from `phase` and seeded with `seed`. Its
    /// resource limit is a child of the caller's limit for the duration of
    /// the call. Errors from the engine or a theory abort the call; `phase`
    /// then holds whatever the theories wrote so far.
    pub fn run<E: BoolLocalSearch>(
        &mut self,
        engine: &mut E,
        phase: &mut [bool],
        seed: u64,
        stats: &mut LocalSearchStats,
    ) -> Result<LocalSearchResult> {
        stats.calls += 1;

        engine.reinit(self.cnf, phase);
        engine.set_params(&self.config.ddfw);
        engine.set_seed(seed);
        let mut scope = EngineScope::new(engine, self.limit);
        let mut theories = TheoryRegistration::new(&mut *self.theories, &*scope);

        let mut rounds = 0;
        while rounds < MAX_ROUNDS && !self.limit.is_cancelled() {
            rounds += 1;
            stats.rounds += 1;

            let bounds = self.bounds.compute(&*scope, &self.classifier, &mut theories);
            stats.bool_steps = stats.bool_steps.saturating_add(bounds.max_bool_steps);
            stats.theory_nodes += bounds.num_theory_nodes as u64;
            stats.last_num_literals = bounds.num_literals;
            stats.last_num_bool = bounds.num_bool;

            let assumptions = if self.config.assume_theory_literals {
                theory_assumptions(&self.classifier, &*scope)
            } else {
                Vec::new()
            };

            let outcome = {
                let mut allowance = StepAllowance::new(&mut *scope, bounds.max_bool_steps);
                allowance.check(&assumptions)?
            };

            if self.config.restore_best_model {
                restore_best_model(&mut *scope);
            }

            let search: &E = &scope;
            let ctx = TheoryContext {
                terms: self.classifier.terms(),
                egraph: self.classifier.egraph(),
                search,
            };
            for theory in theories.iter_mut() {
                theory.local_search(phase, &ctx)?;
            }

            log_round(
                rounds,
                &bounds,
                assumptions.len(),
                outcome,
                search.num_unsat(),
            );
            if search.unsat_set().is_empty() {
                break;
            }
        }

        for (slot, value) in phase.iter_mut().zip(scope.get_model()) {
            *slot = value.is_true();
        }

        let result = if scope.unsat_set().is_empty() {
            stats.satisfied += 1;
            LocalSearchResult::Satisfied
        } else {
            stats.undetermined += 1;
            LocalSearchResult::Undetermined
        };
        debug!(
            rounds,
            unsat = scope.num_unsat(),
            cancelled = self.limit.is_cancelled(),
            ?result,
            "local search done"
        );
        Ok(result)
    }
}

/// Pin every theory-carrying variable to its current engine value.
fn theory_assumptions<E: BoolLocalSearch>(
    classifier: &LiteralClassifier<'_>,
    engine: &E,
) -> Vec<Lit> {
    (0..engine.num_vars())
        .map(|i| Var::new(i as u32))
        .filter(|&v| !classifier.is_propositional(Lit::pos(v)))
        .map(|v| Lit::new(v, !engine.value(v)))
        .collect()
}

/// Flip the engine's candidate back to its best model.
fn restore_best_model<E: BoolLocalSearch>(engine: &mut E) {
    let flips: Vec<Var> = engine
        .get_model()
        .iter()
        .enumerate()
        .take(engine.num_vars())
        .map(|(i, m)| (Var::new(i as u32), m.is_true()))
        .filter(|&(v, best)| engine.value(v) != best)
        .map(|(v, _)| v)
        .collect();
    for v in flips {
        engine.flip(v);
    }
}

fn log_round(
    round: u32,
    bounds: &RoundBounds,
    num_assumptions: usize,
    outcome: SearchResult,
    num_unsat: usize,
) {
    debug!(
        round,
        num_literals = bounds.num_literals,
        num_bool = bounds.num_bool,
        theory_nodes = bounds.num_theory_nodes,
        max_bool_steps = bounds.max_bool_steps,
        assumptions = num_assumptions,
        ?outcome,
        unsat = num_unsat,
        "local search round"
    );
}
