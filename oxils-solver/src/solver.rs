//! Local-search session

use crate::classifier::LiteralClassifier;
use crate::config::LocalSearchConfig;
use crate::local_search::{LocalSearchOrchestrator, LocalSearchResult, LocalSearchStats};
use oxils_core::{CancelFlag, Lit, OxilsError, ResourceLimit, Result, TermId, TermManager, Var};
use oxils_sat::{BoolLocalSearch, ClauseId, Cnf, Ddfw};
use oxils_theories::{EGraph, LocalSearchTheory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Owns the problem, the theories and the caller's resource limit, and runs
/// theory-aware local search over them.
pub struct Solver {
    config: LocalSearchConfig,
    terms: TermManager,
    egraph: EGraph,
    /// Term behind each Boolean variable
    bool_var2expr: Vec<Option<TermId>>,
    cnf: Cnf,
    theories: Vec<Box<dyn LocalSearchTheory>>,
    limit: ResourceLimit,
    /// Seeds one engine per call
    rng: StdRng,
    stats: LocalSearchStats,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a new solver
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LocalSearchConfig::default())
    }

    /// Create a new solver with configuration
    #[must_use]
    pub fn with_config(config: LocalSearchConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.random_seed),
            config,
            terms: TermManager::new(),
            egraph: EGraph::new(),
            bool_var2expr: Vec::new(),
            cnf: Cnf::new(),
            theories: Vec::new(),
            limit: ResourceLimit::new(),
            stats: LocalSearchStats::default(),
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    /// Get the term manager
    #[must_use]
    pub fn terms(&self) -> &TermManager {
        &self.terms
    }

    /// Get the term manager for building terms
    pub fn terms_mut(&mut self) -> &mut TermManager {
        &mut self.terms
    }

    /// Get the congruence structure
    #[must_use]
    pub fn egraph(&self) -> &EGraph {
        &self.egraph
    }

    /// Get the congruence structure for merges and scopes
    pub fn egraph_mut(&mut self) -> &mut EGraph {
        &mut self.egraph
    }

    /// Get the clauses
    #[must_use]
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Number of Boolean variables
    #[must_use]
    pub fn num_bool_vars(&self) -> usize {
        self.bool_var2expr.len()
    }

    /// Number of attached theories
    #[must_use]
    pub fn num_theories(&self) -> usize {
        self.theories.len()
    }

    /// Create a Boolean variable without an associated term
    pub fn new_bool_var(&mut self) -> Var {
        let var = self.cnf.new_var();
        self.bool_var2expr.push(None);
        var
    }

    /// Create a Boolean variable standing for `term`.
    ///
    /// Terms other than uninterpreted constants are registered in the
    /// congruence structure, with the new variable attached to their node.
    pub fn mk_bool_var(&mut self, term: TermId) -> Var {
        let var = self.cnf.new_var();
        self.bool_var2expr.push(Some(term));
        if !self.terms.is_uninterp_const(term) {
            let node = self.egraph.add_term(term, &self.terms);
            self.egraph.attach_bool_var(node, var);
        }
        var
    }

    /// Term associated with a variable
    #[must_use]
    pub fn expr(&self, var: Var) -> Option<TermId> {
        self.bool_var2expr.get(var.index()).copied().flatten()
    }

    /// Add a clause over known variables.
    ///
    /// Returns `None` for tautologies, which are dropped.
    pub fn add_clause(
        &mut self,
        lits: impl IntoIterator<Item = Lit>,
    ) -> Result<Option<ClauseId>> {
        let lits: Vec<Lit> = lits.into_iter().collect();
        if let Some(lit) = lits.iter().find(|l| l.var().index() >= self.num_bool_vars()) {
            return Err(OxilsError::UnknownVariable(lit.var().raw()));
        }
        Ok(self.cnf.add_clause(lits))
    }

    /// Attach a theory solver
    pub fn add_theory(&mut self, theory: Box<dyn LocalSearchTheory>) {
        self.theories.push(theory);
    }

    /// Classifier over the current congruence structure
    #[must_use]
    pub fn classifier(&self) -> LiteralClassifier<'_> {
        LiteralClassifier::new(&self.terms, &self.egraph, &self.bool_var2expr)
    }

    /// Is the literal purely propositional right now?
    #[must_use]
    pub fn is_propositional(&self, lit: Lit) -> bool {
        self.classifier().is_propositional(lit)
    }

    /// The caller-side resource limit; engines become its children
    #[must_use]
    pub fn limit(&self) -> &ResourceLimit {
        &self.limit
    }

    /// The caller-side resource limit, for resetting cancellation
    pub fn limit_mut(&mut self) -> &mut ResourceLimit {
        &mut self.limit
    }

    /// Handle that cancels running and future searches, usable from other
    /// threads
    #[must_use]
    pub fn canceller(&self) -> CancelFlag {
        self.limit.canceller()
    }

    /// Get statistics
    #[must_use]
    pub fn stats(&self) -> &LocalSearchStats {
        &self.stats
    }

    /// Run local search with a fresh DDFW engine.
    ///
    /// `phase` must hold one entry per Boolean variable; it is refined in
    /// place and receives the engine's best model.
    pub fn local_search(&mut self, phase: &mut [bool]) -> Result<LocalSearchResult> {
        let mut engine = Ddfw::with_config(self.config.ddfw.clone());
        self.local_search_with(phase, &mut engine)
    }

    /// Run local search with a caller-provided engine.
    pub fn local_search_with<E: BoolLocalSearch>(
        &mut self,
        phase: &mut [bool],
        engine: &mut E,
    ) -> Result<LocalSearchResult> {
        if phase.len() != self.num_bool_vars() {
            return Err(OxilsError::PhaseLength {
                expected: self.num_bool_vars(),
                found: phase.len(),
            });
        }

        let seed = self.rng.random::<u64>();
        let classifier = LiteralClassifier::new(&self.terms, &self.egraph, &self.bool_var2expr);
        let mut orchestrator = LocalSearchOrchestrator::new(
            &self.config,
            classifier,
            &self.cnf,
            &self.limit,
            &mut self.theories,
        );
        orchestrator.run(engine, phase, seed, &mut self.stats)
    }
}
