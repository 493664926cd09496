//! Interface of a Boolean local-search engine.
//!
//! The engine works on a private candidate assignment. Callers seed it with
//! [`BoolLocalSearch::reinit`], grant it step allowances through its
//! [`ResourceLimit`], and read back the best model it found.

use crate::cnf::{Clause, ClauseId, Cnf};
use crate::ddfw::DdfwConfig;
use crate::unsat_set::UnsatSet;
use oxils_core::{LBool, Lit, ResourceLimit, Result, Var};

/// Outcome of one bounded search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// The candidate satisfies every clause
    Sat,
    /// The problem (under the assumptions) is trivially unsatisfiable
    Unsat,
    /// Budget spent or search cancelled
    Unknown,
}

/// Per-clause bookkeeping of a local-search engine.
#[derive(Debug, Clone)]
pub struct ClauseInfo {
    clause: Clause,
    pub(crate) weight: u32,
    pub(crate) num_trues: u32,
}

impl ClauseInfo {
    /// Wrap a clause with an initial weight.
    #[must_use]
    pub fn new(clause: Clause, weight: u32) -> Self {
        Self {
            clause,
            weight,
            num_trues: 0,
        }
    }

    /// The clause itself.
    #[must_use]
    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// Current weight.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Number of literals true under the current candidate.
    #[must_use]
    pub fn num_trues(&self) -> u32 {
        self.num_trues
    }

    /// Is the clause satisfied by the current candidate?
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.num_trues > 0
    }
}

/// Read-only view of an engine's current candidate.
///
/// Theory solvers receive this view during their refinement step.
pub trait BoolSearchView {
    /// Number of variables the engine tracks.
    fn num_vars(&self) -> usize;

    /// Current value of a variable. Unknown variables read as `false`.
    fn value(&self, var: Var) -> bool;

    /// Number of currently falsified clauses.
    fn num_unsat(&self) -> usize;
}

/// A stochastic Boolean local-search engine.
pub trait BoolLocalSearch: BoolSearchView {
    /// Load a problem and seed the candidate from `phase`.
    ///
    /// Variables beyond `phase` start out `false`; entries of `phase` beyond
    /// the problem are ignored.
    fn reinit(&mut self, cnf: &Cnf, phase: &[bool]);

    /// Apply search parameters.
    fn set_params(&mut self, config: &DdfwConfig);

    /// Seed the engine's random number generator.
    fn set_seed(&mut self, seed: u64);

    /// The engine's resource limit.
    fn rlimit(&self) -> &ResourceLimit;

    /// The engine's resource limit, for attaching and pushing allowances.
    fn rlimit_mut(&mut self) -> &mut ResourceLimit;

    /// Search until every clause holds or the resource limit stops it.
    ///
    /// Assumption literals pin their variables for the duration of the call.
    fn check(&mut self, assumptions: &[Lit]) -> Result<SearchResult>;

    /// Clauses falsified by the current candidate.
    fn unsat_set(&self) -> &UnsatSet;

    /// Best model found since `reinit`; empty until the first improvement.
    fn get_model(&self) -> &[LBool];

    /// Bookkeeping for a clause.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a clause of the loaded problem.
    fn get_clause_info(&self, id: ClauseId) -> &ClauseInfo;

    /// Flip a variable of the current candidate.
    fn flip(&mut self, var: Var);
}
