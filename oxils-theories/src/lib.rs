//! OxiLS Theories - theory solvers taking part in local search
//!
//! This crate provides:
//! - [`EGraph`], the congruence structure that decides which Boolean atoms
//!   carry theory content
//! - [`LocalSearchTheory`], the callbacks a theory solver implements to take
//!   part in the local-search rounds
//! - [`EufLocalSearch`], an equality theory that repairs the phase with
//!   consequences of transitivity and congruence

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod egraph;
pub mod euf;

pub use egraph::{EGraph, EGraphStats, ENode, NodeId};
pub use euf::{EufLocalSearch, EufLocalSearchStats};

use oxils_core::{Result, TermManager};
use oxils_sat::BoolSearchView;

/// Read-only state available to a theory during its refinement step.
#[derive(Clone, Copy)]
pub struct TheoryContext<'a> {
    /// Terms behind the Boolean variables
    pub terms: &'a TermManager,
    /// The congruence structure
    pub egraph: &'a EGraph,
    /// The Boolean engine's current candidate
    pub search: &'a dyn BoolSearchView,
}

/// A theory solver taking part in local search.
///
/// During one local-search call the orchestrator drives every theory through
/// the same sequence of callbacks:
///
/// 1. `set_bool_search(Some(..))` once, when the Boolean engine is set up
/// 2. per round: `set_bounds_begin`, `set_bounds` for every theory-carrying
///    literal of a falsified clause, `set_bounds_end`, then `local_search`
/// 3. `set_bool_search(None)` once, on every exit path
///
/// Nodes are broadcast: every theory sees every node and decides itself
/// whether the node is relevant.
pub trait LocalSearchTheory {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// The Boolean engine was registered (`Some`) or released (`None`).
    fn set_bool_search(&mut self, _search: Option<&dyn BoolSearchView>) {}

    /// A bounds collection phase starts.
    fn set_bounds_begin(&mut self) {}

    /// A theory-carrying literal of a falsified clause.
    fn set_bounds(&mut self, _node: &ENode) {}

    /// The bounds collection phase ends.
    ///
    /// `num_literals` counts all literals of the falsified clauses.
    fn set_bounds_end(&mut self, _num_literals: usize) {}

    /// Refine `phase` in place using theory knowledge.
    fn local_search(&mut self, phase: &mut [bool], ctx: &TheoryContext<'_>) -> Result<()>;
}
