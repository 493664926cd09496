//! Equality reasoning for local search.
//!
//! The Boolean engine treats equality atoms as independent variables, so it
//! happily produces candidates where `a = b` and `b = c` hold but `a = c`
//! does not. During its refinement step this theory closes the equalities
//! that are true in the candidate under transitivity and congruence (on top
//! of what the e-graph already knows) and sets every collected atom that is
//! implied but false in the phase.

use crate::egraph::{EGraph, ENode, NodeId, Signature};
use crate::{LocalSearchTheory, TheoryContext};
use oxils_core::{Result, Var};
use oxils_sat::BoolSearchView;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// Statistics for EUF local search.
#[derive(Debug, Clone, Default)]
pub struct EufLocalSearchStats {
    /// Refinement steps run
    pub rounds: u64,
    /// Distinct equality atoms collected over all rounds
    pub candidates: u64,
    /// Phase entries set by the refinement
    pub phase_flips: u64,
}

/// Union-find over e-graph roots, local to one refinement step.
#[derive(Default)]
struct UnionFind {
    parent: FxHashMap<NodeId, NodeId>,
}

impl UnionFind {
    fn find(&self, x: NodeId) -> NodeId {
        let mut current = x;
        while let Some(&parent) = self.parent.get(&current) {
            if parent == current {
                break;
            }
            current = parent;
        }
        current
    }

    fn union(&mut self, x: NodeId, y: NodeId) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx != ry {
            self.parent.insert(rx, ry);
        }
    }

    /// Class of `n`: its e-graph root, then the local representative.
    fn class(&self, egraph: &EGraph, n: NodeId) -> NodeId {
        self.find(egraph.root(n))
    }

    /// Merge applications whose arguments became equivalent, until nothing
    /// changes. Returns the number of merges.
    fn close_under_congruence(&mut self, egraph: &EGraph) -> usize {
        let apps: Vec<&ENode> = egraph.nodes().filter(|n| !n.args().is_empty()).collect();
        let mut merged = 0;
        loop {
            let mut table: FxHashMap<Signature, NodeId> = FxHashMap::default();
            let mut changed = false;
            for node in &apps {
                let sig: Signature = (
                    node.label(),
                    node.args().iter().map(|&a| self.class(egraph, a)).collect(),
                );
                match table.get(&sig).copied() {
                    Some(other) => {
                        let x = self.class(egraph, node.id());
                        let y = self.class(egraph, other);
                        if x != y {
                            self.union(x, y);
                            merged += 1;
                            changed = true;
                        }
                    }
                    None => {
                        table.insert(sig, node.id());
                    }
                }
            }
            if !changed {
                return merged;
            }
        }
    }
}

/// EUF theory solver for local search.
#[derive(Debug, Default)]
pub struct EufLocalSearch {
    /// Equality atoms collected in the current bounds phase
    candidates: Vec<NodeId>,
    seen: FxHashSet<NodeId>,
    /// Maximum phase entries set per round
    flip_budget: usize,
    num_vars: Option<usize>,
    stats: EufLocalSearchStats,
}

impl EufLocalSearch {
    /// Create a new EUF local-search theory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> &EufLocalSearchStats {
        &self.stats
    }

    /// Atoms collected in the current round.
    #[must_use]
    pub fn candidates(&self) -> &[NodeId] {
        &self.candidates
    }

    /// Is a Boolean engine currently registered?
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.num_vars.is_some()
    }

    /// Value of an atom: the engine's candidate where it knows the variable,
    /// the phase otherwise.
    fn current_value(search: &dyn BoolSearchView, phase: &[bool], v: Var) -> bool {
        if v.index() < search.num_vars() {
            search.value(v)
        } else {
            phase.get(v.index()).copied().unwrap_or(false)
        }
    }
}

impl LocalSearchTheory for EufLocalSearch {
    fn name(&self) -> &str {
        "euf"
    }

    fn set_bool_search(&mut self, search: Option<&dyn BoolSearchView>) {
        self.num_vars = search.map(|s| s.num_vars());
        if search.is_none() {
            self.candidates.clear();
            self.seen.clear();
        }
    }

    fn set_bounds_begin(&mut self) {
        self.candidates.clear();
        self.seen.clear();
    }

    fn set_bounds(&mut self, node: &ENode) {
        if node.is_eq() && node.bool_var().is_some() && self.seen.insert(node.id()) {
            self.candidates.push(node.id());
            self.stats.candidates += 1;
        }
    }

    fn set_bounds_end(&mut self, num_literals: usize) {
        self.flip_budget = num_literals.max(1);
    }

    fn local_search(&mut self, phase: &mut [bool], ctx: &TheoryContext<'_>) -> Result<()> {
        self.stats.rounds += 1;
        if self.candidates.is_empty() {
            return Ok(());
        }

        let egraph = ctx.egraph;
        let mut uf = UnionFind::default();
        for node in egraph.nodes() {
            if !node.is_eq() {
                continue;
            }
            let Some(v) = node.bool_var() else {
                continue;
            };
            if Self::current_value(ctx.search, phase, v) {
                let args = node.args();
                uf.union(egraph.root(args[0]), egraph.root(args[1]));
            }
        }
        let congruences = uf.close_under_congruence(egraph);

        let mut flips = 0;
        for &id in &self.candidates {
            if flips >= self.flip_budget {
                break;
            }
            let Some(node) = egraph.get(id) else {
                continue;
            };
            let Some(v) = node.bool_var() else {
                continue;
            };
            if Self::current_value(ctx.search, phase, v) {
                continue;
            }
            let args = node.args();
            if uf.class(egraph, args[0]) != uf.class(egraph, args[1]) {
                continue;
            }
            // out-of-range variables are left alone
            if let Some(slot) = phase.get_mut(v.index()) {
                *slot = true;
                flips += 1;
            }
        }

        self.stats.phase_flips += flips as u64;
        trace!(
            candidates = self.candidates.len(),
            congruences,
            flips,
            "euf local search refinement"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxils_core::TermManager;

    /// Engine view backed by a plain vector.
    struct Values(Vec<bool>);

    impl BoolSearchView for Values {
        fn num_vars(&self) -> usize {
            self.0.len()
        }

        fn value(&self, var: Var) -> bool {
            self.0[var.index()]
        }

        fn num_unsat(&self) -> usize {
            0
        }
    }

    /// a = b (v0), b = c (v1), a = c (v2)
    fn triangle() -> (TermManager, EGraph, [NodeId; 3]) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let c = tm.mk_const("c", u);
        let ab = tm.mk_eq(a, b);
        let bc = tm.mk_eq(b, c);
        let ac = tm.mk_eq(a, c);
        let mut eg = EGraph::new();
        let mut ids = Vec::new();
        for (i, t) in [ab, bc, ac].into_iter().enumerate() {
            let n = eg.add_term(t, &tm);
            eg.attach_bool_var(n, Var::new(i as u32));
            ids.push(n);
        }
        (tm, eg, [ids[0], ids[1], ids[2]])
    }

    #[test]
    fn test_transitivity_sets_implied_atom() {
        let (tm, eg, ids) = triangle();
        let view = Values(vec![true, true, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bool_search(Some(&view));
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[2]));
        euf.set_bounds_end(3);

        let mut phase = vec![true, true, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert_eq!(phase, vec![true, true, true]);
        assert_eq!(euf.stats().phase_flips, 1);
    }

    #[test]
    fn test_no_change_without_implication() {
        let (tm, eg, ids) = triangle();
        let view = Values(vec![true, false, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[2]));
        euf.set_bounds_end(3);

        let mut phase = vec![true, false, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert_eq!(phase, vec![true, false, false]);
    }

    #[test]
    fn test_uses_egraph_equalities() {
        let (tm, mut eg, ids) = triangle();
        // a = b is known to the e-graph; only b = c comes from the candidate
        let a = eg.node(ids[0]).args()[0];
        let b = eg.node(ids[0]).args()[1];
        eg.merge(a, b);
        let view = Values(vec![false, true, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[2]));
        euf.set_bounds_end(1);

        let mut phase = vec![false, true, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert!(phase[2]);
    }

    /// a = b (v0), b = c (v1), f(a) = f(c) (v2)
    fn congruence_chain() -> (TermManager, EGraph, [NodeId; 3]) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let c = tm.mk_const("c", u);
        let fa = tm.mk_app("f", [a], u);
        let fc = tm.mk_app("f", [c], u);
        let ab = tm.mk_eq(a, b);
        let bc = tm.mk_eq(b, c);
        let fafc = tm.mk_eq(fa, fc);
        let mut eg = EGraph::new();
        let mut ids = Vec::new();
        for (i, t) in [ab, bc, fafc].into_iter().enumerate() {
            let n = eg.add_term(t, &tm);
            eg.attach_bool_var(n, Var::new(i as u32));
            ids.push(n);
        }
        (tm, eg, [ids[0], ids[1], ids[2]])
    }

    #[test]
    fn test_congruence_sets_implied_atom() {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let fa = tm.mk_app("f", [a], u);
        let fb = tm.mk_app("f", [b], u);
        let ab = tm.mk_eq(a, b);
        let fafb = tm.mk_eq(fa, fb);
        let mut eg = EGraph::new();
        let n_ab = eg.add_term(ab, &tm);
        let n_fafb = eg.add_term(fafb, &tm);
        eg.attach_bool_var(n_ab, Var::new(0));
        eg.attach_bool_var(n_fafb, Var::new(1));

        let view = Values(vec![true, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bool_search(Some(&view));
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(n_fafb));
        euf.set_bounds_end(2);

        let mut phase = vec![true, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert_eq!(phase, vec![true, true]);
        assert_eq!(euf.stats().phase_flips, 1);
    }

    #[test]
    fn test_congruence_after_transitivity() {
        let (tm, eg, ids) = congruence_chain();
        let view = Values(vec![true, true, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[2]));
        euf.set_bounds_end(3);

        let mut phase = vec![true, true, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert!(phase[2]);
    }

    #[test]
    fn test_no_congruence_with_distinct_arguments() {
        let (tm, eg, ids) = congruence_chain();
        // b = c is false, so f(a) and f(c) stay apart
        let view = Values(vec![true, false, false]);
        let ctx = TheoryContext {
            terms: &tm,
            egraph: &eg,
            search: &view,
        };
        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[2]));
        euf.set_bounds_end(3);

        let mut phase = vec![true, false, false];
        euf.local_search(&mut phase, &ctx).unwrap();
        assert_eq!(phase, vec![true, false, false]);
    }

    #[test]
    fn test_broadcast_filters_non_equalities() {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let a = tm.mk_const("a", u);
        let fa = tm.mk_app("f", [a], u);
        let mut eg = EGraph::new();
        let n = eg.add_term(fa, &tm);

        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(n));
        assert!(euf.candidates().is_empty());
    }

    #[test]
    fn test_duplicate_nodes_collected_once() {
        let (_tm, eg, ids) = triangle();
        let mut euf = EufLocalSearch::new();
        euf.set_bounds_begin();
        euf.set_bounds(eg.node(ids[1]));
        euf.set_bounds(eg.node(ids[1]));
        assert_eq!(euf.candidates(), &[ids[1]]);

        euf.set_bounds_begin();
        assert!(euf.candidates().is_empty());
    }

    #[test]
    fn test_attach_and_release() {
        let view = Values(vec![false; 4]);
        let mut euf = EufLocalSearch::new();
        assert!(!euf.is_attached());
        euf.set_bool_search(Some(&view));
        assert!(euf.is_attached());
        euf.set_bool_search(None);
        assert!(!euf.is_attached());
    }
}
