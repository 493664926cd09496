//! E-graph: congruence closure over hash-consed terms.
//!
//! Union-find uses union by size and no path compression so that every
//! merge can be undone when a scope is popped. The congruence table maps a
//! node signature (function symbol plus argument roots) to a representative
//! application. Entries whose argument roots were merged away are left in
//! place: they mention a non-root and can never match a live signature.

use oxils_core::{Symbol, TermId, TermKind, TermManager, Var};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Identifier of an e-node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Get the index of this node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Label {
    Leaf,
    App(Symbol),
    Eq,
    Not,
}

pub(crate) type Signature = (Label, SmallVec<[NodeId; 4]>);

/// A node of the e-graph.
#[derive(Debug, Clone)]
pub struct ENode {
    id: NodeId,
    term: TermId,
    label: Label,
    args: SmallVec<[NodeId; 4]>,
    bool_var: Option<Var>,
}

impl ENode {
    /// Node identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The term this node represents.
    #[must_use]
    pub fn term(&self) -> TermId {
        self.term
    }

    /// Argument nodes.
    #[must_use]
    pub fn args(&self) -> &[NodeId] {
        &self.args
    }

    /// Boolean variable attached to this node, if any.
    #[must_use]
    pub fn bool_var(&self) -> Option<Var> {
        self.bool_var
    }

    pub(crate) fn label(&self) -> Label {
        self.label
    }

    /// Is this an equality atom?
    #[must_use]
    pub fn is_eq(&self) -> bool {
        self.label == Label::Eq
    }
}

/// E-graph statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EGraphStats {
    /// Live nodes
    pub num_nodes: usize,
    /// Equivalence classes
    pub num_classes: usize,
    /// Merges performed (including congruence merges)
    pub merges: u64,
    /// Merges discovered by congruence
    pub congruences: u64,
}

#[derive(Debug)]
enum TrailOp {
    AddNode { term: TermId },
    ParentPush { root: NodeId },
    Union {
        child: NodeId,
        root: NodeId,
        parents_len: usize,
    },
    Congruence { sig: Signature },
    BoolVar { node: NodeId },
}

/// Congruence-closure structure.
#[derive(Debug, Default)]
pub struct EGraph {
    nodes: Vec<ENode>,
    term2node: FxHashMap<TermId, NodeId>,
    parent: Vec<NodeId>,
    size: Vec<u32>,
    /// Applications with an argument in the class, kept at the root
    parents: Vec<Vec<NodeId>>,
    table: FxHashMap<Signature, NodeId>,
    pending: Vec<(NodeId, NodeId)>,
    trail: Vec<TrailOp>,
    scopes: Vec<usize>,
    merges: u64,
    congruences: u64,
}

impl EGraph {
    /// Create an empty e-graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node registered for `term`, if the term is currently present.
    #[must_use]
    pub fn find(&self, term: TermId) -> Option<NodeId> {
        self.term2node.get(&term).copied()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a live node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ENode {
        &self.nodes[id.index()]
    }

    /// Look up a node, if it is live.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&ENode> {
        self.nodes.get(id.index())
    }

    /// Iterate over live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &ENode> + '_ {
        self.nodes.iter()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the e-graph empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Representative of the class of `n`.
    #[must_use]
    pub fn root(&self, mut n: NodeId) -> NodeId {
        while self.parent[n.index()] != n {
            n = self.parent[n.index()];
        }
        n
    }

    /// Are two nodes in the same class?
    #[must_use]
    pub fn are_equal(&self, a: NodeId, b: NodeId) -> bool {
        self.root(a) == self.root(b)
    }

    fn signature(&self, n: NodeId) -> Signature {
        let node = &self.nodes[n.index()];
        let roots = node.args.iter().map(|&a| self.root(a)).collect();
        (node.label, roots)
    }

    /// Register `term` and its subterms. Returns the node of `term`.
    pub fn add_term(&mut self, term: TermId, tm: &TermManager) -> NodeId {
        if let Some(n) = self.find(term) {
            return n;
        }
        let (label, arg_terms): (Label, SmallVec<[TermId; 4]>) = match tm.kind(term) {
            TermKind::App { func, args, .. } => (Label::App(*func), args.clone()),
            TermKind::Eq(a, b) => (Label::Eq, SmallVec::from_slice(&[*a, *b])),
            TermKind::Not(a) => (Label::Not, SmallVec::from_slice(&[*a])),
            TermKind::True | TermKind::False | TermKind::Const { .. } => {
                (Label::Leaf, SmallVec::new())
            }
        };
        let args: SmallVec<[NodeId; 4]> =
            arg_terms.iter().map(|&a| self.add_term(a, tm)).collect();

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ENode {
            id,
            term,
            label,
            args: args.clone(),
            bool_var: None,
        });
        self.parent.push(id);
        self.size.push(1);
        self.parents.push(Vec::new());
        self.term2node.insert(term, id);
        self.trail.push(TrailOp::AddNode { term });

        for &arg in &args {
            let root = self.root(arg);
            self.parents[root.index()].push(id);
            self.trail.push(TrailOp::ParentPush { root });
        }

        if !args.is_empty() {
            let sig = self.signature(id);
            match self.table.get(&sig).copied() {
                Some(other) => {
                    self.congruences += 1;
                    self.pending.push((id, other));
                }
                None => {
                    self.table.insert(sig.clone(), id);
                    self.trail.push(TrailOp::Congruence { sig });
                }
            }
            self.propagate();
        }
        id
    }

    /// Assert that two nodes are equal and close under congruence.
    pub fn merge(&mut self, a: NodeId, b: NodeId) {
        self.pending.push((a, b));
        self.propagate();
    }

    fn propagate(&mut self) {
        while let Some((a, b)) = self.pending.pop() {
            let ra = self.root(a);
            let rb = self.root(b);
            if ra == rb {
                continue;
            }
            let (child, root) = if self.size[ra.index()] < self.size[rb.index()] {
                (ra, rb)
            } else {
                (rb, ra)
            };
            self.parent[child.index()] = root;
            self.size[root.index()] += self.size[child.index()];
            let parents_len = self.parents[root.index()].len();
            self.trail.push(TrailOp::Union {
                child,
                root,
                parents_len,
            });
            self.merges += 1;

            let moved = self.parents[child.index()].clone();
            for &p in &moved {
                let sig = self.signature(p);
                match self.table.get(&sig).copied() {
                    Some(q) => {
                        if self.root(q) != self.root(p) {
                            self.congruences += 1;
                            self.pending.push((p, q));
                        }
                    }
                    None => {
                        self.table.insert(sig.clone(), p);
                        self.trail.push(TrailOp::Congruence { sig });
                    }
                }
            }
            self.parents[root.index()].extend(moved);
        }
    }

    /// Attach a Boolean variable to a node.
    pub fn attach_bool_var(&mut self, node: NodeId, var: Var) {
        self.nodes[node.index()].bool_var = Some(var);
        self.trail.push(TrailOp::BoolVar { node });
    }

    /// Open a scope.
    pub fn push(&mut self) {
        self.scopes.push(self.trail.len());
    }

    /// Close `n` scopes, unregistering their terms and undoing their merges.
    pub fn pop(&mut self, n: usize) {
        self.pending.clear();
        for _ in 0..n {
            let Some(mark) = self.scopes.pop() else {
                break;
            };
            while self.trail.len() > mark {
                if let Some(op) = self.trail.pop() {
                    self.undo(op);
                }
            }
        }
    }

    /// Number of open scopes.
    #[must_use]
    pub fn num_scopes(&self) -> usize {
        self.scopes.len()
    }

    fn undo(&mut self, op: TrailOp) {
        match op {
            TrailOp::AddNode { term } => {
                self.term2node.remove(&term);
                self.nodes.pop();
                self.parent.pop();
                self.size.pop();
                self.parents.pop();
            }
            TrailOp::ParentPush { root } => {
                self.parents[root.index()].pop();
            }
            TrailOp::Union {
                child,
                root,
                parents_len,
            } => {
                self.parent[child.index()] = child;
                self.size[root.index()] -= self.size[child.index()];
                self.parents[root.index()].truncate(parents_len);
                self.merges -= 1;
            }
            TrailOp::Congruence { sig } => {
                self.table.remove(&sig);
            }
            TrailOp::BoolVar { node } => {
                self.nodes[node.index()].bool_var = None;
            }
        }
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> EGraphStats {
        let num_classes = (0..self.nodes.len())
            .filter(|&i| self.parent[i].index() == i)
            .count();
        EGraphStats {
            num_nodes: self.nodes.len(),
            num_classes,
            merges: self.merges,
            congruences: self.congruences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxils_core::Sort;

    fn setup() -> (TermManager, Sort) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        (tm, u)
    }

    #[test]
    fn test_add_term_registers_subterms() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let fa = tm.mk_app("f", [a], u);
        let mut eg = EGraph::new();

        let n = eg.add_term(fa, &tm);
        assert_eq!(eg.find(fa), Some(n));
        assert!(eg.find(a).is_some());
        assert_eq!(eg.node(n).args(), &[eg.find(a).unwrap()]);
        assert_eq!(eg.add_term(fa, &tm), n);
        assert_eq!(eg.len(), 2);
    }

    #[test]
    fn test_congruence_after_merge() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let fa = tm.mk_app("f", [a], u);
        let fb = tm.mk_app("f", [b], u);
        let mut eg = EGraph::new();
        let nfa = eg.add_term(fa, &tm);
        let nfb = eg.add_term(fb, &tm);
        assert!(!eg.are_equal(nfa, nfb));

        let na = eg.find(a).unwrap();
        let nb = eg.find(b).unwrap();
        eg.merge(na, nb);
        assert!(eg.are_equal(nfa, nfb));
        assert_eq!(eg.stats().congruences, 1);
        assert_eq!(eg.stats().num_classes, 2);
    }

    #[test]
    fn test_congruence_on_insertion() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let ga = tm.mk_app("g", [a, a], u);
        let gb = tm.mk_app("g", [b, b], u);
        let mut eg = EGraph::new();
        let na = eg.add_term(a, &tm);
        let nb = eg.add_term(b, &tm);
        eg.merge(na, nb);

        let nga = eg.add_term(ga, &tm);
        let ngb = eg.add_term(gb, &tm);
        assert!(eg.are_equal(nga, ngb));
    }

    #[test]
    fn test_nested_congruence() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let fa = tm.mk_app("f", [a], u);
        let fb = tm.mk_app("f", [b], u);
        let ffa = tm.mk_app("f", [fa], u);
        let ffb = tm.mk_app("f", [fb], u);
        let mut eg = EGraph::new();
        let nffa = eg.add_term(ffa, &tm);
        let nffb = eg.add_term(ffb, &tm);

        eg.merge(eg.find(a).unwrap(), eg.find(b).unwrap());
        assert!(eg.are_equal(nffa, nffb));
    }

    #[test]
    fn test_pop_unregisters_and_unmerges() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let fa = tm.mk_app("f", [a], u);
        let fb = tm.mk_app("f", [b], u);
        let mut eg = EGraph::new();
        let nfa = eg.add_term(fa, &tm);

        eg.push();
        let nfb = eg.add_term(fb, &tm);
        eg.merge(eg.find(a).unwrap(), eg.find(b).unwrap());
        assert!(eg.are_equal(nfa, nfb));
        let v = Var::new(3);
        eg.attach_bool_var(nfa, v);
        assert_eq!(eg.node(nfa).bool_var(), Some(v));

        eg.pop(1);
        assert_eq!(eg.find(fb), None);
        assert_eq!(eg.find(b), None);
        assert_eq!(eg.find(fa), Some(nfa));
        assert_eq!(eg.node(nfa).bool_var(), None);
        let stats = eg.stats();
        assert_eq!(stats.num_nodes, 2);
        assert_eq!(stats.num_classes, 2);
        assert_eq!(stats.merges, 0);

        // the same terms can be registered again after the pop
        let nfb = eg.add_term(fb, &tm);
        assert!(!eg.are_equal(nfa, nfb));
    }

    #[test]
    fn test_equality_atoms() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let b = tm.mk_const("b", u);
        let eq = tm.mk_eq(a, b);
        let mut eg = EGraph::new();
        let n = eg.add_term(eq, &tm);

        assert!(eg.node(n).is_eq());
        assert_eq!(eg.node(n).args().len(), 2);
        assert!(!eg.node(eg.find(a).unwrap()).is_eq());
    }

    #[test]
    fn test_pop_more_scopes_than_open() {
        let (mut tm, u) = setup();
        let a = tm.mk_const("a", u);
        let mut eg = EGraph::new();
        eg.push();
        eg.add_term(a, &tm);
        eg.pop(5);
        assert!(eg.is_empty());
        assert_eq!(eg.num_scopes(), 0);
    }
}
