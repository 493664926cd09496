//! Propositional vs. theory-carrying literals.
//!
//! A literal carries theory content when its variable stands for a term that
//! is not an uninterpreted constant and that the congruence structure
//! currently knows. The answer depends on live e-graph state, so it is
//! recomputed on every query.

use oxils_core::{Lit, TermId, TermManager, Var};
use oxils_theories::{EGraph, ENode};

/// Classifies literals against the current congruence structure.
#[derive(Clone, Copy)]
pub struct LiteralClassifier<'a> {
    terms: &'a TermManager,
    egraph: &'a EGraph,
    bool_var2expr: &'a [Option<TermId>],
}

impl<'a> LiteralClassifier<'a> {
    /// Create a classifier over a variable-to-term map.
    #[must_use]
    pub fn new(
        terms: &'a TermManager,
        egraph: &'a EGraph,
        bool_var2expr: &'a [Option<TermId>],
    ) -> Self {
        Self {
            terms,
            egraph,
            bool_var2expr,
        }
    }

    /// The term manager behind the variables.
    #[must_use]
    pub fn terms(&self) -> &'a TermManager {
        self.terms
    }

    /// The congruence structure queried.
    #[must_use]
    pub fn egraph(&self) -> &'a EGraph {
        self.egraph
    }

    /// Term associated with a variable, if any.
    #[must_use]
    pub fn expr(&self, var: Var) -> Option<TermId> {
        self.bool_var2expr.get(var.index()).copied().flatten()
    }

    /// The e-graph node behind a theory-carrying literal.
    ///
    /// Returns `None` exactly when the literal is propositional.
    #[must_use]
    pub fn theory_node(&self, lit: Lit) -> Option<&'a ENode> {
        let term = self.expr(lit.var())?;
        if self.terms.is_uninterp_const(term) {
            return None;
        }
        self.egraph.find(term).map(|n| self.egraph.node(n))
    }

    /// Is the literal purely propositional?
    #[must_use]
    pub fn is_propositional(&self, lit: Lit) -> bool {
        self.theory_node(lit).is_none()
    }
}
