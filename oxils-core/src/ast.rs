//! Hash-consed terms.
//!
//! The term manager is deliberately small: the local-search layer only needs
//! to tell uninterpreted constants apart from compound atoms and to walk the
//! arguments of applications and equalities.

use lasso::{Rodeo, Spur};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt;

/// Interned symbol name.
pub type Symbol = Spur;

/// Unique identifier for a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(u32);

impl TermId {
    /// Get the index of this term in the manager.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Sort of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sort {
    /// Booleans
    Bool,
    /// A user-declared uninterpreted sort
    Uninterpreted(Symbol),
}

/// The structure of a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// The constant `true`
    True,
    /// The constant `false`
    False,
    /// Uninterpreted constant
    Const {
        /// Name of the constant
        name: Symbol,
        /// Sort of the constant
        sort: Sort,
    },
    /// Application of an uninterpreted function
    App {
        /// Function symbol
        func: Symbol,
        /// Arguments
        args: SmallVec<[TermId; 4]>,
        /// Result sort
        sort: Sort,
    },
    /// Equality (operands ordered by id)
    Eq(TermId, TermId),
    /// Boolean negation
    Not(TermId),
}

impl TermKind {
    /// Sort of a term with this structure.
    #[must_use]
    pub fn sort(&self) -> Sort {
        match self {
            Self::Const { sort, .. } | Self::App { sort, .. } => *sort,
            Self::True | Self::False | Self::Eq(..) | Self::Not(_) => Sort::Bool,
        }
    }
}

/// Term manager: creates and hash-conses terms.
#[derive(Debug, Default)]
pub struct TermManager {
    terms: Vec<TermKind>,
    cache: FxHashMap<TermKind, TermId>,
    symbols: Rodeo,
}

impl TermManager {
    /// Create an empty term manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, kind: TermKind) -> TermId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = TermId(self.terms.len() as u32);
        self.terms.push(kind.clone());
        self.cache.insert(kind, id);
        id
    }

    /// Intern a symbol name.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        self.symbols.get_or_intern(name)
    }

    /// Resolve a symbol to its name.
    #[must_use]
    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.symbols.resolve(&sym)
    }

    /// Declare (or look up) an uninterpreted sort.
    pub fn mk_sort(&mut self, name: &str) -> Sort {
        Sort::Uninterpreted(self.symbol(name))
    }

    /// The constant `true`.
    pub fn mk_true(&mut self) -> TermId {
        self.intern(TermKind::True)
    }

    /// The constant `false`.
    pub fn mk_false(&mut self) -> TermId {
        self.intern(TermKind::False)
    }

    /// An uninterpreted constant of the given sort.
    pub fn mk_const(&mut self, name: &str, sort: Sort) -> TermId {
        let name = self.symbol(name);
        self.intern(TermKind::Const { name, sort })
    }

    /// A Boolean uninterpreted constant.
    pub fn mk_bool_const(&mut self, name: &str) -> TermId {
        self.mk_const(name, Sort::Bool)
    }

    /// Apply an uninterpreted function. Nullary applications are constants.
    pub fn mk_app(
        &mut self,
        func: &str,
        args: impl IntoIterator<Item = TermId>,
        sort: Sort,
    ) -> TermId {
        let args: SmallVec<[TermId; 4]> = args.into_iter().collect();
        if args.is_empty() {
            return self.mk_const(func, sort);
        }
        let func = self.symbol(func);
        self.intern(TermKind::App { func, args, sort })
    }

    /// Equality between two terms. `a = a` simplifies to `true`.
    pub fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        if lhs == rhs {
            return self.mk_true();
        }
        let (a, b) = if lhs < rhs { (lhs, rhs) } else { (rhs, lhs) };
        self.intern(TermKind::Eq(a, b))
    }

    /// Negation, with double negation removed.
    pub fn mk_not(&mut self, t: TermId) -> TermId {
        match self.kind(t) {
            TermKind::Not(inner) => *inner,
            TermKind::True => self.mk_false(),
            TermKind::False => self.mk_true(),
            _ => self.intern(TermKind::Not(t)),
        }
    }

    /// Structure of a term.
    ///
    /// # Panics
    ///
    /// Panics if `t` was not created by this manager.
    #[must_use]
    pub fn kind(&self, t: TermId) -> &TermKind {
        &self.terms[t.index()]
    }

    /// Structure of a term, if it belongs to this manager.
    #[must_use]
    pub fn get(&self, t: TermId) -> Option<&TermKind> {
        self.terms.get(t.index())
    }

    /// Sort of a term.
    #[must_use]
    pub fn sort(&self, t: TermId) -> Sort {
        self.kind(t).sort()
    }

    /// Is `t` an uninterpreted constant (of any sort)?
    #[must_use]
    pub fn is_uninterp_const(&self, t: TermId) -> bool {
        matches!(self.get(t), Some(TermKind::Const { .. }))
    }

    /// Operands of an equality.
    #[must_use]
    pub fn as_eq(&self, t: TermId) -> Option<(TermId, TermId)> {
        match self.get(t)? {
            TermKind::Eq(a, b) => Some((*a, *b)),
            _ => None,
        }
    }

    /// Number of terms created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Has no term been created yet?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render a term in SMT-LIB style.
    #[must_use]
    pub fn display(&self, t: TermId) -> String {
        match self.kind(t) {
            TermKind::True => "true".to_string(),
            TermKind::False => "false".to_string(),
            TermKind::Const { name, .. } => self.symbol_name(*name).to_string(),
            TermKind::App { func, args, .. } => {
                let args: Vec<String> = args.iter().map(|&a| self.display(a)).collect();
                format!("({} {})", self.symbol_name(*func), args.join(" "))
            }
            TermKind::Eq(a, b) => format!("(= {} {})", self.display(*a), self.display(*b)),
            TermKind::Not(a) => format!("(not {})", self.display(*a)),
        }
    }
}
