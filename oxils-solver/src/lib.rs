//! OxiLS Solver - theory-aware local search
//!
//! This crate ties the layers together:
//! - [`LiteralClassifier`] separates propositional literals from literals
//!   whose atoms live in the congruence structure
//! - [`BoundsSetter`] sizes each round's Boolean step allowance and
//!   broadcasts theory-carrying literals to every theory
//! - [`LocalSearchOrchestrator`] runs the rounds
//! - [`Solver`] owns a problem and its theories and is the usual entry point
//!
//! # Example
//!
//! ```
//! use oxils_core::Lit;
//! use oxils_solver::{LocalSearchResult, Solver};
//! use oxils_theories::EufLocalSearch;
//!
//! let mut solver = Solver::new();
//! let u = solver.terms_mut().mk_sort("U");
//! let a = solver.terms_mut().mk_const("a", u);
//! let b = solver.terms_mut().mk_const("b", u);
//! let eq = solver.terms_mut().mk_eq(a, b);
//! let p = solver.new_bool_var();
//! let e = solver.mk_bool_var(eq);
//! solver.add_theory(Box::new(EufLocalSearch::new()));
//!
//! solver.add_clause([Lit::pos(p), Lit::pos(e)]).unwrap();
//! solver.add_clause([Lit::neg(p)]).unwrap();
//!
//! let mut phase = vec![true, false];
//! let result = solver.local_search(&mut phase).unwrap();
//! assert_eq!(result, LocalSearchResult::Satisfied);
//! assert_eq!(phase, vec![false, true]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bounds;
pub mod classifier;
pub mod config;
pub mod local_search;
pub mod solver;

pub use bounds::{BoundsSetter, RoundBounds};
pub use classifier::LiteralClassifier;
pub use config::{LocalSearchConfig, MAX_ROUNDS, MIN_BOOL_STEPS};
pub use local_search::{LocalSearchOrchestrator, LocalSearchResult, LocalSearchStats};
pub use solver::Solver;
