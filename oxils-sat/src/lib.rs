//! OxiLS SAT - Boolean local search
//!
//! This crate holds the propositional side of OxiLS:
//! - [`Cnf`] problems with normalized [`Clause`]s and a DIMACS reader
//! - The [`UnsatSet`] of falsified clauses
//! - The [`BoolLocalSearch`] engine interface and the [`BoolSearchView`]
//!   handed to theory solvers
//! - [`Ddfw`], a Divide and Distribute Fixed Weights engine
//!
//! # Example
//!
//! ```
//! use oxils_sat::{BoolLocalSearch, Cnf, Ddfw, SearchResult};
//!
//! let cnf = Cnf::parse_dimacs("p cnf 2 2\n1 2 0\n-1 0\n").unwrap();
//! let mut ddfw = Ddfw::new();
//! ddfw.reinit(&cnf, &[true, false]);
//! ddfw.rlimit_mut().push(10_000);
//! let result = ddfw.check(&[]).unwrap();
//! ddfw.rlimit_mut().pop();
//!
//! assert_eq!(result, SearchResult::Sat);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cnf;
pub mod ddfw;
pub mod search;
pub mod unsat_set;

pub use cnf::{Clause, ClauseId, Cnf};
pub use ddfw::{Ddfw, DdfwConfig, DdfwStats};
pub use oxils_core::{LBool, Lit, Var};
pub use search::{BoolLocalSearch, BoolSearchView, ClauseInfo, SearchResult};
pub use unsat_set::UnsatSet;
