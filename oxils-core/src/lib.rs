//! OxiLS Core - literals, terms, errors and resource limits
//!
//! This crate provides the foundational types shared by the OxiLS local-search
//! layers:
//! - Packed Boolean [`Var`]/[`Lit`] and three-valued [`LBool`]
//! - A hash-consed [`TermManager`] for the atoms behind Boolean variables
//! - The [`OxilsError`] type
//! - Hierarchical, cooperatively checked [`ResourceLimit`]s
//!
//! # Examples
//!
//! ```
//! use oxils_core::ast::TermManager;
//!
//! let mut tm = TermManager::new();
//! let u = tm.mk_sort("U");
//! let a = tm.mk_const("a", u);
//! let b = tm.mk_const("b", u);
//! let eq = tm.mk_eq(a, b);
//!
//! assert!(tm.is_uninterp_const(a));
//! assert!(!tm.is_uninterp_const(eq));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod error;
pub mod literal;
pub mod resource;

pub use ast::{Sort, Symbol, TermId, TermKind, TermManager};
pub use error::{OxilsError, Result};
pub use literal::{LBool, Lit, Var};
pub use resource::{CancelFlag, LimitStatus, ResourceLimit};
