//! Error types for OxiLS

use thiserror::Error;

/// Result type for OxiLS operations
pub type Result<T> = std::result::Result<T, OxilsError>;

/// Errors raised by OxiLS components.
///
/// Running out of rounds or steps is not an error: local search reports an
/// undetermined outcome instead. These variants cover caller contract
/// violations and failures of collaborators, which are fatal to the call.
#[derive(Error, Debug)]
pub enum OxilsError {
    /// The phase does not cover exactly the known Boolean variables
    #[error("phase has {found} entries but {expected} boolean variables are known")]
    PhaseLength {
        /// Number of Boolean variables in the session
        expected: usize,
        /// Length of the phase supplied by the caller
        found: usize,
    },

    /// A literal referenced a variable outside the problem
    #[error("unknown boolean variable {0}")]
    UnknownVariable(u32),

    /// A theory solver failed during refinement
    #[error("theory `{theory}` failed: {message}")]
    Theory {
        /// Name of the theory solver
        theory: String,
        /// Failure description
        message: String,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed DIMACS input
    #[error("DIMACS parse error at line {line}: {message}")]
    Dimacs {
        /// 1-based line number
        line: usize,
        /// Failure description
        message: String,
    },
}

impl OxilsError {
    /// Build a theory failure.
    pub fn theory(theory: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Theory {
            theory: theory.into(),
            message: message.into(),
        }
    }
}
