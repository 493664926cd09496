//! Clauses and CNF problems.
//!
//! DIMACS format:
//! - Comments start with 'c'
//! - Problem line: "p cnf <num_vars> <num_clauses>"
//! - Clauses: space-separated literals ending with 0, possibly across lines

use oxils_core::{Lit, OxilsError, Result, Var};
use smallvec::SmallVec;
use std::fmt;

/// Index of a clause in a [`Cnf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClauseId(u32);

impl ClauseId {
    /// Create a clause id from its index.
    #[must_use]
    pub const fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Get the index of this clause.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A normalized disjunction of literals: sorted, without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    lits: SmallVec<[Lit; 4]>,
}

impl Clause {
    /// Normalize literals into a clause. Returns `None` for a tautology.
    pub fn new(lits: impl IntoIterator<Item = Lit>) -> Option<Self> {
        let mut lits: SmallVec<[Lit; 4]> = lits.into_iter().collect();
        lits.sort_unstable();
        lits.dedup();
        // x and ~x sort next to each other
        if lits.windows(2).any(|w| w[0].var() == w[1].var()) {
            return None;
        }
        Some(Self { lits })
    }

    /// Literals of the clause.
    #[must_use]
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    /// Iterate over the literals.
    pub fn iter(&self) -> impl Iterator<Item = Lit> + '_ {
        self.lits.iter().copied()
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    /// Is this the empty clause?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    /// Does the clause hold under `values` (indexed by variable)?
    #[must_use]
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        self.lits.iter().any(|l| {
            values
                .get(l.var().index())
                .is_some_and(|&v| l.is_true_under(v))
        })
    }
}

impl<'a> IntoIterator for &'a Clause {
    type Item = Lit;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Lit>>;

    fn into_iter(self) -> Self::IntoIter {
        self.lits.iter().copied()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for lit in &self.lits {
            write!(f, "{} ", lit.to_dimacs())?;
        }
        write!(f, "0")
    }
}

/// A CNF problem: a variable count and a list of clauses.
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    num_vars: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    /// Create an empty problem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty problem over `num_vars` variables.
    #[must_use]
    pub fn with_vars(num_vars: usize) -> Self {
        Self {
            num_vars,
            clauses: Vec::new(),
        }
    }

    /// Allocate a fresh variable.
    pub fn new_var(&mut self) -> Var {
        let v = Var::new(self.num_vars as u32);
        self.num_vars += 1;
        v
    }

    /// Make sure at least `n` variables exist.
    pub fn ensure_vars(&mut self, n: usize) {
        self.num_vars = self.num_vars.max(n);
    }

    /// Add a clause, growing the variable count to cover its literals.
    ///
    /// Tautologies are dropped and yield `None`.
    pub fn add_clause(&mut self, lits: impl IntoIterator<Item = Lit>) -> Option<ClauseId> {
        let clause = Clause::new(lits)?;
        if let Some(max) = clause.iter().map(|l| l.var().index() + 1).max() {
            self.ensure_vars(max);
        }
        let id = ClauseId::new(self.clauses.len() as u32);
        self.clauses.push(clause);
        Some(id)
    }

    /// Number of variables.
    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of clauses.
    #[must_use]
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// All clauses, indexed by [`ClauseId`].
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Look up a clause.
    #[must_use]
    pub fn clause(&self, id: ClauseId) -> Option<&Clause> {
        self.clauses.get(id.index())
    }

    /// Number of clauses falsified by `values`.
    #[must_use]
    pub fn count_unsat(&self, values: &[bool]) -> usize {
        self.clauses
            .iter()
            .filter(|c| !c.is_satisfied_by(values))
            .count()
    }

    /// Parse a DIMACS CNF problem.
    pub fn parse_dimacs(input: &str) -> Result<Self> {
        let mut cnf: Option<Cnf> = None;
        let mut pending: Vec<Lit> = Vec::new();

        for (idx, line) in input.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('%') {
                continue;
            }

            if trimmed.starts_with('p') {
                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                if parts.len() != 4 || parts[1] != "cnf" {
                    return Err(dimacs_error(line_no, format!("invalid problem line: {trimmed}")));
                }
                if cnf.is_some() {
                    return Err(dimacs_error(line_no, "duplicate problem line"));
                }
                let num_vars: usize = parts[2].parse().map_err(|_| {
                    dimacs_error(line_no, format!("invalid number of variables: {}", parts[2]))
                })?;
                let _num_clauses: usize = parts[3].parse().map_err(|_| {
                    dimacs_error(line_no, format!("invalid number of clauses: {}", parts[3]))
                })?;
                cnf = Some(Cnf::with_vars(num_vars));
                continue;
            }

            let Some(problem) = cnf.as_mut() else {
                return Err(dimacs_error(line_no, "clause found before problem line"));
            };

            for token in trimmed.split_whitespace() {
                let value: i32 = token
                    .parse()
                    .map_err(|_| dimacs_error(line_no, format!("invalid literal: {token}")))?;
                match Lit::from_dimacs(value) {
                    None => {
                        problem.add_clause(pending.drain(..));
                    }
                    Some(lit) if lit.var().index() >= problem.num_vars => {
                        return Err(dimacs_error(
                            line_no,
                            format!("variable {} exceeds declared count", value.unsigned_abs()),
                        ));
                    }
                    Some(lit) => pending.push(lit),
                }
            }
        }

        let mut problem = cnf.ok_or_else(|| dimacs_error(0, "missing problem line"))?;
        if !pending.is_empty() {
            problem.add_clause(pending);
        }
        Ok(problem)
    }
}

fn dimacs_error(line: usize, message: impl Into<String>) -> OxilsError {
    OxilsError::Dimacs {
        line,
        message: message.into(),
    }
}
