//! Boolean variables, literals and three-valued truth values.
//!
//! Literals are packed as `2 * var + sign` so that a literal doubles as a
//! dense index into occurrence lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;

/// A Boolean variable identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Var(u32);

impl Var {
    /// Create a variable from its dense index.
    #[must_use]
    pub const fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Get the index of this variable.
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

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A literal (signed Boolean variable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Lit(u32);

impl Lit {
    /// Create a literal from a variable and a sign (`true` means negated).
    #[must_use]
    pub const fn new(var: Var, negated: bool) -> Self {
        Self((var.0 << 1) | negated as u32)
    }

    /// Create a positive literal from a variable.
    #[must_use]
    pub const fn pos(var: Var) -> Self {
        Self(var.0 << 1)
    }

    /// Create a negative literal from a variable.
    #[must_use]
    pub const fn neg(var: Var) -> Self {
        Self((var.0 << 1) | 1)
    }

    /// Get the variable of this literal.
    #[must_use]
    pub const fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// Check if this literal is positive.
    #[must_use]
    pub const fn is_pos(self) -> bool {
        (self.0 & 1) == 0
    }

    /// Check if this literal is negative.
    #[must_use]
    pub const fn is_neg(self) -> bool {
        (self.0 & 1) != 0
    }

    /// Get the negation of this literal.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Dense index of this literal, suitable for occurrence lists.
    #[must_use]
    pub const fn code(self) -> usize {
        self.0 as usize
    }

    /// Truth of this literal when its variable has the given value.
    #[must_use]
    pub const fn is_true_under(self, value: bool) -> bool {
        value == self.is_pos()
    }

    /// Create from a DIMACS integer (`0` is not a literal).
    #[must_use]
    pub fn from_dimacs(lit: i32) -> Option<Self> {
        if lit == 0 {
            return None;
        }
        let var = Var::new(lit.unsigned_abs() - 1);
        Some(if lit > 0 { Self::pos(var) } else { Self::neg(var) })
    }

    /// Convert to a DIMACS integer.
    #[must_use]
    pub fn to_dimacs(self) -> i32 {
        let v = self.var().raw() as i32 + 1;
        if self.is_pos() { v } else { -v }
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pos() {
            write!(f, "{}", self.var())
        } else {
            write!(f, "-{}", self.var())
        }
    }
}

/// Lifted Boolean: true, false or undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LBool {
    /// True
    True,
    /// False
    False,
    /// Unassigned
    #[default]
    Undef,
}

impl LBool {
    /// Is this `True`?
    #[must_use]
    pub const fn is_true(self) -> bool {
        matches!(self, Self::True)
    }

    /// Is this `False`?
    #[must_use]
    pub const fn is_false(self) -> bool {
        matches!(self, Self::False)
    }

    /// Is this `Undef`?
    #[must_use]
    pub const fn is_undef(self) -> bool {
        matches!(self, Self::Undef)
    }
}

impl From<bool> for LBool {
    fn from(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }
}

impl Not for LBool {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Undef => Self::Undef,
        }
    }
}
