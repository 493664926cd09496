//! Indexed set of falsified clauses.

use crate::cnf::ClauseId;

const ABSENT: u32 = u32::MAX;

/// Set of [`ClauseId`]s with constant-time insert, remove, membership and
/// random access.
#[derive(Debug, Clone, Default)]
pub struct UnsatSet {
    elems: Vec<ClauseId>,
    /// Position of each clause in `elems`, `ABSENT` if not a member
    pos: Vec<u32>,
}

impl UnsatSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set able to hold clause ids below `capacity`.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            elems: Vec::with_capacity(capacity),
            pos: vec![ABSENT; capacity],
        }
    }

    /// Insert a clause. Returns `false` if it was already present.
    pub fn insert(&mut self, id: ClauseId) -> bool {
        let idx = id.index();
        if idx >= self.pos.len() {
            self.pos.resize(idx + 1, ABSENT);
        }
        if self.pos[idx] != ABSENT {
            return false;
        }
        self.pos[idx] = self.elems.len() as u32;
        self.elems.push(id);
        true
    }

    /// Remove a clause. Returns `false` if it was not present.
    pub fn remove(&mut self, id: ClauseId) -> bool {
        let Some(&p) = self.pos.get(id.index()) else {
            return false;
        };
        if p == ABSENT {
            return false;
        }
        let last = self.elems.len() - 1;
        if p as usize != last {
            let moved = self.elems[last];
            self.elems[p as usize] = moved;
            self.pos[moved.index()] = p;
        }
        self.elems.pop();
        self.pos[id.index()] = ABSENT;
        true
    }

    /// Is the clause in the set?
    #[must_use]
    pub fn contains(&self, id: ClauseId) -> bool {
        self.pos.get(id.index()).is_some_and(|&p| p != ABSENT)
    }

    /// Element at position `i` (positions are not stable across removals).
    #[must_use]
    pub fn elem_at(&self, i: usize) -> ClauseId {
        self.elems[i]
    }

    /// Number of clauses in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Is the set empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Iterate over the members.
    pub fn iter(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.elems.iter().copied()
    }

    /// Remove all members.
    pub fn clear(&mut self) {
        for id in self.elems.drain(..) {
            self.pos[id.index()] = ABSENT;
        }
    }
}

impl<'a> IntoIterator for &'a UnsatSet {
    type Item = ClauseId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, ClauseId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.elems.iter().copied()
    }
}
