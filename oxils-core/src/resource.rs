//! Hierarchical, cooperatively checked resource limits.
//!
//! A [`ResourceLimit`] counts work steps against a stack of nested step
//! allowances and can be cancelled through a shareable [`CancelFlag`].
//! Limits form a hierarchy: a child attached to a parent observes the
//! cancellation of the parent and of every ancestor of the parent.
//!
//! # Example
//!
//! ```
//! use oxils_core::resource::{LimitStatus, ResourceLimit};
//!
//! let parent = ResourceLimit::new();
//! let mut child = ResourceLimit::new();
//! child.attach_to(&parent);
//!
//! child.push(2);
//! assert!(child.inc());
//! assert!(child.inc());
//! assert!(!child.inc());
//! assert_eq!(child.status(), LimitStatus::Exhausted);
//! child.pop();
//!
//! parent.cancel();
//! assert_eq!(child.status(), LimitStatus::Cancelled);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shareable cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clear a previous cancellation request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Has cancellation been requested?
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Result of checking a resource limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStatus {
    /// Work may continue
    Ok,
    /// This limit or one of its ancestors was cancelled
    Cancelled,
    /// The innermost step allowance is used up
    Exhausted,
}

/// Step counter with nested allowances and hierarchical cancellation.
#[derive(Debug)]
pub struct ResourceLimit {
    cancel: CancelFlag,
    /// Own flags of every ancestor, nearest first
    ancestors: Vec<CancelFlag>,
    count: u64,
    limit: u64,
    saved_limits: Vec<u64>,
}

impl Default for ResourceLimit {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLimit {
    /// Create an unbounded, uncancelled limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancel: CancelFlag::new(),
            ancestors: Vec::new(),
            count: 0,
            limit: u64::MAX,
            saved_limits: Vec::new(),
        }
    }

    /// Handle that cancels this limit (and therefore all its children).
    #[must_use]
    pub fn canceller(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Cancel this limit.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clear cancellation of this limit. Ancestors are not affected.
    pub fn reset_cancel(&self) {
        self.cancel.reset();
    }

    /// Is this limit or any ancestor cancelled?
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.ancestors.iter().any(CancelFlag::is_cancelled)
    }

    /// Make this limit a child of `parent`, replacing any previous parent.
    ///
    /// The parent's ancestor chain is copied as it is now. If the parent is
    /// attached elsewhere later, attach this limit again to pick that up.
    pub fn attach_to(&mut self, parent: &ResourceLimit) {
        self.ancestors.clear();
        self.ancestors.push(parent.cancel.clone());
        self.ancestors.extend(parent.ancestors.iter().cloned());
    }

    /// Release the link to the parent.
    pub fn detach(&mut self) {
        self.ancestors.clear();
    }

    /// Is this limit attached below `other`?
    #[must_use]
    pub fn is_descendant_of(&self, other: &ResourceLimit) -> bool {
        self.ancestors.iter().any(|a| a.same_as(&other.cancel))
    }

    /// Open a nested allowance of `steps` more steps.
    ///
    /// The allowance never extends beyond an enclosing one.
    pub fn push(&mut self, steps: u64) {
        self.saved_limits.push(self.limit);
        self.limit = self.limit.min(self.count.saturating_add(steps));
    }

    /// Close the innermost allowance.
    pub fn pop(&mut self) {
        self.limit = self.saved_limits.pop().unwrap_or(u64::MAX);
    }

    /// Number of open allowances.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved_limits.len()
    }

    /// Count one step. Returns `true` while work may continue.
    pub fn inc(&mut self) -> bool {
        self.inc_by(1)
    }

    /// Count `steps` steps. Returns `true` while work may continue.
    pub fn inc_by(&mut self, steps: u64) -> bool {
        self.count = self.count.saturating_add(steps);
        self.status() == LimitStatus::Ok
    }

    /// Current status without counting a step.
    #[must_use]
    pub fn status(&self) -> LimitStatus {
        if self.is_cancelled() {
            LimitStatus::Cancelled
        } else if self.count > self.limit {
            LimitStatus::Exhausted
        } else {
            LimitStatus::Ok
        }
    }

    /// Steps counted so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Steps left in the innermost allowance, `None` when unbounded.
    #[must_use]
    pub fn remaining(&self) -> Option<u64> {
        (self.limit != u64::MAX).then(|| self.limit.saturating_sub(self.count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_by_default() {
        let mut limit = ResourceLimit::new();
        for _ in 0..1000 {
            assert!(limit.inc());
        }
        assert_eq!(limit.count(), 1000);
        assert_eq!(limit.remaining(), None);
    }

    #[test]
    fn test_push_pop_allowance() {
        let mut limit = ResourceLimit::new();
        limit.push(3);
        assert_eq!(limit.remaining(), Some(3));
        assert!(limit.inc());
        assert!(limit.inc());
        assert!(limit.inc());
        assert!(!limit.inc());
        assert_eq!(limit.status(), LimitStatus::Exhausted);
        limit.pop();
        assert_eq!(limit.status(), LimitStatus::Ok);
        assert_eq!(limit.depth(), 0);
    }

    #[test]
    fn test_nested_allowance_does_not_extend_outer() {
        let mut limit = ResourceLimit::new();
        limit.push(5);
        limit.push(100);
        assert_eq!(limit.remaining(), Some(5));
        limit.pop();
        limit.push(2);
        assert_eq!(limit.remaining(), Some(2));
        limit.pop();
        limit.pop();
        assert_eq!(limit.remaining(), None);
    }

    #[test]
    fn test_pop_without_push_is_unbounded() {
        let mut limit = ResourceLimit::new();
        limit.pop();
        assert_eq!(limit.remaining(), None);
    }

    #[test]
    fn test_parent_cancellation_reaches_grandchild() {
        let root = ResourceLimit::new();
        let mut mid = ResourceLimit::new();
        mid.attach_to(&root);
        let mut leaf = ResourceLimit::new();
        leaf.attach_to(&mid);

        assert!(leaf.inc());
        root.cancel();
        assert!(leaf.is_cancelled());
        assert!(!leaf.inc());
        assert!(leaf.is_descendant_of(&root));
        assert!(leaf.is_descendant_of(&mid));
    }

    #[test]
    fn test_ancestors_fixed_at_attach_time() {
        let mut mid = ResourceLimit::new();
        let mut leaf = ResourceLimit::new();
        leaf.attach_to(&mid);

        let root = ResourceLimit::new();
        mid.attach_to(&root);
        assert!(!leaf.is_descendant_of(&root));
        root.cancel();
        assert!(mid.is_cancelled());
        assert!(!leaf.is_cancelled());

        leaf.attach_to(&mid);
        assert!(leaf.is_descendant_of(&root));
        assert!(leaf.is_cancelled());
    }

    #[test]
    fn test_child_cancellation_does_not_reach_parent() {
        let parent = ResourceLimit::new();
        let mut child = ResourceLimit::new();
        child.attach_to(&parent);
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_detach_releases_parent() {
        let parent = ResourceLimit::new();
        let mut child = ResourceLimit::new();
        child.attach_to(&parent);
        child.detach();
        parent.cancel();
        assert!(!child.is_cancelled());
        assert!(!child.is_descendant_of(&parent));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let limit = ResourceLimit::new();
        let flag = limit.canceller();
        std::thread::spawn(move || flag.cancel())
            .join()
            .unwrap();
        assert_eq!(limit.status(), LimitStatus::Cancelled);
        limit.reset_cancel();
        assert_eq!(limit.status(), LimitStatus::Ok);
    }
}
