//! Property-based tests for the congruence structure
//!
//! Tests:
//! - Term addition is idempotent
//! - Merges are closed under congruence
//! - Popping a scope restores the previous state

use oxils_core::TermManager;
use oxils_theories::EGraph;
use proptest::prelude::*;

#[test]
fn egraph_creation() {
    let egraph = EGraph::new();
    let stats = egraph.stats();
    assert_eq!(stats.num_nodes, 0);
    assert_eq!(stats.num_classes, 0);
}

proptest! {
    #[test]
    fn same_term_same_node(n in 0usize..16) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let c = tm.mk_const(&format!("c{n}"), u);
        let fc = tm.mk_app("f", [c], u);
        let mut egraph = EGraph::new();

        let first = egraph.add_term(fc, &tm);
        let second = egraph.add_term(fc, &tm);
        prop_assert_eq!(first, second);
        prop_assert_eq!(egraph.len(), 2);
    }

    #[test]
    fn merges_are_congruence_closed(
        merges in proptest::collection::vec((0usize..6, 0usize..6), 0..10),
    ) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let consts: Vec<_> = (0..6).map(|i| tm.mk_const(&format!("c{i}"), u)).collect();
        let apps: Vec<_> = consts.iter().map(|&c| tm.mk_app("f", [c], u)).collect();

        let mut egraph = EGraph::new();
        let cs: Vec<_> = consts.iter().map(|&c| egraph.add_term(c, &tm)).collect();
        let fs: Vec<_> = apps.iter().map(|&t| egraph.add_term(t, &tm)).collect();
        for &(i, j) in &merges {
            egraph.merge(cs[i], cs[j]);
        }

        for i in 0..6 {
            for j in 0..6 {
                if egraph.are_equal(cs[i], cs[j]) {
                    prop_assert!(egraph.are_equal(fs[i], fs[j]));
                }
            }
        }
    }

    #[test]
    fn pop_restores_classes(
        merges in proptest::collection::vec((0usize..5, 0usize..5), 1..8),
    ) {
        let mut tm = TermManager::new();
        let u = tm.mk_sort("U");
        let consts: Vec<_> = (0..5).map(|i| tm.mk_const(&format!("c{i}"), u)).collect();
        let extra = tm.mk_app("g", [consts[0], consts[1]], u);

        let mut egraph = EGraph::new();
        let cs: Vec<_> = consts.iter().map(|&c| egraph.add_term(c, &tm)).collect();
        let before = egraph.stats();

        egraph.push();
        egraph.add_term(extra, &tm);
        for &(i, j) in &merges {
            egraph.merge(cs[i], cs[j]);
        }
        egraph.pop(1);

        let after = egraph.stats();
        prop_assert_eq!(after.num_nodes, before.num_nodes);
        prop_assert_eq!(after.num_classes, before.num_classes);
        prop_assert!(egraph.find(extra).is_none());
        for i in 0..5 {
            for j in (i + 1)..5 {
                prop_assert!(!egraph.are_equal(cs[i], cs[j]));
            }
        }
    }
}
