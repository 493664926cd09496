//! Property-based tests for DDFW local search
//!
//! Tests:
//! - Planted 3-SAT instances are solved
//! - The falsified set agrees with a full re-evaluation
//! - Step allowances bound the work done by `check`

use oxils_sat::*;
use proptest::prelude::*;

/// Random 3-SAT instance where every clause is satisfied by `planted`.
fn planted_3sat(planted: &[bool], picks: &[(usize, usize, usize, u8)]) -> Cnf {
    let n = planted.len();
    let mut cnf = Cnf::with_vars(n);
    for &(a, b, c, signs) in picks {
        let vars = [a % n, b % n, c % n];
        let mut lits: Vec<Lit> = vars
            .iter()
            .enumerate()
            .map(|(k, &v)| Lit::new(Var::new(v as u32), signs & (1 << k) != 0))
            .collect();
        // force the first literal to agree with the planted model
        let v0 = lits[0].var();
        lits[0] = Lit::new(v0, !planted[v0.index()]);
        cnf.add_clause(lits);
    }
    cnf
}

fn current_values(ddfw: &Ddfw) -> Vec<bool> {
    (0..ddfw.num_vars())
        .map(|i| ddfw.value(Var::new(i as u32)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn planted_instances_are_solved(
        planted in proptest::collection::vec(any::<bool>(), 8..24),
        picks in proptest::collection::vec((0usize..64, 0usize..64, 0usize..64, 0u8..8), 10..60),
        seed: u64,
    ) {
        let cnf = planted_3sat(&planted, &picks);
        let mut ddfw = Ddfw::new();
        ddfw.set_seed(seed);
        ddfw.reinit(&cnf, &vec![false; cnf.num_vars()]);
        ddfw.rlimit_mut().push(200_000);
        let result = ddfw.check(&[]).unwrap();
        ddfw.rlimit_mut().pop();

        prop_assert_eq!(result, SearchResult::Sat);
        prop_assert!(ddfw.unsat_set().is_empty());
        prop_assert_eq!(cnf.count_unsat(&current_values(&ddfw)), 0);
    }

    #[test]
    fn unsat_set_matches_reevaluation(
        planted in proptest::collection::vec(any::<bool>(), 4..16),
        picks in proptest::collection::vec((0usize..32, 0usize..32, 0usize..32, 0u8..8), 5..40),
        steps in 0u64..300,
        seed: u64,
    ) {
        let cnf = planted_3sat(&planted, &picks);
        let mut ddfw = Ddfw::new();
        ddfw.set_seed(seed);
        ddfw.reinit(&cnf, &vec![true; cnf.num_vars()]);
        ddfw.rlimit_mut().push(steps);
        ddfw.check(&[]).unwrap();
        ddfw.rlimit_mut().pop();

        let values = current_values(&ddfw);
        prop_assert_eq!(ddfw.unsat_set().len(), cnf.count_unsat(&values));
        for id in ddfw.unsat_set() {
            prop_assert!(!ddfw.get_clause_info(id).clause().is_satisfied_by(&values));
            prop_assert_eq!(ddfw.get_clause_info(id).num_trues(), 0);
        }
    }

    #[test]
    fn allowance_bounds_steps(steps in 0u64..500) {
        // x and ~x as separate units: never satisfiable
        let mut cnf = Cnf::new();
        let x = cnf.new_var();
        cnf.add_clause([Lit::pos(x)]);
        cnf.add_clause([Lit::neg(x)]);

        let mut ddfw = Ddfw::new();
        ddfw.reinit(&cnf, &[false]);
        ddfw.rlimit_mut().push(steps);
        let result = ddfw.check(&[]).unwrap();
        ddfw.rlimit_mut().pop();

        prop_assert_eq!(result, SearchResult::Unknown);
        prop_assert_eq!(ddfw.rlimit().count(), steps + 1);
        prop_assert!(ddfw.stats().flips + ddfw.stats().shifts <= steps);
    }
}

#[test]
fn best_model_survives_further_search() {
    let cnf = Cnf::parse_dimacs("p cnf 2 3\n1 0\n2 0\n-1 -2 0\n").unwrap();
    let mut ddfw = Ddfw::new();
    ddfw.reinit(&cnf, &[false, false]);
    ddfw.rlimit_mut().push(1_000);
    ddfw.check(&[]).unwrap();
    ddfw.rlimit_mut().pop();

    let model: Vec<bool> = ddfw.get_model().iter().map(|v| v.is_true()).collect();
    assert_eq!(cnf.count_unsat(&model), ddfw.min_unsat());
    assert_eq!(ddfw.min_unsat(), 1);
}
