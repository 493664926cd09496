//! Divide and Distribute Fixed Weights (DDFW) local search.
//!
//! Every clause carries a weight. A variable's reward is the weight of the
//! falsified clauses that flipping it would satisfy, minus the weight of the
//! clauses in which it is the only true literal. The search greedily flips
//! variables with positive reward; at a local minimum it moves weight from
//! satisfied neighbour clauses onto falsified ones, which reshapes the
//! landscape until some flip pays off again.
//!
//! ## References
//!
//! - Ishtaiwi, Thornton, Sattar, Pham: "Neighbourhood Clause Weight
//!   Redistribution in Local Search for SAT" (CP 2005)

use crate::cnf::{ClauseId, Cnf};
use crate::search::{BoolLocalSearch, BoolSearchView, ClauseInfo, SearchResult};
use crate::unsat_set::UnsatSet;
use oxils_core::{LBool, Lit, OxilsError, ResourceLimit, Result, Var};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Random satisfied clauses probed when no neighbour can donate weight.
const NEIGHBOR_PROBES: usize = 16;

/// Configuration for DDFW.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdfwConfig {
    /// Initial weight of every clause.
    pub init_clause_weight: u32,
    /// Percentage of local minima where a zero-reward flip is taken instead
    /// of shifting weights.
    pub use_reward_zero_pct: u32,
    /// Flips between weight reinitializations (grows with each one).
    pub reinit_base: u64,
    /// Flips between restarts (grows with each one).
    pub restart_base: u64,
}

impl Default for DdfwConfig {
    fn default() -> Self {
        Self {
            init_clause_weight: 8,
            use_reward_zero_pct: 15,
            reinit_base: 10_000,
            restart_base: 100_000,
        }
    }
}

/// Statistics for DDFW.
#[derive(Debug, Clone, Default)]
pub struct DdfwStats {
    /// Variable flips.
    pub flips: u64,
    /// Weight transfers at local minima.
    pub shifts: u64,
    /// Restarts from the best model.
    pub restarts: u64,
    /// Weight reinitializations.
    pub reinits: u64,
}

#[derive(Debug, Clone, Default)]
struct VarInfo {
    value: bool,
    reward: i64,
    /// Pinned by an assumption
    fixed: bool,
}

/// DDFW Boolean local-search engine.
#[derive(Debug)]
pub struct Ddfw {
    config: DdfwConfig,
    rng: StdRng,
    limit: ResourceLimit,
    clauses: Vec<ClauseInfo>,
    /// Clauses containing each literal, indexed by `Lit::code`
    use_list: Vec<Vec<ClauseId>>,
    vars: Vec<VarInfo>,
    unsat: UnsatSet,
    model: Vec<LBool>,
    min_unsat: usize,
    has_empty_clause: bool,
    reinit_at: u64,
    reinit_count: u64,
    restart_at: u64,
    restart_count: u64,
    stats: DdfwStats,
}

impl Default for Ddfw {
    fn default() -> Self {
        Self::new()
    }
}

impl Ddfw {
    /// Create an engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DdfwConfig::default())
    }

    /// Create with custom configuration.
    #[must_use]
    pub fn with_config(config: DdfwConfig) -> Self {
        Self {
            reinit_at: config.reinit_base,
            restart_at: config.restart_base,
            config,
            rng: StdRng::seed_from_u64(0),
            limit: ResourceLimit::new(),
            clauses: Vec::new(),
            use_list: Vec::new(),
            vars: Vec::new(),
            unsat: UnsatSet::new(),
            model: Vec::new(),
            min_unsat: 0,
            has_empty_clause: false,
            reinit_count: 0,
            restart_count: 0,
            stats: DdfwStats::default(),
        }
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> &DdfwStats {
        &self.stats
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &DdfwConfig {
        &self.config
    }

    /// Fewest falsified clauses seen since `reinit`.
    #[must_use]
    pub fn min_unsat(&self) -> usize {
        self.min_unsat
    }

    /// Current reward of a variable.
    #[must_use]
    pub fn reward(&self, var: Var) -> i64 {
        self.vars.get(var.index()).map_or(0, |v| v.reward)
    }

    #[inline]
    fn is_true(&self, lit: Lit) -> bool {
        lit.is_true_under(self.vars[lit.var().index()].value)
    }

    /// Recompute truth counts, the falsified set and all rewards.
    fn init_clause_data(&mut self) {
        self.unsat.clear();
        for v in &mut self.vars {
            v.reward = 0;
        }
        for (idx, info) in self.clauses.iter_mut().enumerate() {
            let w = i64::from(info.weight);
            let mut num_trues = 0;
            let mut sole = None;
            for lit in info.clause() {
                if lit.is_true_under(self.vars[lit.var().index()].value) {
                    num_trues += 1;
                    sole = Some(lit.var());
                }
            }
            info.num_trues = num_trues;
            match num_trues {
                0 => {
                    self.unsat.insert(ClauseId::new(idx as u32));
                    for lit in info.clause() {
                        self.vars[lit.var().index()].reward += w;
                    }
                }
                1 => {
                    if let Some(v) = sole {
                        self.vars[v.index()].reward -= w;
                    }
                }
                _ => {}
            }
        }
    }

    /// The true literal of a clause other than one over `skip`.
    fn other_true_var(&self, cid: ClauseId, skip: Var) -> Option<Var> {
        self.clauses[cid.index()]
            .clause()
            .iter()
            .find(|&l| l.var() != skip && self.is_true(l))
            .map(Lit::var)
    }

    fn flip_var(&mut self, var: Var) {
        let vi = var.index();
        let old = self.vars[vi].value;
        self.vars[vi].value = !old;
        self.stats.flips += 1;

        let now_true = Lit::new(var, old);
        let now_false = !now_true;

        for k in 0..self.use_list[now_true.code()].len() {
            let cid = self.use_list[now_true.code()][k];
            let c = cid.index();
            let w = i64::from(self.clauses[c].weight);
            let before = self.clauses[c].num_trues;
            self.clauses[c].num_trues += 1;
            match before {
                0 => {
                    self.unsat.remove(cid);
                    for lit in self.clauses[c].clause() {
                        self.vars[lit.var().index()].reward -= w;
                    }
                    self.vars[vi].reward -= w;
                }
                1 => {
                    if let Some(u) = self.other_true_var(cid, var) {
                        self.vars[u.index()].reward += w;
                    }
                }
                _ => {}
            }
        }

        for k in 0..self.use_list[now_false.code()].len() {
            let cid = self.use_list[now_false.code()][k];
            let c = cid.index();
            let w = i64::from(self.clauses[c].weight);
            let before = self.clauses[c].num_trues;
            self.clauses[c].num_trues -= 1;
            match before {
                1 => {
                    self.vars[vi].reward += w;
                    self.unsat.insert(cid);
                    for lit in self.clauses[c].clause() {
                        self.vars[lit.var().index()].reward += w;
                    }
                }
                2 => {
                    if let Some(u) = self.other_true_var(cid, var) {
                        self.vars[u.index()].reward -= w;
                    }
                }
                _ => {}
            }
        }
    }

    /// Best variable of the falsified clauses, or `None` at a local minimum.
    fn pick_var(&mut self) -> Option<Var> {
        let mut best = None;
        let mut best_reward = i64::MIN;
        let mut ties = 0u32;
        for cid in self.unsat.iter() {
            for lit in self.clauses[cid.index()].clause() {
                let info = &self.vars[lit.var().index()];
                if info.fixed {
                    continue;
                }
                if info.reward > best_reward {
                    best_reward = info.reward;
                    best = Some(lit.var());
                    ties = 1;
                } else if info.reward == best_reward {
                    ties += 1;
                    if self.rng.random_range(0..ties) == 0 {
                        best = Some(lit.var());
                    }
                }
            }
        }
        if best_reward > 0 {
            return best;
        }
        if best_reward == 0 && self.rng.random_range(0..100) < self.config.use_reward_zero_pct {
            return best;
        }
        None
    }

    /// Satisfied clause that donates weight to the falsified clause `cid`.
    fn select_neighbor(&mut self, cid: ClauseId) -> Option<ClauseId> {
        let init = self.config.init_clause_weight;
        let mut best = None;
        let mut best_weight = 1;
        for lit in self.clauses[cid.index()].clause() {
            // lit is false, so clauses containing its negation are satisfied
            for &n in &self.use_list[(!lit).code()] {
                let w = self.clauses[n.index()].weight;
                if w > best_weight {
                    best_weight = w;
                    best = Some(n);
                }
            }
        }
        if best.is_some() && best_weight >= init {
            return best;
        }
        if self.clauses.is_empty() {
            return None;
        }
        for _ in 0..NEIGHBOR_PROBES {
            let n = self.rng.random_range(0..self.clauses.len());
            let info = &self.clauses[n];
            if info.is_true() && info.weight >= init && info.weight > 1 {
                return Some(ClauseId::new(n as u32));
            }
        }
        best
    }

    fn shift_weights(&mut self) {
        self.stats.shifts += 1;
        let falsified: Vec<ClauseId> = self.unsat.iter().collect();
        for cid in falsified {
            let Some(donor) = self.select_neighbor(cid) else {
                continue;
            };
            let donor_weight = self.clauses[donor.index()].weight;
            let inc = if donor_weight > self.config.init_clause_weight { 2 } else { 1 };
            if donor_weight <= inc {
                continue;
            }
            self.clauses[donor.index()].weight -= inc;
            self.clauses[cid.index()].weight += inc;

            let delta = i64::from(inc);
            for lit in self.clauses[cid.index()].clause() {
                self.vars[lit.var().index()].reward += delta;
            }
            if self.clauses[donor.index()].num_trues == 1 {
                let sole = self.clauses[donor.index()]
                    .clause()
                    .iter()
                    .find(|&l| self.is_true(l))
                    .map(Lit::var);
                if let Some(u) = sole {
                    self.vars[u.index()].reward += delta;
                }
            }
        }
    }

    fn should_reinit_weights(&self) -> bool {
        self.stats.flips >= self.reinit_at
    }

    fn reinit_weights(&mut self) {
        let init = self.config.init_clause_weight;
        if self.reinit_count % 2 == 0 {
            for info in &mut self.clauses {
                info.weight += 1;
            }
        } else {
            for info in &mut self.clauses {
                info.weight = if info.is_true() { init } else { init + 1 };
            }
        }
        self.init_clause_data();
        self.reinit_count += 1;
        self.stats.reinits += 1;
        self.reinit_at = self.stats.flips + self.reinit_count * self.config.reinit_base;
        trace!(reinits = self.reinit_count, "ddfw reinit weights");
    }

    fn should_restart(&self) -> bool {
        self.stats.flips >= self.restart_at
    }

    fn restart(&mut self) {
        for (i, info) in self.vars.iter_mut().enumerate() {
            if info.fixed {
                continue;
            }
            info.value = match self.model.get(i) {
                Some(&m) if self.rng.random_range(0..4) != 0 => m.is_true(),
                _ => self.rng.random_bool(0.5),
            };
        }
        let init = self.config.init_clause_weight;
        for info in &mut self.clauses {
            info.weight = init;
        }
        self.init_clause_data();
        self.restart_count += 1;
        self.stats.restarts += 1;
        self.restart_at = self.stats.flips + self.restart_count * self.config.restart_base;
        trace!(
            restarts = self.restart_count,
            unsat = self.unsat.len(),
            "ddfw restart"
        );
    }

    fn save_best_values(&mut self) {
        self.min_unsat = self.unsat.len();
        self.model.clear();
        self.model
            .extend(self.vars.iter().map(|v| LBool::from(v.value)));
    }

    fn unfix_all(&mut self) {
        for v in &mut self.vars {
            v.fixed = false;
        }
    }

    /// Pin assumption literals. Returns `false` on contradictory assumptions.
    fn apply_assumptions(&mut self, assumptions: &[Lit]) -> Result<bool> {
        for &lit in assumptions {
            let vi = lit.var().index();
            let Some(info) = self.vars.get(vi) else {
                return Err(OxilsError::UnknownVariable(lit.var().raw()));
            };
            if info.fixed {
                if info.value != lit.is_pos() {
                    return Ok(false);
                }
                continue;
            }
            if info.value != lit.is_pos() {
                self.flip_var(lit.var());
            }
            self.vars[vi].fixed = true;
        }
        Ok(true)
    }
}

impl BoolSearchView for Ddfw {
    fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn value(&self, var: Var) -> bool {
        self.vars.get(var.index()).is_some_and(|v| v.value)
    }

    fn num_unsat(&self) -> usize {
        self.unsat.len()
    }
}

impl BoolLocalSearch for Ddfw {
    fn reinit(&mut self, cnf: &Cnf, phase: &[bool]) {
        let num_vars = cnf.num_vars();
        let init = self.config.init_clause_weight;

        self.vars = (0..num_vars)
            .map(|i| VarInfo {
                value: phase.get(i).copied().unwrap_or(false),
                ..VarInfo::default()
            })
            .collect();
        self.clauses = cnf
            .clauses()
            .iter()
            .map(|c| ClauseInfo::new(c.clone(), init))
            .collect();
        self.has_empty_clause = cnf.clauses().iter().any(|c| c.is_empty());

        self.use_list = vec![Vec::new(); 2 * num_vars];
        for (idx, clause) in cnf.clauses().iter().enumerate() {
            for lit in clause {
                self.use_list[lit.code()].push(ClauseId::new(idx as u32));
            }
        }

        self.unsat = UnsatSet::with_capacity(self.clauses.len());
        self.init_clause_data();
        self.model.clear();
        self.min_unsat = self.unsat.len();
        self.stats = DdfwStats::default();
        self.reinit_count = 0;
        self.restart_count = 0;
        self.reinit_at = self.config.reinit_base;
        self.restart_at = self.config.restart_base;
    }

    fn set_params(&mut self, config: &DdfwConfig) {
        self.config = config.clone();
        self.reinit_at = self.stats.flips + config.reinit_base;
        self.restart_at = self.stats.flips + config.restart_base;
    }

    fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn rlimit(&self) -> &ResourceLimit {
        &self.limit
    }

    fn rlimit_mut(&mut self) -> &mut ResourceLimit {
        &mut self.limit
    }

    fn check(&mut self, assumptions: &[Lit]) -> Result<SearchResult> {
        self.unfix_all();
        let consistent = self.apply_assumptions(assumptions);
        if !matches!(consistent, Ok(true)) || self.has_empty_clause {
            self.unfix_all();
            return consistent.map(|_| SearchResult::Unsat);
        }

        while !self.unsat.is_empty() && self.limit.inc() {
            if self.should_reinit_weights() {
                self.reinit_weights();
            } else if self.should_restart() {
                self.restart();
            } else if let Some(var) = self.pick_var() {
                self.flip_var(var);
            } else {
                self.shift_weights();
            }
            if self.unsat.len() < self.min_unsat {
                self.save_best_values();
            }
        }
        self.unfix_all();

        trace!(
            flips = self.stats.flips,
            shifts = self.stats.shifts,
            unsat = self.unsat.len(),
            min_unsat = self.min_unsat,
            "ddfw check done"
        );

        Ok(if self.unsat.is_empty() {
            SearchResult::Sat
        } else {
            SearchResult::Unknown
        })
    }

    fn unsat_set(&self) -> &UnsatSet {
        &self.unsat
    }

    fn get_model(&self) -> &[LBool] {
        &self.model
    }

    fn get_clause_info(&self, id: ClauseId) -> &ClauseInfo {
        &self.clauses[id.index()]
    }

    fn flip(&mut self, var: Var) {
        if var.index() < self.vars.len() {
            self.flip_var(var);
        }
    }
}
