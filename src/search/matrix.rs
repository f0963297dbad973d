//! Simultaneous-move search: every node is a zero-sum matrix game over both
//! sides' actions, filled lazily with bound-driven pruning of dominated rows
//! and columns.
//!
//! Each entry keeps a pessimistic and an optimistic bound. Before an entry is
//! searched, two small linear programs give the window outside of which the
//! entry would make its row (or column) dominated by a mixture of the others;
//! the child is searched only inside that window.
//!
//! A node searched with window `(alpha, beta)` returns
//! `median(alpha, value, beta)`: the game is augmented with an `alpha` row and
//! a `beta` column.

use super::alphabeta::AlphaBetaSearch;
use super::lp::{solve_zero_sum, LinearProgram, Relation};
use super::{effective_horizon, is_terminal, with_completed_opponent, SearchOutcome, SearchStrategy};
use crate::env::BattleEnv;
use crate::error::SearchError;
use crate::estimate::MoveEstimator;
use crate::eval::StateEvaluator;
use crate::model::{BattleState, Side};
use tracing::{trace, warn};

pub const DEFAULT_EPSILON: f64 = 1e-6;

pub struct MatrixGameSearch<'a, E: ?Sized, V: ?Sized> {
    env: &'a E,
    evaluator: &'a V,
    estimator: Option<&'a MoveEstimator>,
    max_depth: u32,
    epsilon: f64,
}

#[derive(Default)]
struct Stats {
    nodes: usize,
    pruned: usize,
    fallbacks: usize,
}

/// Entry bounds and surviving strategies of one node.
struct Bounds {
    pess: Vec<Vec<f64>>,
    opt: Vec<Vec<f64>>,
    rows: Vec<bool>,
    cols: Vec<bool>,
}

impl Bounds {
    fn new(m: usize, n: usize) -> Self {
        Bounds {
            pess: vec![vec![f64::NEG_INFINITY; n]; m],
            opt: vec![vec![f64::INFINITY; n]; m],
            rows: vec![true; m],
            cols: vec![true; n],
        }
    }

    fn alive_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).filter(|&i| self.rows[i]).collect()
    }

    fn alive_cols(&self) -> Vec<usize> {
        (0..self.cols.len()).filter(|&j| self.cols[j]).collect()
    }

    fn set_exact(&mut self, a: usize, b: usize, value: f64) {
        self.pess[a][b] = value;
        self.opt[a][b] = value;
    }

    /// Some other row, or the `alpha` row, is at least as good in every column.
    fn row_dominated(&self, a: usize, alpha: f64) -> bool {
        let cols = self.alive_cols();
        if alpha.is_finite() && cols.iter().all(|&j| self.opt[a][j] <= alpha) {
            return true;
        }
        self.alive_rows()
            .into_iter()
            .filter(|&r| r != a)
            .any(|r| cols.iter().all(|&j| self.pess[r][j] >= self.opt[a][j]))
    }

    fn col_dominated(&self, b: usize, beta: f64) -> bool {
        let rows = self.alive_rows();
        if beta.is_finite() && rows.iter().all(|&i| self.pess[i][b] >= beta) {
            return true;
        }
        self.alive_cols()
            .into_iter()
            .filter(|&c| c != b)
            .any(|c| rows.iter().all(|&i| self.opt[i][c] <= self.pess[i][b]))
    }

    /// Largest value entry `(a, b)` can take while row `a` is still dominated
    /// by a mixture of the other rows. `-inf` when no mixture exists.
    fn row_threshold(&self, a: usize, b: usize, alpha: f64) -> f64 {
        let cols = self.alive_cols();
        let others: Vec<usize> = cols.iter().copied().filter(|&j| j != b).collect();
        if others.iter().any(|&j| !self.opt[a][j].is_finite()) {
            return f64::NEG_INFINITY;
        }
        let candidates: Vec<usize> = self
            .alive_rows()
            .into_iter()
            .filter(|&r| r != a && cols.iter().all(|&j| self.pess[r][j].is_finite()))
            .collect();
        let with_alpha = alpha.is_finite();
        if candidates.is_empty() && !with_alpha {
            return f64::NEG_INFINITY;
        }

        let column = |j: usize| {
            let mut coeffs: Vec<f64> = candidates.iter().map(|&r| self.pess[r][j]).collect();
            if with_alpha {
                coeffs.push(alpha);
            }
            coeffs
        };
        let width = candidates.len() + with_alpha as usize;
        let mut lp = LinearProgram::maximize(column(b));
        for &j in &others {
            lp.constrain(column(j), Relation::Ge, self.opt[a][j]);
        }
        lp.constrain(vec![1.0; width], Relation::Eq, 1.0);
        lp.solve().map(|s| s.objective).unwrap_or(f64::NEG_INFINITY)
    }

    /// Smallest value entry `(a, b)` can take while column `b` is still
    /// dominated by a mixture of the other columns. `+inf` when none exists.
    fn col_threshold(&self, a: usize, b: usize, beta: f64) -> f64 {
        let rows = self.alive_rows();
        let others: Vec<usize> = rows.iter().copied().filter(|&i| i != a).collect();
        if others.iter().any(|&i| !self.pess[i][b].is_finite()) {
            return f64::INFINITY;
        }
        let candidates: Vec<usize> = self
            .alive_cols()
            .into_iter()
            .filter(|&c| c != b && rows.iter().all(|&i| self.opt[i][c].is_finite()))
            .collect();
        let with_beta = beta.is_finite();
        if candidates.is_empty() && !with_beta {
            return f64::INFINITY;
        }

        let row = |i: usize| {
            let mut coeffs: Vec<f64> = candidates.iter().map(|&c| self.opt[i][c]).collect();
            if with_beta {
                coeffs.push(beta);
            }
            coeffs
        };
        let width = candidates.len() + with_beta as usize;
        let objective: Vec<f64> = row(a).into_iter().map(|v| -v).collect();
        let mut lp = LinearProgram::maximize(objective);
        for &i in &others {
            lp.constrain(row(i), Relation::Le, self.pess[i][b]);
        }
        lp.constrain(vec![1.0; width], Relation::Eq, 1.0);
        lp.solve().map(|s| -s.objective).unwrap_or(f64::INFINITY)
    }
}

impl<'a, E, V> MatrixGameSearch<'a, E, V>
where
    E: BattleEnv + ?Sized,
    V: StateEvaluator + ?Sized,
{
    pub fn new(env: &'a E, evaluator: &'a V, max_depth: u32) -> Self {
        MatrixGameSearch {
            env,
            evaluator,
            estimator: None,
            max_depth,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_estimator(mut self, estimator: &'a MoveEstimator) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Width of the null window used when a row and a column bound cross.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    fn sequential(&self) -> AlphaBetaSearch<'a, E, V> {
        let search = AlphaBetaSearch::new(self.env, self.evaluator, self.max_depth);
        match self.estimator {
            Some(estimator) => search.with_estimator(estimator),
            None => search,
        }
    }

    /// Returns the windowed value and the controlled action to play.
    fn node_value(
        &self,
        stats: &mut Stats,
        state: &BattleState,
        depth: u32,
        alpha: f64,
        beta: f64,
    ) -> (f64, usize) {
        stats.nodes += 1;
        if is_terminal(state, depth, effective_horizon(self.max_depth)) {
            return (self.evaluator.evaluate(state, depth), 0);
        }
        let state = with_completed_opponent(state, self.estimator);
        let m = self.env.legal_action_count(&state, Side::Player);
        let n = self.env.legal_action_count(&state, Side::Opponent);
        if m == 0 || n == 0 {
            return (self.evaluator.evaluate(&state, depth), 0);
        }

        let mut bounds = Bounds::new(m, n);
        for a in 0..m {
            for b in 0..n {
                if !bounds.rows[a] {
                    break;
                }
                if !bounds.cols[b] {
                    continue;
                }
                if bounds.row_dominated(a, alpha) {
                    bounds.rows[a] = false;
                    stats.pruned += 1;
                    break;
                }
                if bounds.col_dominated(b, beta) {
                    bounds.cols[b] = false;
                    stats.pruned += 1;
                    continue;
                }

                let lo = bounds.row_threshold(a, b, alpha);
                let hi = bounds.col_threshold(a, b, beta);
                let next = self.env.step(&state, [a, b]);
                if lo >= hi {
                    let (v, _) = self.node_value(stats, &next, depth + 1, lo, lo + self.epsilon);
                    if v <= lo {
                        bounds.rows[a] = false;
                    } else {
                        bounds.cols[b] = false;
                    }
                    stats.pruned += 1;
                } else {
                    let (v, _) = self.node_value(stats, &next, depth + 1, lo, hi);
                    if v <= lo {
                        bounds.rows[a] = false;
                        stats.pruned += 1;
                    } else if v >= hi {
                        bounds.cols[b] = false;
                        stats.pruned += 1;
                    } else {
                        bounds.set_exact(a, b, v);
                    }
                }
            }
        }

        let rows = bounds.alive_rows();
        let cols = bounds.alive_cols();
        if rows.is_empty() && alpha.is_finite() {
            return (alpha, 0);
        }
        if cols.is_empty() && beta.is_finite() {
            return (beta, rows.first().copied().unwrap_or(0));
        }

        let mut matrix: Vec<Vec<f64>> = rows
            .iter()
            .map(|&i| {
                let mut row: Vec<f64> = cols.iter().map(|&j| bounds.pess[i][j]).collect();
                if beta.is_finite() {
                    row.push(beta);
                }
                row
            })
            .collect();
        if alpha.is_finite() {
            let width = cols.len() + beta.is_finite() as usize;
            matrix.push(vec![alpha; width]);
        }

        match solve_zero_sum(&matrix) {
            Ok(solution) => {
                // a pure optimal row wins over the mixed strategy's favourite
                let pure = (0..rows.len())
                    .find(|&k| matrix[k].iter().all(|&v| v >= solution.value - 1e-9));
                let best = pure.unwrap_or_else(|| solution.best_row());
                let action = rows.get(best).or(rows.first()).copied().unwrap_or(0);
                (solution.value, action)
            }
            Err(err) => {
                warn!(%err, depth, "matrix game unsolved, using sequential search for this node");
                stats.fallbacks += 1;
                let outcome = self.sequential().search_from(&state, depth);
                stats.nodes += outcome.nodes;
                (outcome.value, outcome.action)
            }
        }
    }
}

impl<'a, E, V> SearchStrategy for MatrixGameSearch<'a, E, V>
where
    E: BattleEnv + ?Sized,
    V: StateEvaluator + ?Sized,
{
    fn search(&self, root: &BattleState) -> Result<SearchOutcome, SearchError> {
        let n = self.env.legal_action_count(root, Side::Player);
        if n == 0 {
            return Err(SearchError::NoLegalActions);
        }
        if root.active_fainted() {
            return Ok(SearchOutcome {
                action: 0,
                value: self.evaluator.evaluate(root, 0),
                nodes: 1,
                pruned: 0,
            });
        }

        let mut stats = Stats::default();
        let (value, action) =
            self.node_value(&mut stats, root, 0, f64::NEG_INFINITY, f64::INFINITY);
        let action = action.min(n - 1);
        trace!(
            action,
            value,
            nodes = stats.nodes,
            pruned = stats.pruned,
            fallbacks = stats.fallbacks,
            "matrix-game search finished"
        );
        Ok(SearchOutcome {
            action,
            value,
            nodes: stats.nodes,
            pruned: stats.pruned,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Combatant, Move, Status, Team};
    use crate::types::PkmType;

    /// `k` actions per side; the turn counter encodes the joint path.
    struct PathEnv {
        k: usize,
    }

    impl BattleEnv for PathEnv {
        fn legal_action_count(&self, _state: &BattleState, _side: Side) -> usize {
            self.k
        }

        fn step(&self, state: &BattleState, actions: [usize; 2]) -> BattleState {
            let k = self.k as u32;
            let mut next = state.clone();
            next.turn = state.turn * k * k + (actions[0] as u32) * k + actions[1] as u32 + 1;
            next
        }
    }

    fn mon() -> Combatant {
        Combatant {
            name: "Probe".to_string(),
            pkm_type: PkmType::Normal,
            hp: 100.0,
            max_hp: 100.0,
            status: Status::None,
            moves: vec![Move::new("Tackle", PkmType::Normal, 40.0)],
        }
    }

    fn root() -> BattleState {
        BattleState::new(Team::new(mon(), vec![]), Team::new(mon(), vec![]))
    }

    fn table(values: &'static [f64]) -> impl Fn(&BattleState, u32) -> f64 {
        move |s: &BattleState, _d: u32| values[(s.turn as usize).saturating_sub(1) % values.len()]
    }

    /// Exhaustive matrix-game value without any pruning.
    fn full_value(
        env: &PathEnv,
        eval: &dyn Fn(&BattleState, u32) -> f64,
        s: &BattleState,
        depth: u32,
        horizon: u32,
    ) -> f64 {
        if depth >= horizon {
            return eval(s, depth);
        }
        let matrix: Vec<Vec<f64>> = (0..env.k)
            .map(|a| {
                (0..env.k)
                    .map(|b| full_value(env, eval, &env.step(s, [a, b]), depth + 1, horizon))
                    .collect()
            })
            .collect();
        solve_zero_sum(&matrix).unwrap().value
    }

    #[test]
    fn saddle_point_row_is_chosen() {
        let payoff = table(&[3.0, 5.0, 1.0, 4.0]);
        let outcome = MatrixGameSearch::new(&PathEnv { k: 2 }, &payoff, 1)
            .search(&root())
            .unwrap();
        assert_eq!(outcome.action, 0);
        assert!((outcome.value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn simultaneous_value_beats_sequential_on_pennies() {
        let payoff = table(&[1.0, -1.0, -1.0, 1.0]);
        let env = PathEnv { k: 2 };
        let matrix = MatrixGameSearch::new(&env, &payoff, 1).search(&root()).unwrap();
        let sequential = AlphaBetaSearch::new(&env, &payoff, 1).search(&root()).unwrap();
        assert!(matrix.value.abs() < 1e-9);
        assert_eq!(sequential.value, -1.0);
        assert_eq!(matrix.action, 0);
    }

    #[test]
    fn dominated_rows_and_columns_are_removed() {
        // row 0 dominates both other rows, column 1 is never better than column 0
        let payoff = table(&[5.0, 6.0, 7.0, 1.0, 2.0, 3.0, 4.0, 4.5, 4.2]);
        let env = PathEnv { k: 3 };
        let outcome = MatrixGameSearch::new(&env, &payoff, 1).search(&root()).unwrap();
        assert!(outcome.pruned >= 2);
        assert!(outcome.nodes <= 1 + 9);
        assert_eq!(outcome.action, 0);
        assert!((outcome.value - 5.0).abs() < 1e-9);
    }

    #[test]
    fn unsolvable_node_falls_back_to_sequential_search() {
        // the first leaf poisons the payoff matrix
        let payoff = table(&[f64::NAN, 2.0, 3.0, 1.0]);
        let env = PathEnv { k: 2 };
        let search = MatrixGameSearch::new(&env, &payoff, 1);
        let mut stats = Stats::default();
        let (value, action) =
            search.node_value(&mut stats, &root(), 0, f64::NEG_INFINITY, f64::INFINITY);
        assert_eq!(stats.fallbacks, 1);

        let expected = AlphaBetaSearch::new(&env, &payoff, 1).search_from(&root(), 0);
        assert_eq!(value, expected.value);
        assert_eq!(action, expected.action);
        assert_eq!((value, action), (2.0, 0));

        let outcome = search.search(&root()).unwrap();
        assert_eq!(outcome.value, 2.0);
        assert_eq!(outcome.action, 0);
    }

    #[test]
    fn pruned_value_matches_exhaustive_game_value() {
        let values: &'static [f64] = &[
            0.3, -1.2, 2.5, 0.7, 1.9, -0.4, 3.1, -2.2, 0.0, 1.4, -0.9, 2.2, 0.6, -1.7, 1.1, 2.8,
            -0.3, 0.9, 1.6, -2.5, 0.4, 2.0, -1.1, 0.8, 1.3, -0.6, 2.7,
        ];
        let payoff = table(values);
        let env = PathEnv { k: 3 };
        let outcome = MatrixGameSearch::new(&env, &payoff, 2).search(&root()).unwrap();
        let expected = full_value(&env, &payoff, &root(), 0, 2);
        assert!((outcome.value - expected).abs() < 1e-6);
        assert!(outcome.nodes <= 1 + 9 + 81);
    }
}
