//! Dense two-phase simplex (Bland's rule) and zero-sum matrix game solving.

use crate::error::LpError;

const EPS: f64 = 1e-9;
const FEASIBILITY_TOL: f64 = 1e-7;
const MAX_PIVOTS: usize = 10_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl Relation {
    fn flipped(self) -> Relation {
        match self {
            Relation::Le => Relation::Ge,
            Relation::Ge => Relation::Le,
            Relation::Eq => Relation::Eq,
        }
    }
}

#[derive(Clone, Debug)]
struct Constraint {
    coeffs: Vec<f64>,
    relation: Relation,
    rhs: f64,
}

/// `maximize c·x` subject to linear constraints and `x >= 0`.
#[derive(Clone, Debug)]
pub struct LinearProgram {
    objective: Vec<f64>,
    constraints: Vec<Constraint>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LpSolution {
    pub objective: f64,
    pub x: Vec<f64>,
}

impl LinearProgram {
    pub fn maximize(objective: Vec<f64>) -> Self {
        LinearProgram {
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn constrain(&mut self, coeffs: Vec<f64>, relation: Relation, rhs: f64) -> &mut Self {
        debug_assert_eq!(coeffs.len(), self.objective.len());
        self.constraints.push(Constraint {
            coeffs,
            relation,
            rhs,
        });
        self
    }

    pub fn solve(&self) -> Result<LpSolution, LpError> {
        let n = self.objective.len();
        let rows: Vec<Constraint> = self
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    Constraint {
                        coeffs: c.coeffs.iter().map(|v| -v).collect(),
                        relation: c.relation.flipped(),
                        rhs: -c.rhs,
                    }
                } else {
                    c.clone()
                }
            })
            .collect();
        if rows
            .iter()
            .any(|c| !c.rhs.is_finite() || c.coeffs.iter().any(|v| !v.is_finite()))
            || self.objective.iter().any(|v| !v.is_finite())
        {
            return Err(LpError::NonFinite);
        }

        let n_slack = rows.iter().filter(|c| c.relation != Relation::Eq).count();
        let n_art = rows.iter().filter(|c| c.relation != Relation::Le).count();
        let art_start = n + n_slack;
        let cols = art_start + n_art;
        let mut tableau = Tableau {
            rows: Vec::with_capacity(rows.len()),
            obj: vec![0.0; cols + 1],
            basis: Vec::with_capacity(rows.len()),
            cols,
        };

        let mut slack = n;
        let mut art = art_start;
        for c in &rows {
            let mut row = vec![0.0; cols + 1];
            row[..n].copy_from_slice(&c.coeffs);
            row[cols] = c.rhs;
            match c.relation {
                Relation::Le => {
                    row[slack] = 1.0;
                    tableau.basis.push(slack);
                    slack += 1;
                }
                Relation::Ge => {
                    row[slack] = -1.0;
                    slack += 1;
                    row[art] = 1.0;
                    tableau.basis.push(art);
                    art += 1;
                }
                Relation::Eq => {
                    row[art] = 1.0;
                    tableau.basis.push(art);
                    art += 1;
                }
            }
            tableau.rows.push(row);
        }

        if n_art > 0 {
            // phase 1: maximize -sum(artificials)
            for j in art_start..cols {
                tableau.obj[j] = 1.0;
            }
            tableau.canonicalize();
            tableau.run(cols)?;
            if tableau.obj[cols] < -FEASIBILITY_TOL {
                return Err(LpError::Infeasible);
            }
            tableau.drive_out_artificials(art_start);
        }

        tableau.obj = vec![0.0; cols + 1];
        for (j, c) in self.objective.iter().enumerate() {
            tableau.obj[j] = -c;
        }
        tableau.canonicalize();
        tableau.run(art_start)?;

        let mut x = vec![0.0; n];
        for (i, &b) in tableau.basis.iter().enumerate() {
            if b < n {
                x[b] = tableau.rows[i][cols];
            }
        }
        Ok(LpSolution {
            objective: tableau.obj[cols],
            x,
        })
    }
}

struct Tableau {
    rows: Vec<Vec<f64>>,
    /// Reduced costs; the last entry holds the current objective value.
    obj: Vec<f64>,
    basis: Vec<usize>,
    cols: usize,
}

impl Tableau {
    fn canonicalize(&mut self) {
        for (i, &b) in self.basis.iter().enumerate() {
            let coef = self.obj[b];
            if coef != 0.0 {
                for (o, r) in self.obj.iter_mut().zip(self.rows[i].iter()) {
                    *o -= coef * r;
                }
            }
        }
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let p = self.rows[row][col];
        for v in self.rows[row].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[row].clone();
        for (i, r) in self.rows.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let f = r[col];
            if f != 0.0 {
                for (v, pv) in r.iter_mut().zip(pivot_row.iter()) {
                    *v -= f * pv;
                }
            }
        }
        let f = self.obj[col];
        if f != 0.0 {
            for (v, pv) in self.obj.iter_mut().zip(pivot_row.iter()) {
                *v -= f * pv;
            }
        }
        self.basis[row] = col;
    }

    /// Pivots until no column below `allowed` improves the objective.
    fn run(&mut self, allowed: usize) -> Result<(), LpError> {
        let rhs = self.cols;
        for _ in 0..MAX_PIVOTS {
            let Some(entering) = (0..allowed).find(|&j| self.obj[j] < -EPS) else {
                return Ok(());
            };
            let mut leaving: Option<(usize, f64)> = None;
            for (i, r) in self.rows.iter().enumerate() {
                if r[entering] > EPS {
                    let ratio = r[rhs] / r[entering];
                    leaving = match leaving {
                        None => Some((i, ratio)),
                        Some((best, best_ratio)) => {
                            if ratio < best_ratio - EPS
                                || (ratio <= best_ratio + EPS && self.basis[i] < self.basis[best])
                            {
                                Some((i, ratio))
                            } else {
                                Some((best, best_ratio))
                            }
                        }
                    };
                }
            }
            let Some((row, _)) = leaving else {
                return Err(LpError::Unbounded);
            };
            self.pivot(row, entering);
        }
        Err(LpError::IterationLimit(MAX_PIVOTS))
    }

    fn drive_out_artificials(&mut self, art_start: usize) {
        for i in 0..self.rows.len() {
            if self.basis[i] < art_start {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| self.rows[i][j].abs() > EPS) {
                self.pivot(i, j);
            }
        }
    }
}

/// Value and optimal row (maximizer) strategy of a zero-sum matrix game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSolution {
    pub value: f64,
    pub row_strategy: Vec<f64>,
}

impl GameSolution {
    /// Row with the largest probability; the first one on ties.
    pub fn best_row(&self) -> usize {
        let mut best = 0;
        for (i, p) in self.row_strategy.iter().enumerate() {
            if *p > self.row_strategy[best] + EPS {
                best = i;
            }
        }
        best
    }
}

/// Solves `max_x min_j sum_i x_i M[i][j]` over the probability simplex.
pub fn solve_zero_sum(matrix: &[Vec<f64>]) -> Result<GameSolution, LpError> {
    let m = matrix.len();
    let n = matrix.first().map(|r| r.len()).unwrap_or(0);
    if m == 0 || n == 0 {
        return Err(LpError::EmptyMatrix);
    }
    if matrix.iter().flatten().any(|v| !v.is_finite()) {
        return Err(LpError::NonFinite);
    }
    let min = matrix.iter().flatten().copied().fold(f64::INFINITY, f64::min);
    // keep the game value strictly positive so `v >= 0` is no restriction
    let shift = 1.0 - min;

    let mut objective = vec![0.0; m + 1];
    objective[m] = 1.0;
    let mut lp = LinearProgram::maximize(objective);
    for j in 0..n {
        let mut coeffs: Vec<f64> = matrix.iter().map(|row| -(row[j] + shift)).collect();
        coeffs.push(1.0);
        lp.constrain(coeffs, Relation::Le, 0.0);
    }
    let mut simplex = vec![1.0; m];
    simplex.push(0.0);
    lp.constrain(simplex, Relation::Eq, 1.0);

    let solution = lp.solve()?;
    let mut strategy: Vec<f64> = solution.x[..m].iter().map(|p| p.max(0.0)).collect();
    let total: f64 = strategy.iter().sum();
    if total <= EPS {
        return Err(LpError::Infeasible);
    }
    for p in strategy.iter_mut() {
        *p /= total;
    }
    Ok(GameSolution {
        value: solution.objective - shift,
        row_strategy: strategy,
    })
}
