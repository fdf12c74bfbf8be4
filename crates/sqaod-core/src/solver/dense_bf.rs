//! Exhaustive search over every assignment of a dense graph.

use tracing::{Level, event};

use super::{AnnealSchedule, DEFAULT_MAX_SOLUTIONS, ENERGY_EPSILON, SolveOutcome, Solver};
use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::formulas::dense;
use crate::model::{Assignment, Bits, MAX_PACKED_BITS, Matrix, dot};
use crate::selector::{GraphType, SolverType};

const DEFAULT_TILE_SIZE: u64 = 1 << 10;

pub struct DenseGraphBFSolver {
    method: OptimizeMethod,
    /// `W` with the direction sign applied.
    w: Option<Matrix>,
    tile_size: u64,
    x_max: u64,
    min_e: f64,
    max_solutions: usize,
    searching: bool,
    packed: Vec<u64>,
    energies: Vec<f64>,
    solutions: Vec<Bits>,
}

impl Default for DenseGraphBFSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseGraphBFSolver {
    pub fn new() -> Self {
        Self {
            method: OptimizeMethod::Minimize,
            w: None,
            tile_size: DEFAULT_TILE_SIZE,
            x_max: 0,
            min_e: f64::INFINITY,
            max_solutions: DEFAULT_MAX_SOLUTIONS,
            searching: false,
            packed: Vec::new(),
            energies: Vec::new(),
            solutions: Vec::new(),
        }
    }

    pub fn problem_size(&self) -> Option<usize> {
        self.w.as_ref().map(Matrix::rows)
    }

    pub fn set_problem(&mut self, w: &Matrix, method: OptimizeMethod) -> Result<(), SolverError> {
        dense::check_w(w)?;
        if w.rows() > MAX_PACKED_BITS {
            return Err(SolverError::ProblemTooLarge {
                bits: w.rows(),
                max: MAX_PACKED_BITS,
            });
        }
        self.method = method;
        self.w = Some(method.sign(w.clone()));
        self.searching = false;
        Ok(())
    }

    /// Number of assignments evaluated per [`Self::search_range`] call in [`Self::search`].
    pub fn set_tile_size(&mut self, tile_size: u64) {
        self.tile_size = tile_size.max(1);
    }

    /// Caps how many tied optima are kept; at least one always is.
    pub fn set_max_solutions(&mut self, max_solutions: usize) {
        self.max_solutions = max_solutions.max(1);
    }

    pub fn init_search(&mut self) -> Result<(), SolverError> {
        let n = self.problem_size().ok_or(SolverError::ProblemNotSet)?;
        self.x_max = 1u64 << n;
        self.min_e = f64::INFINITY;
        self.packed.clear();
        self.searching = true;
        Ok(())
    }

    /// Evaluates packed assignments in `[begin, end)`, clamped to the search space.
    pub fn search_range(&mut self, begin: u64, end: u64) -> Result<(), SolverError> {
        if !self.searching {
            return Err(SolverError::NotInitialized("search_range"));
        }
        let w = self.w.as_ref().ok_or(SolverError::ProblemNotSet)?;
        let n = w.rows();
        let end = end.min(self.x_max);
        for packed in begin..end {
            let x = Bits::from_packed(packed, n).to_reals();
            let e = dot(&x, &w.mul_vec(&x));
            if e < self.min_e - ENERGY_EPSILON {
                self.min_e = e;
                self.packed.clear();
                self.packed.push(packed);
            } else if (e - self.min_e).abs() <= ENERGY_EPSILON
                && self.packed.len() < self.max_solutions
            {
                self.packed.push(packed);
            }
        }
        Ok(())
    }

    pub fn fin_search(&mut self) -> Result<(), SolverError> {
        if !self.searching {
            return Err(SolverError::NotInitialized("fin_search"));
        }
        let n = self.problem_size().ok_or(SolverError::ProblemNotSet)?;
        let energy = self.method.sign(self.min_e);
        self.solutions = self
            .packed
            .iter()
            .map(|&packed| Bits::from_packed(packed, n))
            .collect();
        self.energies = vec![energy; self.solutions.len()];
        self.searching = false;
        log_search_result(self.method, n, energy, self.solutions.len());
        Ok(())
    }

    /// Runs the whole search tile by tile.
    pub fn search(&mut self) -> Result<(), SolverError> {
        self.init_search()?;
        let mut begin = 0u64;
        while begin < self.x_max {
            let end = begin.saturating_add(self.tile_size).min(self.x_max);
            self.search_range(begin, end)?;
            begin = end;
        }
        self.fin_search()
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Every assignment that reaches the optimum.
    pub fn solutions(&self) -> &[Bits] {
        &self.solutions
    }
}

impl Solver for DenseGraphBFSolver {
    fn graph_type(&self) -> GraphType {
        GraphType::Dense
    }

    fn solver_type(&self) -> SolverType {
        SolverType::BruteForce
    }

    fn optimize_method(&self) -> OptimizeMethod {
        self.method
    }

    fn seed(&mut self, _seed: u64) {}

    fn solve(&mut self, _schedule: &AnnealSchedule) -> Result<SolveOutcome, SolverError> {
        self.search()?;
        let solutions = self
            .solutions
            .iter()
            .cloned()
            .map(Assignment::Dense)
            .collect();
        SolveOutcome::collect(self.method, self.energies.clone(), solutions, 0)
    }
}

fn log_search_result(method: OptimizeMethod, n: usize, energy: f64, optima: usize) {
    if !tracing::enabled!(target: "sqaod::search", Level::INFO) {
        return;
    }

    event!(
        target: "sqaod::search",
        Level::INFO,
        graph = "dense",
        method = %method,
        n,
        best_energy = energy,
        optima,
    );
}
