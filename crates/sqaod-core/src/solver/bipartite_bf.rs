//! Exhaustive search over both layers of a bipartite graph.

use tracing::{Level, event};

use super::{AnnealSchedule, DEFAULT_MAX_SOLUTIONS, ENERGY_EPSILON, SolveOutcome, Solver};
use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::formulas::bipartite;
use crate::model::{Assignment, Bits, BitsPair, MAX_PACKED_BITS, Matrix, dot};
use crate::selector::{GraphType, SolverType};

const DEFAULT_TILE_SIZE: u64 = 1 << 8;

/// Problem coefficients with the direction sign applied.
struct SignedProblem {
    b0: Vec<f64>,
    b1: Vec<f64>,
    w: Matrix,
}

pub struct BipartiteGraphBFSolver {
    method: OptimizeMethod,
    problem: Option<SignedProblem>,
    tile_size0: u64,
    tile_size1: u64,
    x0_max: u64,
    x1_max: u64,
    min_e: f64,
    max_solutions: usize,
    searching: bool,
    packed_pairs: Vec<(u64, u64)>,
    energies: Vec<f64>,
    solutions: Vec<BitsPair>,
}

impl Default for BipartiteGraphBFSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BipartiteGraphBFSolver {
    pub fn new() -> Self {
        Self {
            method: OptimizeMethod::Minimize,
            problem: None,
            tile_size0: DEFAULT_TILE_SIZE,
            tile_size1: DEFAULT_TILE_SIZE,
            x0_max: 0,
            x1_max: 0,
            min_e: f64::INFINITY,
            max_solutions: DEFAULT_MAX_SOLUTIONS,
            searching: false,
            packed_pairs: Vec::new(),
            energies: Vec::new(),
            solutions: Vec::new(),
        }
    }

    /// `(N0, N1)`.
    pub fn problem_size(&self) -> Option<(usize, usize)> {
        self.problem
            .as_ref()
            .map(|problem| (problem.b0.len(), problem.b1.len()))
    }

    pub fn set_problem(
        &mut self,
        b0: &[f64],
        b1: &[f64],
        w: &Matrix,
        method: OptimizeMethod,
    ) -> Result<(), SolverError> {
        bipartite::check_problem(b0, b1, w)?;
        for bits in [b0.len(), b1.len()] {
            if bits > MAX_PACKED_BITS {
                return Err(SolverError::ProblemTooLarge {
                    bits,
                    max: MAX_PACKED_BITS,
                });
            }
        }
        self.method = method;
        self.problem = Some(SignedProblem {
            b0: b0.iter().map(|&v| method.sign(v)).collect(),
            b1: b1.iter().map(|&v| method.sign(v)).collect(),
            w: method.sign(w.clone()),
        });
        self.searching = false;
        Ok(())
    }

    pub fn set_tile_size(&mut self, tile_size0: u64, tile_size1: u64) {
        self.tile_size0 = tile_size0.max(1);
        self.tile_size1 = tile_size1.max(1);
    }

    /// Caps how many tied optima are kept; at least one always is.
    pub fn set_max_solutions(&mut self, max_solutions: usize) {
        self.max_solutions = max_solutions.max(1);
    }

    pub fn init_search(&mut self) -> Result<(), SolverError> {
        let (n0, n1) = self.problem_size().ok_or(SolverError::ProblemNotSet)?;
        self.x0_max = 1u64 << n0;
        self.x1_max = 1u64 << n1;
        self.min_e = f64::INFINITY;
        self.packed_pairs.clear();
        self.searching = true;
        Ok(())
    }

    /// Evaluates `x0 ∈ [begin0, end0)` against `x1 ∈ [begin1, end1)`.
    pub fn search_range(
        &mut self,
        begin0: u64,
        end0: u64,
        begin1: u64,
        end1: u64,
    ) -> Result<(), SolverError> {
        if !self.searching {
            return Err(SolverError::NotInitialized("search_range"));
        }
        let problem = self.problem.as_ref().ok_or(SolverError::ProblemNotSet)?;
        let (n0, n1) = (problem.b0.len(), problem.b1.len());
        let end0 = end0.min(self.x0_max);
        let end1 = end1.min(self.x1_max);
        let x1_range: Vec<(u64, Vec<f64>)> = (begin1..end1)
            .map(|packed| (packed, Bits::from_packed(packed, n1).to_reals()))
            .collect();

        for packed0 in begin0..end0 {
            let x0 = Bits::from_packed(packed0, n0).to_reals();
            let e0 = dot(&problem.b0, &x0);
            let w_x0 = problem.w.mul_vec(&x0);
            for (packed1, x1) in &x1_range {
                let e = e0 + dot(&problem.b1, x1) + dot(x1, &w_x0);
                if e < self.min_e - ENERGY_EPSILON {
                    self.min_e = e;
                    self.packed_pairs.clear();
                    self.packed_pairs.push((packed0, *packed1));
                } else if (e - self.min_e).abs() <= ENERGY_EPSILON
                    && self.packed_pairs.len() < self.max_solutions
                {
                    self.packed_pairs.push((packed0, *packed1));
                }
            }
        }
        Ok(())
    }

    pub fn fin_search(&mut self) -> Result<(), SolverError> {
        if !self.searching {
            return Err(SolverError::NotInitialized("fin_search"));
        }
        let (n0, n1) = self.problem_size().ok_or(SolverError::ProblemNotSet)?;
        let energy = self.method.sign(self.min_e);
        self.solutions = self
            .packed_pairs
            .iter()
            .map(|&(p0, p1)| BitsPair::new(Bits::from_packed(p0, n0), Bits::from_packed(p1, n1)))
            .collect();
        self.energies = vec![energy; self.solutions.len()];
        self.searching = false;
        log_search_result(self.method, (n0, n1), energy, self.solutions.len());
        Ok(())
    }

    /// Runs the whole search tile by tile.
    pub fn search(&mut self) -> Result<(), SolverError> {
        self.init_search()?;
        let mut begin1 = 0u64;
        while begin1 < self.x1_max {
            let end1 = begin1.saturating_add(self.tile_size1).min(self.x1_max);
            let mut begin0 = 0u64;
            while begin0 < self.x0_max {
                let end0 = begin0.saturating_add(self.tile_size0).min(self.x0_max);
                self.search_range(begin0, end0, begin1, end1)?;
                begin0 = end0;
            }
            begin1 = end1;
        }
        self.fin_search()
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn solutions(&self) -> &[BitsPair] {
        &self.solutions
    }
}

impl Solver for BipartiteGraphBFSolver {
    fn graph_type(&self) -> GraphType {
        GraphType::Rbm
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
            .map(Assignment::Bipartite)
            .collect();
        SolveOutcome::collect(self.method, self.energies.clone(), solutions, 0)
    }
}

fn log_search_result(method: OptimizeMethod, (n0, n1): (usize, usize), energy: f64, optima: usize) {
    if !tracing::enabled!(target: "sqaod::search", Level::INFO) {
        return;
    }

    event!(
        target: "sqaod::search",
        Level::INFO,
        graph = "rbm",
        method = %method,
        n0,
        n1,
        best_energy = energy,
        optima,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{MAXIMIZE, MINIMIZE};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn enumerate(b0: &[f64], b1: &[f64], w: &Matrix) -> Vec<f64> {
        let mut energies = Vec::new();
        for p0 in 0..(1u64 << b0.len()) {
            for p1 in 0..(1u64 << b1.len()) {
                let x0 = Bits::from_packed(p0, b0.len());
                let x1 = Bits::from_packed(p1, b1.len());
                energies.push(bipartite::energy(b0, b1, w, &x0, &x1).unwrap());
            }
        }
        energies
    }

    #[test]
    fn matches_direct_enumeration_for_both_directions() {
        let mut rng = StdRng::seed_from_u64(31);
        let (b0, b1, w) = crate::formulas::random::random_bipartite(4, 3, &mut rng);
        let all = enumerate(&b0, &b1, &w);
        for method in [MINIMIZE, MAXIMIZE] {
            let mut solver = BipartiteGraphBFSolver::new();
            solver.set_problem(&b0, &b1, &w, method).unwrap();
            solver.set_tile_size(3, 2);
            solver.search().unwrap();
            let expected = method.best(&all).unwrap();
            assert!((solver.energies()[0] - expected).abs() < 1e-12, "{method}");
            let pair = &solver.solutions()[0];
            let e = bipartite::energy(&b0, &b1, &w, &pair.x0, &pair.x1).unwrap();
            assert!((e - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn collects_ties_across_tiles() {
        let b0 = vec![0.0, 0.0];
        let b1 = vec![-1.0];
        let w = Matrix::zeros(1, 2);
        let mut solver = BipartiteGraphBFSolver::new();
        solver.set_problem(&b0, &b1, &w, MINIMIZE).unwrap();
        solver.set_tile_size(1, 1);
        solver.search().unwrap();
        // x1 must be 1; x0 is free.
        assert_eq!(solver.solutions().len(), 4);
        assert!(solver.solutions().iter().all(|pair| pair.x1.as_slice() == [1]));
        assert_eq!(solver.energies(), &[-1.0; 4]);
    }

    #[test]
    fn tied_optima_stop_at_the_cap() {
        let mut solver = BipartiteGraphBFSolver::new();
        solver
            .set_problem(&[0.0; 6], &[0.0; 6], &Matrix::zeros(6, 6), MAXIMIZE)
            .unwrap();
        solver.search().unwrap();
        assert_eq!(solver.solutions().len(), DEFAULT_MAX_SOLUTIONS);

        solver.set_max_solutions(0);
        solver.search().unwrap();
        assert_eq!(solver.solutions().len(), 1);
        assert_eq!(solver.energies(), &[0.0]);
    }

    #[test]
    fn lifecycle_errors() {
        let mut solver = BipartiteGraphBFSolver::new();
        assert_eq!(solver.search(), Err(SolverError::ProblemNotSet));
        solver
            .set_problem(&[0.0], &[0.0], &Matrix::zeros(1, 1), MINIMIZE)
            .unwrap();
        assert_eq!(
            solver.fin_search(),
            Err(SolverError::NotInitialized("fin_search"))
        );
        assert!(matches!(
            solver.set_problem(&[0.0], &[0.0, 1.0], &Matrix::zeros(1, 1), MINIMIZE),
            Err(SolverError::ShapeMismatch { .. })
        ));
    }
}
