mod bipartite_annealer;
mod bipartite_bf;
mod dense_annealer;
mod dense_bf;
mod factory;
mod problem;
mod schedule;

pub use bipartite_annealer::BipartiteGraphAnnealer;
pub use bipartite_bf::BipartiteGraphBFSolver;
pub use dense_annealer::DenseGraphAnnealer;
pub use dense_bf::DenseGraphBFSolver;
pub use factory::create_solver;
pub use problem::Problem;
pub use schedule::AnnealSchedule;

pub use crate::error::SolverError;

use crate::direction::OptimizeMethod;
use crate::model::Assignment;
use crate::selector::{GraphType, SolverType};

/// Energies are considered equal within this tolerance.
pub const ENERGY_EPSILON: f64 = 1e-9;

/// Tied optima an exhaustive solver keeps unless told otherwise.
pub const DEFAULT_MAX_SOLUTIONS: usize = 1 << 10;

/// Result of a complete solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// One energy per candidate (trotter or tied optimum), in the caller's sign.
    pub energies: Vec<f64>,
    pub solutions: Vec<Assignment>,
    pub best_energy: f64,
    pub best: Assignment,
    /// Anneal steps taken; zero for exhaustive search.
    pub steps: usize,
}

impl SolveOutcome {
    pub(crate) fn collect(
        method: OptimizeMethod,
        energies: Vec<f64>,
        solutions: Vec<Assignment>,
        steps: usize,
    ) -> Result<Self, SolverError> {
        let idx = method.best_index(&energies)?;
        Ok(Self {
            best_energy: energies[idx],
            best: solutions[idx].clone(),
            energies,
            solutions,
            steps,
        })
    }
}

/// Uniform driver interface shared by every solver.
pub trait Solver: Send {
    fn graph_type(&self) -> GraphType;

    fn solver_type(&self) -> SolverType;

    fn optimize_method(&self) -> OptimizeMethod;

    /// Seeds the random source; exhaustive solvers accept and ignore it.
    fn seed(&mut self, seed: u64);

    /// Runs the solver from scratch. Exhaustive solvers ignore `schedule`.
    fn solve(&mut self, schedule: &AnnealSchedule) -> Result<SolveOutcome, SolverError>;
}

/// `m = max(1, n / 4)` when the caller never picked a trotter count.
pub(crate) fn default_trotters(variables: usize) -> usize {
    (variables / 4).max(1)
}

/// Coupling between neighbouring trotter slices for transverse field `g`.
pub(crate) fn trotter_coupling(g: f64, kt: f64, m: usize) -> f64 {
    kt * (g / kt / m as f64).tanh().ln()
}
