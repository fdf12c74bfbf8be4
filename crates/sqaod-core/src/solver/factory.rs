use tracing::{Level, event};

use super::{
    BipartiteGraphAnnealer, BipartiteGraphBFSolver, DenseGraphAnnealer, DenseGraphBFSolver,
    Problem, Solver, SolverError,
};
use crate::direction::OptimizeMethod;
use crate::selector::{GraphType, SolverType};

/// Builds the solver for `(graph, solver)` and loads `problem` into it.
///
/// The problem must belong to `graph`; sparse graphs have no solver.
pub fn create_solver(
    graph: GraphType,
    solver: SolverType,
    problem: &Problem,
    method: OptimizeMethod,
) -> Result<Box<dyn Solver>, SolverError> {
    if problem.graph_type() != graph {
        return Err(SolverError::Unsupported(format!(
            "{} problem passed to a {graph} solver",
            problem.graph_type()
        )));
    }

    let built: Box<dyn Solver> = match (problem, solver) {
        (Problem::Dense { w }, SolverType::BruteForce) => {
            let mut bf = DenseGraphBFSolver::new();
            bf.set_problem(w, method)?;
            Box::new(bf)
        }
        (Problem::Dense { w }, SolverType::Anneal) => {
            let mut annealer = DenseGraphAnnealer::new();
            annealer.set_problem(w, method)?;
            Box::new(annealer)
        }
        (Problem::Bipartite { b0, b1, w }, SolverType::BruteForce) => {
            let mut bf = BipartiteGraphBFSolver::new();
            bf.set_problem(b0, b1, w, method)?;
            Box::new(bf)
        }
        (Problem::Bipartite { b0, b1, w }, SolverType::Anneal) => {
            let mut annealer = BipartiteGraphAnnealer::new();
            annealer.set_problem(b0, b1, w, method)?;
            Box::new(annealer)
        }
    };

    event!(
        target: "sqaod::factory",
        Level::DEBUG,
        graph = %graph,
        solver = %solver,
        method = %method,
        variables = problem.variables(),
    );
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::{MAXIMIZE, MINIMIZE};
    use crate::model::Matrix;
    use crate::selector::{ANNEAL, BRUTEFORCE, DENSE, RBM, SPARSE};
    use crate::solver::AnnealSchedule;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builds_every_supported_pairing() {
        let mut rng = StdRng::seed_from_u64(3);
        let dense = Problem::random_dense(4, &mut rng);
        let rbm = Problem::random_bipartite(2, 3, &mut rng);
        for (graph, problem) in [(DENSE, &dense), (RBM, &rbm)] {
            for kind in [BRUTEFORCE, ANNEAL] {
                let solver = create_solver(graph, kind, problem, MAXIMIZE).unwrap();
                assert_eq!(solver.graph_type(), graph);
                assert_eq!(solver.solver_type(), kind);
                assert_eq!(solver.optimize_method(), MAXIMIZE);
            }
        }
    }

    #[test]
    fn rejects_sparse_and_mismatched_graphs() {
        let problem = Problem::Dense {
            w: Matrix::zeros(2, 2),
        };
        assert!(matches!(
            create_solver(SPARSE, BRUTEFORCE, &problem, MINIMIZE),
            Err(SolverError::Unsupported(_))
        ));
        assert!(matches!(
            create_solver(RBM, ANNEAL, &problem, MINIMIZE),
            Err(SolverError::Unsupported(_))
        ));
    }

    #[test]
    fn propagates_invalid_problems() {
        let problem = Problem::Dense {
            w: Matrix::from_rows(&[vec![0.0, 1.0], vec![-1.0, 0.0]]).unwrap(),
        };
        assert!(matches!(
            create_solver(DENSE, BRUTEFORCE, &problem, MINIMIZE),
            Err(SolverError::NotSymmetric { .. })
        ));
    }

    #[test]
    fn boxed_solvers_run_through_the_trait() {
        let problem = Problem::random_dense(5, &mut StdRng::seed_from_u64(8));
        let mut solver = create_solver(DENSE, BRUTEFORCE, &problem, MINIMIZE).unwrap();
        let outcome = solver.solve(&AnnealSchedule::default()).unwrap();
        let energy = problem.energy(&outcome.best).unwrap();
        assert!((energy - outcome.best_energy).abs() < 1e-9);
        assert_eq!(outcome.steps, 0);
    }
}
