#![deny(warnings)]
pub mod direction;
pub mod error;
pub mod formulas;
pub mod model;
pub mod selector;
pub mod solver;

pub use direction::{EmptyInputError, MAXIMIZE, MINIMIZE, OptimizeMethod};
pub use selector::{ANNEAL, BRUTEFORCE, DENSE, GraphType, RBM, SPARSE, SolverType};
pub use solver::{
    AnnealSchedule, Problem, SolveOutcome, Solver, SolverError, create_solver,
};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "sqaod"
    }

    pub const fn codename() -> &'static str {
        "Rust CPU Solvers"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
