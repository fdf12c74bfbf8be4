use thiserror::Error;

use crate::direction::EmptyInputError;

/// Failures surfaced by formulas, solvers and the solver factory.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("{context}: expected shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("{context}: matrix is not symmetric")]
    NotSymmetric { context: &'static str },
    #[error("problem has not been set")]
    ProblemNotSet,
    #[error("number of trotters must be a positive integer, got {0}")]
    InvalidTrotterCount(usize),
    #[error("{bits} variables exceed the brute-force limit of {max}")]
    ProblemTooLarge { bits: usize, max: usize },
    #[error("{0} called before initialisation")]
    NotInitialized(&'static str),
    #[error("invalid anneal schedule: {0}")]
    InvalidSchedule(String),
    #[error("unsupported combination: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Empty(#[from] EmptyInputError),
}

impl SolverError {
    pub(crate) fn shape(context: &'static str, expected: (usize, usize), found: (usize, usize)) -> Self {
        SolverError::ShapeMismatch {
            context,
            expected,
            found,
        }
    }
}
