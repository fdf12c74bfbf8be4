use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::formulas::{bipartite, dense, random};
use crate::model::{Assignment, Matrix};
use crate::selector::GraphType;

/// A QUBO instance in one of the supported graph families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "graph", rename_all = "snake_case")]
pub enum Problem {
    Dense {
        w: Matrix,
    },
    #[serde(rename = "rbm")]
    Bipartite {
        b0: Vec<f64>,
        b1: Vec<f64>,
        w: Matrix,
    },
}

impl Problem {
    pub fn random_dense<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        Problem::Dense {
            w: random::random_symmetric_w(n, rng),
        }
    }

    pub fn random_bipartite<R: Rng + ?Sized>(n0: usize, n1: usize, rng: &mut R) -> Self {
        let (b0, b1, w) = random::random_bipartite(n0, n1, rng);
        Problem::Bipartite { b0, b1, w }
    }

    pub const fn graph_type(&self) -> GraphType {
        match self {
            Problem::Dense { .. } => GraphType::Dense,
            Problem::Bipartite { .. } => GraphType::Rbm,
        }
    }

    /// Total number of binary variables.
    pub fn variables(&self) -> usize {
        match self {
            Problem::Dense { w } => w.rows(),
            Problem::Bipartite { b0, b1, .. } => b0.len() + b1.len(),
        }
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        match self {
            Problem::Dense { w } => dense::check_w(w),
            Problem::Bipartite { b0, b1, w } => bipartite::check_problem(b0, b1, w),
        }
    }

    /// QUBO energy of `assignment`; the assignment must match the graph family.
    pub fn energy(&self, assignment: &Assignment) -> Result<f64, SolverError> {
        match (self, assignment) {
            (Problem::Dense { w }, Assignment::Dense(x)) => dense::energy(w, x),
            (Problem::Bipartite { b0, b1, w }, Assignment::Bipartite(pair)) => {
                bipartite::energy(b0, b1, w, &pair.x0, &pair.x1)
            }
            (problem, _) => Err(SolverError::Unsupported(format!(
                "assignment shape does not match a {} problem",
                problem.graph_type()
            ))),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bits, BitsPair};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn snapshot_round_trips_through_json() {
        let problem = Problem::random_bipartite(2, 3, &mut StdRng::seed_from_u64(5));
        let json = problem.to_json().unwrap();
        assert!(json.contains("\"graph\": \"rbm\""));
        let restored = Problem::from_json(&json).unwrap();
        assert_eq!(restored, problem);
        assert_eq!(restored.variables(), 5);
        assert_eq!(restored.graph_type(), GraphType::Rbm);
    }

    #[test]
    fn snapshot_with_overflowing_shape_is_an_error() {
        let json = r#"{"graph":"dense","w":{"rows":4294967296,"cols":4294967297,"data":[]}}"#;
        assert!(Problem::from_json(json).is_err());
    }

    #[test]
    fn energy_dispatches_on_graph_family() {
        let problem = Problem::Dense {
            w: Matrix::from_rows(&[vec![-1.0, 0.0], vec![0.0, 2.0]]).unwrap(),
        };
        problem.validate().unwrap();
        let x = Assignment::Dense(Bits::from_values(&[1, 1]));
        assert_eq!(problem.energy(&x).unwrap(), 1.0);

        let wrong = Assignment::Bipartite(BitsPair::new(Bits::zeros(1), Bits::zeros(1)));
        assert!(matches!(
            problem.energy(&wrong),
            Err(SolverError::Unsupported(_))
        ));
    }
}
