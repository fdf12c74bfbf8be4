use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::model::{Bits, Matrix, dot};

/// `E(q0, q1) = c + h0·q0 + h1·q1 + q1ᵀ J q0`, with `J` shaped `N1 × N0`.
#[derive(Debug, Clone, PartialEq)]
pub struct BipartiteIsing {
    pub h0: Vec<f64>,
    pub h1: Vec<f64>,
    pub j: Matrix,
    pub c: f64,
}

impl BipartiteIsing {
    pub fn size(&self) -> (usize, usize) {
        (self.h0.len(), self.h1.len())
    }

    pub fn energy(&self, q0: &[f64], q1: &[f64]) -> f64 {
        self.c + dot(&self.h0, q0) + dot(&self.h1, q1) + dot(q1, &self.j.mul_vec(q0))
    }

    pub fn signed(self, method: OptimizeMethod) -> Self {
        Self {
            h0: self.h0.into_iter().map(|v| method.sign(v)).collect(),
            h1: self.h1.into_iter().map(|v| method.sign(v)).collect(),
            j: method.sign(self.j),
            c: method.sign(self.c),
        }
    }
}

/// `W` must be `len(b1) × len(b0)`.
pub fn check_problem(b0: &[f64], b1: &[f64], w: &Matrix) -> Result<(), SolverError> {
    if w.dim() != (b1.len(), b0.len()) {
        return Err(SolverError::shape("bipartite W", (b1.len(), b0.len()), w.dim()));
    }
    Ok(())
}

/// `b0·x0 + b1·x1 + x1ᵀ W x0`.
pub fn energy(
    b0: &[f64],
    b1: &[f64],
    w: &Matrix,
    x0: &Bits,
    x1: &Bits,
) -> Result<f64, SolverError> {
    check_problem(b0, b1, w)?;
    if x0.len() != b0.len() {
        return Err(SolverError::shape("bipartite x0", (1, b0.len()), (1, x0.len())));
    }
    if x1.len() != b1.len() {
        return Err(SolverError::shape("bipartite x1", (1, b1.len()), (1, x1.len())));
    }
    let x0r = x0.to_reals();
    let x1r = x1.to_reals();
    Ok(dot(b0, &x0r) + dot(b1, &x1r) + dot(&x1r, &w.mul_vec(&x0r)))
}

/// Rewrites the bipartite QUBO into spin form.
pub fn hjc(b0: &[f64], b1: &[f64], w: &Matrix) -> Result<BipartiteIsing, SolverError> {
    check_problem(b0, b1, w)?;
    let h0 = b0
        .iter()
        .zip(w.col_sums())
        .map(|(b, s)| 0.5 * b + 0.25 * s)
        .collect();
    let h1 = b1
        .iter()
        .zip(w.row_sums())
        .map(|(b, s)| 0.5 * b + 0.25 * s)
        .collect();
    let j = w.clone() * 0.25;
    let c = 0.5 * b0.iter().sum::<f64>() + 0.5 * b1.iter().sum::<f64>() + 0.25 * w.sum();
    Ok(BipartiteIsing { h0, h1, j, c })
}

pub fn ising_energy(model: &BipartiteIsing, q0: &[f64], q1: &[f64]) -> Result<f64, SolverError> {
    let (n0, n1) = model.size();
    if q0.len() != n0 {
        return Err(SolverError::shape("bipartite q0", (1, n0), (1, q0.len())));
    }
    if q1.len() != n1 {
        return Err(SolverError::shape("bipartite q1", (1, n1), (1, q1.len())));
    }
    Ok(model.energy(q0, q1))
}
