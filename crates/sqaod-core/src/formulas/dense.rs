use crate::direction::OptimizeMethod;
use crate::error::SolverError;
use crate::model::{Bits, Matrix, dot};

use super::SYMMETRY_EPSILON;

/// `E(q) = c + h·q + qᵀ J q`, with `J` symmetric and zero on the diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseIsing {
    pub h: Vec<f64>,
    pub j: Matrix,
    pub c: f64,
}

impl DenseIsing {
    pub fn size(&self) -> usize {
        self.h.len()
    }

    pub fn energy(&self, q: &[f64]) -> f64 {
        self.c + dot(&self.h, q) + dot(q, &self.j.mul_vec(q))
    }

    /// Applies the direction sign to every coefficient.
    pub fn signed(self, method: OptimizeMethod) -> Self {
        Self {
            h: self.h.into_iter().map(|v| method.sign(v)).collect(),
            j: method.sign(self.j),
            c: method.sign(self.c),
        }
    }
}

/// `W` must be square and symmetric.
pub fn check_w(w: &Matrix) -> Result<(), SolverError> {
    if !w.is_square() {
        return Err(SolverError::shape("dense W", (w.rows(), w.rows()), w.dim()));
    }
    if !w.is_symmetric(SYMMETRY_EPSILON) {
        return Err(SolverError::NotSymmetric { context: "dense W" });
    }
    Ok(())
}

/// `xᵀ W x`.
pub fn energy(w: &Matrix, x: &Bits) -> Result<f64, SolverError> {
    check_w(w)?;
    if x.len() != w.rows() {
        return Err(SolverError::shape("dense x", (1, w.rows()), (1, x.len())));
    }
    let xr = x.to_reals();
    Ok(dot(&xr, &w.mul_vec(&xr)))
}

pub fn energy_batch(w: &Matrix, xs: &[Bits]) -> Result<Vec<f64>, SolverError> {
    check_w(w)?;
    xs.iter().map(|x| energy(w, x)).collect()
}

/// Rewrites `xᵀ W x` into spin form.
pub fn hjc(w: &Matrix) -> Result<DenseIsing, SolverError> {
    check_w(w)?;
    let h = w.row_sums().into_iter().map(|s| 0.5 * s).collect();
    let mut j = w.clone() * 0.25;
    j.set_diagonal(0.0);
    let c = 0.25 * w.sum() + 0.25 * w.trace();
    Ok(DenseIsing { h, j, c })
}

pub fn ising_energy(model: &DenseIsing, q: &[f64]) -> Result<f64, SolverError> {
    if q.len() != model.size() {
        return Err(SolverError::shape("dense q", (1, model.size()), (1, q.len())));
    }
    Ok(model.energy(q))
}
