//! Random problem generators used by tests and the benchmark harness.

use rand::Rng;

use crate::model::Matrix;

/// Coefficients are drawn uniformly from `[-COEFFICIENT_RANGE, COEFFICIENT_RANGE)`.
pub const COEFFICIENT_RANGE: f64 = 0.5;

fn coefficient<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-COEFFICIENT_RANGE..COEFFICIENT_RANGE)
}

/// Symmetric `n × n` QUBO matrix.
pub fn random_symmetric_w<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Matrix {
    let mut w = Matrix::zeros(n, n);
    for r in 0..n {
        for c in r..n {
            let value = coefficient(rng);
            w.set(r, c, value);
            w.set(c, r, value);
        }
    }
    w
}

/// `(b0, b1, W)` with `W` shaped `n1 × n0`.
pub fn random_bipartite<R: Rng + ?Sized>(
    n0: usize,
    n1: usize,
    rng: &mut R,
) -> (Vec<f64>, Vec<f64>, Matrix) {
    let b0 = (0..n0).map(|_| coefficient(rng)).collect();
    let b1 = (0..n1).map(|_| coefficient(rng)).collect();
    let mut w = Matrix::zeros(n1, n0);
    for r in 0..n1 {
        for c in 0..n0 {
            w.set(r, c, coefficient(rng));
        }
    }
    (b0, b1, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn dense_generator_is_symmetric_and_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let w = random_symmetric_w(6, &mut rng);
        assert!(w.is_symmetric(0.0));
        assert!(w.as_slice().iter().all(|v| v.abs() <= COEFFICIENT_RANGE));
    }

    #[test]
    fn generators_are_reproducible_per_seed() {
        let a = random_bipartite(3, 4, &mut StdRng::seed_from_u64(11));
        let b = random_bipartite(3, 4, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert_eq!(a.2.dim(), (4, 3));
    }
}
