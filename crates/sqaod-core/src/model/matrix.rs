use core::ops::{Mul, Neg};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = String;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        let len = raw.data.len();
        Matrix::from_vec(raw.rows, raw.cols, raw.data).ok_or_else(|| {
            format!(
                "matrix data holds {len} values but {}x{} were declared",
                raw.rows, raw.cols
            )
        })
    }
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Returns `None` when `data.len() != rows * cols` or the product overflows.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Returns `None` for ragged input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != cols) {
            return None;
        }
        let data = rows.iter().flatten().copied().collect();
        Some(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    pub const fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    /// `self * v`, with `v.len() == cols`.
    pub fn mul_vec(&self, v: &[f64]) -> Vec<f64> {
        (0..self.rows).map(|r| super::dot(self.row(r), v)).collect()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.rows).map(|r| self.row(r).iter().sum()).collect()
    }

    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for r in 0..self.rows {
            for (sum, value) in sums.iter_mut().zip(self.row(r)) {
                *sum += value;
            }
        }
        sums
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn trace(&self) -> f64 {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).sum()
    }

    pub fn set_diagonal(&mut self, value: f64) {
        for i in 0..self.rows.min(self.cols) {
            self.set(i, i, value);
        }
    }

    pub fn is_symmetric(&self, eps: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        (0..self.rows).all(|r| {
            (r + 1..self.cols).all(|c| (self.get(r, c) - self.get(c, r)).abs() <= eps)
        })
    }

    /// Averages mirrored entries. Non-square input is returned unchanged.
    pub fn symmetrize(&self) -> Matrix {
        if !self.is_square() {
            return self.clone();
        }
        let mut out = self.clone();
        for r in 0..self.rows {
            for c in r + 1..self.cols {
                let mean = 0.5 * (self.get(r, c) + self.get(c, r));
                out.set(r, c, mean);
                out.set(c, r, mean);
            }
        }
        out
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    fn neg(mut self) -> Matrix {
        self.data.iter_mut().for_each(|v| *v = -*v);
        self
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(mut self, rhs: f64) -> Matrix {
        self.data.iter_mut().for_each(|v| *v *= rhs);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::MAXIMIZE;

    fn sample() -> Matrix {
        Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_none());
        assert!(Matrix::from_vec(2, 2, vec![0.0; 3]).is_none());
        assert!(Matrix::from_vec(usize::MAX, 2, Vec::new()).is_none());
    }

    #[test]
    fn transpose_and_products() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.dim(), (3, 2));
        assert_eq!(t.get(2, 1), 6.0);
        assert_eq!(m.mul_vec(&[1.0, 0.0, 1.0]), vec![4.0, 10.0]);
        assert_eq!(m.row_sums(), vec![6.0, 15.0]);
        assert_eq!(m.col_sums(), vec![5.0, 7.0, 9.0]);
        assert_eq!(m.sum(), 21.0);
        assert_eq!(m.trace(), 6.0);
    }

    #[test]
    fn symmetrize_averages_mirrored_entries() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![4.0, 1.0]]).unwrap();
        assert!(!m.is_symmetric(1e-12));
        let s = m.symmetrize();
        assert!(s.is_symmetric(1e-12));
        assert_eq!(s.get(0, 1), 3.0);
    }

    #[test]
    fn deserialization_rejects_inconsistent_data() {
        let err = serde_json::from_str::<Matrix>(r#"{"rows":2,"cols":2,"data":[1.0]}"#);
        assert!(err.is_err());
        let ok: Matrix = serde_json::from_str(r#"{"rows":1,"cols":2,"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(ok.row(0), &[1.0, 2.0]);
    }

    #[test]
    fn direction_sign_negates_every_entry() {
        let flipped = MAXIMIZE.sign(sample());
        assert_eq!(flipped.get(1, 2), -6.0);
        assert_eq!(flipped.sum(), -21.0);
    }
}
