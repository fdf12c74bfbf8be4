pub mod bits;
pub mod matrix;

pub use bits::{Assignment, Bits, BitsPair, MAX_PACKED_BITS};
pub use matrix::Matrix;

/// Dot product over the shorter of the two slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
