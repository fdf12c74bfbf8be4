//! Energy functions for QUBO problems and their Ising (spin) forms.
//!
//! With `x ∈ {0,1}` and `q = 2x - 1 ∈ {-1,+1}` every QUBO energy can be
//! rewritten as `c + h·q + (spin couplings)`; the `hjc` helpers perform that
//! rewrite and the `ising_energy` helpers evaluate it.

pub mod bipartite;
pub mod dense;
pub mod random;

pub use bipartite::BipartiteIsing;
pub use dense::DenseIsing;

/// Absolute tolerance for symmetry checks on `W`.
pub const SYMMETRY_EPSILON: f64 = 1e-9;
